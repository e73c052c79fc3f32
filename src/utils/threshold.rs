use std::str::FromStr;

use ndarray::{Array1, Array2, ArrayView1};
use serde::{Deserialize, Serialize};
use statrs::function::erf::erf;

use crate::error::{OutlierError, Result};

/// How [`ScoreThreshold::probabilities`] maps raw scores into `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProbabilityMethod {
    /// Min-max scale against the training score range.
    #[default]
    Linear,
    /// Gaussian error function of the training z-score.
    Unify,
}

impl FromStr for ProbabilityMethod {
    type Err = OutlierError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "linear" => Ok(ProbabilityMethod::Linear),
            "unify" => Ok(ProbabilityMethod::Unify),
            other => Err(OutlierError::InvalidParameter {
                name: "method",
                reason: format!("unknown probability method '{}'", other),
            }),
        }
    }
}

pub fn check_contamination(contamination: f64) -> Result<()> {
    if !(contamination > 0.0 && contamination <= 0.5) {
        return Err(OutlierError::InvalidParameter {
            name: "contamination",
            reason: format!("must be in (0, 0.5], got {}", contamination),
        });
    }
    Ok(())
}

/// `q`-th percentile (0..=100) with linear interpolation between order
/// statistics.
pub fn percentile(values: ArrayView1<f64>, q: f64) -> Result<f64> {
    if values.is_empty() {
        return Err(OutlierError::InvalidInput(
            "cannot take a percentile of no scores".to_string(),
        ));
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let pos = (q / 100.0).clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    Ok(sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64))
}

/// Decision threshold and score statistics captured at fit time.
///
/// `threshold` is the value exceeded by roughly `contamination` of the
/// training scores. The remaining fields drive
/// [`ScoreThreshold::probabilities`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreThreshold {
    pub contamination: f64,
    pub threshold: f64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std: f64,
}

impl ScoreThreshold {
    pub fn from_scores(scores: ArrayView1<f64>, contamination: f64) -> Result<Self> {
        check_contamination(contamination)?;
        let threshold = percentile(scores, 100.0 * (1.0 - contamination))?;
        let n = scores.len() as f64;
        let mean = scores.sum() / n;
        let std = (scores.iter().map(|s| (s - mean).powi(2)).sum::<f64>() / n).sqrt();
        Ok(ScoreThreshold {
            contamination,
            threshold,
            min: scores.iter().copied().fold(f64::INFINITY, f64::min),
            max: scores.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            mean,
            std,
        })
    }

    /// 1 where the score exceeds the threshold, else 0.
    pub fn labels(&self, scores: ArrayView1<f64>) -> Array1<u8> {
        scores.mapv(|s| u8::from(s > self.threshold))
    }

    /// Two-column `[inlier, outlier]` probabilities for `scores`.
    pub fn probabilities(&self, scores: ArrayView1<f64>, method: ProbabilityMethod) -> Array2<f64> {
        let outlier: Array1<f64> = match method {
            ProbabilityMethod::Linear => {
                let range = self.max - self.min;
                let range = if range > 0.0 { range } else { 1.0 };
                scores.mapv(|s| ((s - self.min) / range).clamp(0.0, 1.0))
            }
            ProbabilityMethod::Unify => {
                let std = if self.std > 0.0 { self.std } else { 1.0 };
                scores.mapv(|s| {
                    erf((s - self.mean) / (std * std::f64::consts::SQRT_2)).clamp(0.0, 1.0)
                })
            }
        };
        let mut probs = Array2::<f64>::zeros((scores.len(), 2));
        for (i, p) in outlier.iter().enumerate() {
            probs[[i, 0]] = 1.0 - p;
            probs[[i, 1]] = *p;
        }
        probs
    }
}
