use ndarray::{Array1, Array2, ArrayView2};

use crate::error::Result;
use crate::utils::threshold::{ProbabilityMethod, ScoreThreshold};
use crate::utils::window::Windowed;

/// A common trait for window-based (collective) outlier detectors.
///
/// Implementors provide fitting and raw scoring; labelling and
/// probability mapping come for free from the fit-time threshold.
pub trait CollectiveDetector {
    /// Fit on an N x D training matrix.
    fn fit(&mut self, x: ArrayView2<f64>) -> Result<()>;

    /// Raw anomaly scores of `x` (higher is more anomalous), with the
    /// window bounds they belong to.
    fn decision_function(&self, x: ArrayView2<f64>) -> Result<Windowed<Array1<f64>>>;

    /// Threshold and score statistics fixed at fit time.
    fn threshold(&self) -> Result<&ScoreThreshold>;

    /// Default: label new data with the fit-time threshold.
    fn predict(&self, x: ArrayView2<f64>) -> Result<Windowed<Array1<u8>>> {
        let scored = self.decision_function(x)?;
        let labels = self.threshold()?.labels(scored.values.view());
        Ok(Windowed {
            values: labels,
            bounds: scored.bounds,
        })
    }

    /// Default: map new scores to `[inlier, outlier]` probabilities.
    fn predict_proba(
        &self,
        x: ArrayView2<f64>,
        method: ProbabilityMethod,
    ) -> Result<Windowed<Array2<f64>>> {
        let scored = self.decision_function(x)?;
        let probs = self
            .threshold()?
            .probabilities(scored.values.view(), method);
        Ok(Windowed {
            values: probs,
            bounds: scored.bounds,
        })
    }

    /// Default: fit, then label the same data.
    fn fit_predict(&mut self, x: ArrayView2<f64>) -> Result<Windowed<Array1<u8>>> {
        self.fit(x)?;
        self.predict(x)
    }
}
