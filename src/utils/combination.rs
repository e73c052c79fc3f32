use std::fmt;
use std::str::FromStr;

use ndarray::{Array1, ArrayView1, ArrayView2, Axis};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::error::{OutlierError, Result};

/// Bucket count used by [`combine`] for `aom`/`moa` when none is given.
pub const DEFAULT_N_BUCKETS: usize = 5;

/// Policy for merging per-dimension scores into one score per row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CombinationMethod {
    /// Weighted row mean.
    #[default]
    Average,
    /// Row maximum.
    Maximization,
    /// Row median.
    Median,
    /// Average of bucket maxima.
    Aom,
    /// Maximum of bucket averages.
    Moa,
}

impl CombinationMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            CombinationMethod::Average => "average",
            CombinationMethod::Maximization => "maximization",
            CombinationMethod::Median => "median",
            CombinationMethod::Aom => "aom",
            CombinationMethod::Moa => "moa",
        }
    }

    fn uses_buckets(&self) -> bool {
        matches!(self, CombinationMethod::Aom | CombinationMethod::Moa)
    }
}

impl fmt::Display for CombinationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CombinationMethod {
    type Err = OutlierError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "average" => Ok(CombinationMethod::Average),
            "maximization" => Ok(CombinationMethod::Maximization),
            "median" => Ok(CombinationMethod::Median),
            "aom" => Ok(CombinationMethod::Aom),
            "moa" => Ok(CombinationMethod::Moa),
            other => Err(OutlierError::UnsupportedCombinationMethod(other.to_string())),
        }
    }
}

/// Validate `weights` against `n_columns` and rescale them to sum to
/// `n_columns`. `None` yields uniform ones.
pub fn normalize_weights(weights: Option<&[f64]>, n_columns: usize) -> Result<Array1<f64>> {
    let Some(weights) = weights else {
        return Ok(Array1::ones(n_columns));
    };
    if weights.len() != n_columns {
        return Err(OutlierError::DimensionMismatch {
            context: "weights",
            expected: n_columns,
            got: weights.len(),
        });
    }
    if weights.iter().any(|w| !w.is_finite() || *w < 0.0) {
        return Err(OutlierError::InvalidParameter {
            name: "weights",
            reason: "every weight must be finite and non-negative".to_string(),
        });
    }
    let total: f64 = weights.iter().sum();
    if total <= 0.0 {
        return Err(OutlierError::InvalidParameter {
            name: "weights",
            reason: "weights must have a positive sum".to_string(),
        });
    }
    let adjust_factor = n_columns as f64 / total;
    Ok(Array1::from_iter(weights.iter().map(|w| w * adjust_factor)))
}

/// Combines the columns of a score matrix with a fixed method, weights
/// and (for `aom`/`moa`) a fixed bucket assignment.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreCombiner {
    method: CombinationMethod,
    weights: Array1<f64>,
    buckets: Vec<Vec<usize>>,
}

impl ScoreCombiner {
    /// Build a combiner for `n_columns` score columns.
    ///
    /// For `aom`/`moa` the columns are shuffled once (seeded by
    /// `random_state` when given) and split into `n_buckets` groups; the
    /// assignment is reused by every later [`ScoreCombiner::combine`].
    pub fn new(
        method: CombinationMethod,
        n_columns: usize,
        weights: Option<&[f64]>,
        n_buckets: usize,
        random_state: Option<u64>,
    ) -> Result<Self> {
        if n_columns == 0 {
            return Err(OutlierError::InvalidInput(
                "cannot combine zero score columns".to_string(),
            ));
        }
        let weights = normalize_weights(weights, n_columns)?;

        let buckets = if method.uses_buckets() {
            if n_buckets == 0 || n_buckets > n_columns {
                return Err(OutlierError::InvalidParameter {
                    name: "n_buckets",
                    reason: format!("must be in 1..={}, got {}", n_columns, n_buckets),
                });
            }
            let mut rng = match random_state {
                Some(seed) => StdRng::seed_from_u64(seed),
                None => StdRng::from_entropy(),
            };
            let mut order: Vec<usize> = (0..n_columns).collect();
            order.shuffle(&mut rng);
            (0..n_buckets)
                .map(|b| {
                    let head = b * n_columns / n_buckets;
                    let tail = (b + 1) * n_columns / n_buckets;
                    order[head..tail].to_vec()
                })
                .collect()
        } else {
            Vec::new()
        };

        Ok(ScoreCombiner {
            method,
            weights,
            buckets,
        })
    }

    pub fn method(&self) -> CombinationMethod {
        self.method
    }

    /// Weights after rescaling to sum to the column count.
    pub fn weights(&self) -> &Array1<f64> {
        &self.weights
    }

    /// Merge every row of `matrix` into one score.
    pub fn combine(&self, matrix: ArrayView2<f64>) -> Result<Array1<f64>> {
        let n_columns = self.weights.len();
        if matrix.ncols() != n_columns {
            return Err(OutlierError::DimensionMismatch {
                context: "score columns",
                expected: n_columns,
                got: matrix.ncols(),
            });
        }

        let combined = match self.method {
            CombinationMethod::Average => matrix.dot(&self.weights) / n_columns as f64,
            CombinationMethod::Maximization => matrix.map_axis(Axis(1), row_max),
            CombinationMethod::Median => matrix.map_axis(Axis(1), row_median),
            CombinationMethod::Aom => matrix.map_axis(Axis(1), |row| {
                let total: f64 = self
                    .buckets
                    .iter()
                    .map(|bucket| {
                        bucket
                            .iter()
                            .map(|&j| row[j])
                            .fold(f64::NEG_INFINITY, f64::max)
                    })
                    .sum();
                total / self.buckets.len() as f64
            }),
            CombinationMethod::Moa => matrix.map_axis(Axis(1), |row| {
                self.buckets
                    .iter()
                    .map(|bucket| {
                        bucket.iter().map(|&j| row[j]).sum::<f64>() / bucket.len() as f64
                    })
                    .fold(f64::NEG_INFINITY, f64::max)
            }),
        };
        Ok(combined)
    }
}

/// One-shot combination of `matrix` with `method` and optional `weights`.
///
/// `aom`/`moa` use up to [`DEFAULT_N_BUCKETS`] buckets with an unseeded
/// shuffle; build a [`ScoreCombiner`] for reproducible bucket assignment.
pub fn combine(
    matrix: ArrayView2<f64>,
    method: CombinationMethod,
    weights: Option<&[f64]>,
) -> Result<Array1<f64>> {
    let n_buckets = DEFAULT_N_BUCKETS.min(matrix.ncols());
    ScoreCombiner::new(method, matrix.ncols(), weights, n_buckets, None)?.combine(matrix)
}

fn row_max(row: ArrayView1<f64>) -> f64 {
    row.iter().copied().fold(f64::NEG_INFINITY, f64::max)
}

fn row_median(row: ArrayView1<f64>) -> f64 {
    let mut sorted = row.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}
