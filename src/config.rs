//! Configuration for the multivariate detector.

use serde::{Deserialize, Serialize};

use crate::error::{OutlierError, Result};
use crate::utils::combination::{CombinationMethod, DEFAULT_N_BUCKETS};
use crate::utils::threshold::check_contamination;

/// Parameters of [`crate::MultiAutoRegOD`].
///
/// Every dimension shares `window_size` and `step_size`, so all of them
/// produce the same number of windows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MultiAutoRegConfig {
    /// Number of past values each window uses to predict the next one.
    pub window_size: usize,
    /// Displacement between consecutive windows.
    pub step_size: usize,
    /// Expected fraction of outliers in the training data, in (0, 0.5].
    pub contamination: f64,
    pub method: CombinationMethod,
    /// Per-dimension score weights, used by `average` only.
    pub weights: Option<Vec<f64>>,
    /// Bucket count for `aom`/`moa`.
    pub n_buckets: usize,
    /// Seed for the `aom`/`moa` bucket shuffle.
    pub random_state: Option<u64>,
    /// Worker threads for per-dimension work; `None` uses rayon's global pool.
    pub n_jobs: Option<usize>,
}

impl Default for MultiAutoRegConfig {
    fn default() -> Self {
        MultiAutoRegConfig {
            window_size: 5,
            step_size: 1,
            contamination: 0.1,
            method: CombinationMethod::Average,
            weights: None,
            n_buckets: DEFAULT_N_BUCKETS,
            random_state: None,
            n_jobs: None,
        }
    }
}

impl MultiAutoRegConfig {
    pub fn new(window_size: usize) -> Self {
        MultiAutoRegConfig {
            window_size,
            ..Default::default()
        }
    }

    pub fn with_step_size(mut self, step_size: usize) -> Self {
        self.step_size = step_size;
        self
    }

    pub fn with_contamination(mut self, contamination: f64) -> Self {
        self.contamination = contamination;
        self
    }

    pub fn with_method(mut self, method: CombinationMethod) -> Self {
        self.method = method;
        self
    }

    pub fn with_weights(mut self, weights: Vec<f64>) -> Self {
        self.weights = Some(weights);
        self
    }

    pub fn with_n_buckets(mut self, n_buckets: usize) -> Self {
        self.n_buckets = n_buckets;
        self
    }

    pub fn with_random_state(mut self, seed: u64) -> Self {
        self.random_state = Some(seed);
        self
    }

    pub fn with_n_jobs(mut self, n_jobs: usize) -> Self {
        self.n_jobs = Some(n_jobs);
        self
    }

    /// Check everything that does not depend on the input shape.
    ///
    /// Weight length and bucket count against the dimension count are
    /// checked when fitting.
    pub fn validate(&self) -> Result<()> {
        if self.window_size < 1 {
            return Err(OutlierError::InvalidWindowConfig(
                "window_size must be at least 1".to_string(),
            ));
        }
        if self.step_size < 1 {
            return Err(OutlierError::InvalidWindowConfig(
                "step_size must be at least 1".to_string(),
            ));
        }
        check_contamination(self.contamination)?;
        if self.n_buckets < 1 {
            return Err(OutlierError::InvalidParameter {
                name: "n_buckets",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.n_jobs == Some(0) {
            return Err(OutlierError::InvalidParameter {
                name: "n_jobs",
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}
