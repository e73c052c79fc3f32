use std::sync::Arc;

use ndarray::{s, Array1, Array2, ArrayView2};
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use tracing::debug;

use crate::config::MultiAutoRegConfig;
use crate::error::{OutlierError, Result};
use crate::models::autoreg::AutoRegOD;
use crate::models::base_model::CollectiveDetector;
use crate::utils::check_finite;
use crate::utils::combination::ScoreCombiner;
use crate::utils::standardizer::{fit_transform, StandardizationState};
use crate::utils::threshold::ScoreThreshold;
use crate::utils::window::{valid_window_count, WindowBounds, Windowed};

#[derive(Debug, Clone, PartialEq)]
struct FittedMulti {
    models: Vec<AutoRegOD>,
    bounds: WindowBounds,
    combiner: ScoreCombiner,
    standardizer: StandardizationState,
    decision_scores: Array1<f64>,
    threshold: ScoreThreshold,
    labels: Array1<u8>,
}

/// Autoregressive outlier detector for multivariate series.
///
/// Each dimension gets its own [`AutoRegOD`]. Their window scores are
/// z-scored with statistics fixed at fit time and merged into one score
/// per window by the configured [`crate::CombinationMethod`].
#[derive(Debug, Clone, PartialEq)]
pub struct MultiAutoRegOD {
    config: MultiAutoRegConfig,
    workers: Workers,
    fitted: Option<FittedMulti>,
}

impl MultiAutoRegOD {
    /// Detector with default settings and the given window size.
    pub fn new(window_size: usize) -> Result<Self> {
        Self::with_config(MultiAutoRegConfig::new(window_size))
    }

    pub fn with_config(config: MultiAutoRegConfig) -> Result<Self> {
        config.validate()?;
        let workers = Workers::new(config.n_jobs)?;
        Ok(MultiAutoRegOD {
            config,
            workers,
            fitted: None,
        })
    }

    pub fn config(&self) -> &MultiAutoRegConfig {
        &self.config
    }

    pub fn is_fitted(&self) -> bool {
        self.fitted.is_some()
    }

    fn fitted(&self) -> Result<&FittedMulti> {
        self.fitted.as_ref().ok_or(OutlierError::NotFitted)
    }

    fn fit_inner(&self, x: ArrayView2<f64>) -> Result<FittedMulti> {
        check_finite(x)?;
        let (n_samples, n_dims) = x.dim();
        let config = &self.config;
        valid_window_count(n_samples, config.window_size, config.step_size)?;

        let combiner = ScoreCombiner::new(
            config.method,
            n_dims,
            config.weights.as_deref(),
            config.n_buckets,
            config.random_state,
        )?;

        debug!(
            n_samples,
            n_dims,
            window_size = config.window_size,
            step_size = config.step_size,
            method = %config.method,
            "fitting per-dimension models"
        );
        let models = self.workers.per_dimension(n_dims, |j| {
            let mut model =
                AutoRegOD::new(config.window_size, config.step_size, config.contamination)?;
            model.fit_series(x.column(j))?;
            Ok(model)
        })?;

        let bounds = shared_bounds(models.iter().map(|m| m.bounds()).collect::<Result<Vec<_>>>()?)?;
        let valid_len = bounds.len();

        let mut raw_scores = Array2::<f64>::zeros((valid_len, n_dims));
        for (j, model) in models.iter().enumerate() {
            raw_scores.column_mut(j).assign(model.decision_scores()?);
        }

        let (scaled, standardizer) = fit_transform(raw_scores.view())?;
        let decision_scores = combiner.combine(scaled.view())?;
        let threshold = ScoreThreshold::from_scores(decision_scores.view(), config.contamination)?;
        let labels = threshold.labels(decision_scores.view());

        debug!(
            valid_len,
            threshold = threshold.threshold,
            n_outliers = labels.iter().filter(|&&l| l == 1).count(),
            "fitted multivariate detector"
        );
        Ok(FittedMulti {
            models,
            bounds,
            combiner,
            standardizer,
            decision_scores,
            threshold,
            labels,
        })
    }

    /// Number of dimensions seen at fit time.
    pub fn n_dims(&self) -> Result<usize> {
        Ok(self.fitted()?.models.len())
    }

    /// Per-dimension detectors, in column order.
    pub fn models(&self) -> Result<&[AutoRegOD]> {
        Ok(&self.fitted()?.models)
    }

    /// Number of training windows.
    pub fn valid_len(&self) -> Result<usize> {
        Ok(self.fitted()?.bounds.len())
    }

    pub fn bounds(&self) -> Result<&WindowBounds> {
        Ok(&self.fitted()?.bounds)
    }

    pub fn left_inds(&self) -> Result<&[usize]> {
        Ok(&self.fitted()?.bounds.left_inds)
    }

    pub fn right_inds(&self) -> Result<&[usize]> {
        Ok(&self.fitted()?.bounds.right_inds)
    }

    /// Combined outlier scores of the training windows.
    pub fn decision_scores(&self) -> Result<&Array1<f64>> {
        Ok(&self.fitted()?.decision_scores)
    }

    /// Binary labels of the training windows.
    pub fn labels(&self) -> Result<&Array1<u8>> {
        Ok(&self.fitted()?.labels)
    }

    /// Weights after rescaling to sum to the dimension count.
    pub fn weights(&self) -> Result<&Array1<f64>> {
        Ok(self.fitted()?.combiner.weights())
    }

    pub fn standardization(&self) -> Result<&StandardizationState> {
        Ok(&self.fitted()?.standardizer)
    }
}

impl CollectiveDetector for MultiAutoRegOD {
    /// Fit one model per column. A failure in any column leaves the
    /// detector unfitted.
    fn fit(&mut self, x: ArrayView2<f64>) -> Result<()> {
        self.fitted = None;
        self.fitted = Some(self.fit_inner(x)?);
        Ok(())
    }

    /// Score new data. The final window gets the minimum of the other
    /// combined scores instead of its own, so the output matches the
    /// returned bounds in length.
    fn decision_function(&self, x: ArrayView2<f64>) -> Result<Windowed<Array1<f64>>> {
        let fitted = self.fitted()?;
        let n_dims = fitted.models.len();
        if x.ncols() != n_dims {
            return Err(OutlierError::DimensionMismatch {
                context: "input columns",
                expected: n_dims,
                got: x.ncols(),
            });
        }
        check_finite(x)?;

        let config = &self.config;
        let valid_len = valid_window_count(x.nrows(), config.window_size, config.step_size)? - 1;
        if valid_len == 0 {
            return Err(OutlierError::InvalidWindowConfig(format!(
                "series of length {} leaves no window to score besides the final one",
                x.nrows()
            )));
        }

        let scored = self.workers.per_dimension(n_dims, |j| {
            fitted.models[j].decision_function_series(x.column(j))
        })?;
        let bounds = shared_bounds(scored.iter().map(|w| &w.bounds).collect())?;

        let mut raw_scores = Array2::<f64>::zeros((valid_len, n_dims));
        for (j, windowed) in scored.iter().enumerate() {
            raw_scores
                .column_mut(j)
                .assign(&windowed.values.slice(s![..valid_len]));
        }

        let scaled = fitted.standardizer.transform(raw_scores.view())?;
        let combined = fitted.combiner.combine(scaled.view())?;
        let filler = combined.iter().copied().fold(f64::INFINITY, f64::min);
        let mut values = combined.to_vec();
        values.push(filler);

        debug!(n_samples = x.nrows(), n_windows = values.len(), "scored multivariate series");
        Ok(Windowed {
            values: Array1::from(values),
            bounds,
        })
    }

    fn threshold(&self) -> Result<&ScoreThreshold> {
        Ok(&self.fitted()?.threshold)
    }
}

/// Bounds of the last dimension, after checking every dimension agrees.
fn shared_bounds(all: Vec<&WindowBounds>) -> Result<WindowBounds> {
    let Some(last) = all.last() else {
        return Err(OutlierError::InvalidInput(
            "input must have at least one dimension".to_string(),
        ));
    };
    if let Some(j) = all.iter().position(|b| b != last) {
        return Err(OutlierError::InconsistentWindowing(format!(
            "dimension {} produced {} windows, dimension {} produced {}",
            j,
            all[j].len(),
            all.len() - 1,
            last.len()
        )));
    }
    Ok((*last).clone())
}

/// Where the per-dimension work runs. Built once with the detector.
#[derive(Debug, Clone)]
enum Workers {
    Sequential,
    /// rayon's global pool
    Global,
    Pool(Arc<ThreadPool>),
}

impl Workers {
    fn new(n_jobs: Option<usize>) -> Result<Self> {
        match n_jobs {
            None => Ok(Workers::Global),
            Some(n) if n <= 1 => Ok(Workers::Sequential),
            Some(n) => {
                let pool = ThreadPoolBuilder::new()
                    .num_threads(n.min(num_cpus::get().max(1)))
                    .build()
                    .map_err(|e| OutlierError::ThreadPool(e.to_string()))?;
                Ok(Workers::Pool(Arc::new(pool)))
            }
        }
    }

    /// Run `task` for every dimension. Results come back in dimension
    /// order; the first error wins.
    fn per_dimension<T, F>(&self, n_dims: usize, task: F) -> Result<Vec<T>>
    where
        T: Send,
        F: Fn(usize) -> Result<T> + Sync + Send,
    {
        match self {
            _ if n_dims <= 1 => (0..n_dims).map(task).collect(),
            Workers::Sequential => (0..n_dims).map(task).collect(),
            Workers::Global => (0..n_dims).into_par_iter().map(&task).collect(),
            Workers::Pool(pool) => {
                pool.install(|| (0..n_dims).into_par_iter().map(&task).collect())
            }
        }
    }
}

impl PartialEq for Workers {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Workers::Sequential, Workers::Sequential) | (Workers::Global, Workers::Global) => {
                true
            }
            (Workers::Pool(a), Workers::Pool(b)) => {
                a.current_num_threads() == b.current_num_threads()
            }
            _ => false,
        }
    }
}
