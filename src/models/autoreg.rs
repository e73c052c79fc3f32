use ndarray::{Array1, Array2, ArrayView1, ArrayView2};
use tracing::{debug, trace};

use crate::error::{OutlierError, Result};
use crate::models::base_model::CollectiveDetector;
use crate::utils::least_squares::fit_least_squares;
use crate::utils::threshold::{check_contamination, ScoreThreshold};
use crate::utils::window::{window_bounds, windowed_design, WindowBounds, Windowed};

/// Least-squares predictor fitted for one series.
#[derive(Debug, Clone, PartialEq)]
struct FittedAutoReg {
    coefficients: Array1<f64>,
    intercept: f64,
    bounds: WindowBounds,
    decision_scores: Array1<f64>,
    threshold: ScoreThreshold,
    labels: Array1<u8>,
}

fn residual_scores(
    design: &Array2<f64>,
    targets: &Array1<f64>,
    coefficients: &Array1<f64>,
    intercept: f64,
) -> Array1<f64> {
    let predicted = design.dot(coefficients) + intercept;
    (targets - &predicted).mapv(f64::abs)
}

/// Autoregressive outlier detector for a single series.
///
/// Every window of `window_size` consecutive values predicts the value
/// right after it through ordinary least squares; the absolute prediction
/// error is the window's outlier score.
#[derive(Debug, Clone, PartialEq)]
pub struct AutoRegOD {
    window_size: usize,
    step_size: usize,
    contamination: f64,
    fitted: Option<FittedAutoReg>,
}

impl AutoRegOD {
    pub fn new(window_size: usize, step_size: usize, contamination: f64) -> Result<Self> {
        if window_size < 1 || step_size < 1 {
            return Err(OutlierError::InvalidWindowConfig(format!(
                "window_size and step_size must be at least 1, got {} and {}",
                window_size, step_size
            )));
        }
        check_contamination(contamination)?;
        Ok(AutoRegOD {
            window_size,
            step_size,
            contamination,
            fitted: None,
        })
    }

    pub fn window_size(&self) -> usize {
        self.window_size
    }

    pub fn step_size(&self) -> usize {
        self.step_size
    }

    pub fn contamination(&self) -> f64 {
        self.contamination
    }

    pub fn is_fitted(&self) -> bool {
        self.fitted.is_some()
    }

    fn fitted(&self) -> Result<&FittedAutoReg> {
        self.fitted.as_ref().ok_or(OutlierError::NotFitted)
    }

    /// Fit the predictor on `values` and score the training windows.
    ///
    /// On error the detector is left unfitted.
    pub fn fit_series(&mut self, values: ArrayView1<f64>) -> Result<()> {
        self.fitted = None;
        check_series(values)?;

        let bounds = window_bounds(values.len(), self.window_size, self.step_size)?;
        let (design, targets) = windowed_design(values, &bounds, self.window_size);

        let (coefficients, intercept) = fit_least_squares(&design, &targets)?;

        let decision_scores = residual_scores(&design, &targets, &coefficients, intercept);
        let threshold = ScoreThreshold::from_scores(decision_scores.view(), self.contamination)?;
        let fitted = FittedAutoReg {
            labels: threshold.labels(decision_scores.view()),
            coefficients,
            intercept,
            bounds,
            decision_scores,
            threshold,
        };

        trace!(
            n_samples = values.len(),
            valid_len = fitted.bounds.len(),
            "fitted autoregressive model"
        );
        self.fitted = Some(fitted);
        Ok(())
    }

    /// Score every window of `values` with the fitted predictor.
    pub fn decision_function_series(
        &self,
        values: ArrayView1<f64>,
    ) -> Result<Windowed<Array1<f64>>> {
        let fitted = self.fitted()?;
        check_series(values)?;
        let bounds = window_bounds(values.len(), self.window_size, self.step_size)?;
        let (design, targets) = windowed_design(values, &bounds, self.window_size);
        let scores = residual_scores(&design, &targets, &fitted.coefficients, fitted.intercept);
        debug!(n_samples = values.len(), n_windows = bounds.len(), "scored series");
        Ok(Windowed {
            values: scores,
            bounds,
        })
    }

    /// Number of training windows.
    pub fn valid_len(&self) -> Result<usize> {
        Ok(self.fitted()?.bounds.len())
    }

    pub fn bounds(&self) -> Result<&WindowBounds> {
        Ok(&self.fitted()?.bounds)
    }

    /// Outlier scores of the training windows.
    pub fn decision_scores(&self) -> Result<&Array1<f64>> {
        Ok(&self.fitted()?.decision_scores)
    }

    pub fn labels(&self) -> Result<&Array1<u8>> {
        Ok(&self.fitted()?.labels)
    }

    pub fn coefficients(&self) -> Result<&Array1<f64>> {
        Ok(&self.fitted()?.coefficients)
    }

    pub fn intercept(&self) -> Result<f64> {
        Ok(self.fitted()?.intercept)
    }
}

impl CollectiveDetector for AutoRegOD {
    fn fit(&mut self, x: ArrayView2<f64>) -> Result<()> {
        self.fitted = None;
        single_column(x)?;
        self.fit_series(x.column(0))
    }

    fn decision_function(&self, x: ArrayView2<f64>) -> Result<Windowed<Array1<f64>>> {
        self.fitted()?;
        single_column(x)?;
        self.decision_function_series(x.column(0))
    }

    fn threshold(&self) -> Result<&ScoreThreshold> {
        Ok(&self.fitted()?.threshold)
    }
}

fn check_series(values: ArrayView1<f64>) -> Result<()> {
    if let Some(i) = values.iter().position(|v| !v.is_finite()) {
        return Err(OutlierError::InvalidInput(format!(
            "non-finite value at index {}",
            i
        )));
    }
    Ok(())
}

fn single_column(x: ArrayView2<f64>) -> Result<()> {
    if x.ncols() != 1 {
        return Err(OutlierError::DimensionMismatch {
            context: "univariate input columns",
            expected: 1,
            got: x.ncols(),
        });
    }
    Ok(())
}
