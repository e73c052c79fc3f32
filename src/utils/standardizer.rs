use ndarray::{Array1, Array2, ArrayView2, Axis};
use tracing::warn;

use crate::error::{OutlierError, Result};

/// Scales below this are treated as a constant column.
const MIN_SCALE: f64 = 10.0 * f64::EPSILON;

/// Whether a column's variance is indistinguishable from the rounding
/// error accumulated around its mean.
fn is_constant(variance: f64, mean: f64, n_rows: usize) -> bool {
    let n = n_rows as f64;
    let bound = n * f64::EPSILON * variance + (n * mean * f64::EPSILON).powi(2);
    variance <= bound
}

/// Per-column mean and scale fitted on training scores.
///
/// The state is written once by [`fit_transform`] and only read afterwards,
/// so new data is always scaled with the training statistics.
#[derive(Debug, Clone, PartialEq)]
pub struct StandardizationState {
    mean: Array1<f64>,
    scale: Array1<f64>,
}

impl StandardizationState {
    /// Fit population mean and standard deviation for every column.
    pub fn fit(matrix: ArrayView2<f64>) -> Result<Self> {
        let (n_rows, n_cols) = matrix.dim();
        if n_rows == 0 || n_cols == 0 {
            return Err(OutlierError::InvalidInput(format!(
                "cannot standardize an empty {}x{} score matrix",
                n_rows, n_cols
            )));
        }

        let mut mean = Array1::<f64>::zeros(n_cols);
        let mut sum_squares = Array1::<f64>::zeros(n_cols);
        // running update, one row at a time
        for (count, row) in matrix.axis_iter(Axis(0)).enumerate() {
            let n = (count + 1) as f64;
            for (j, &item) in row.iter().enumerate() {
                let old_mean = mean[j];
                mean[j] += (item - old_mean) / n;
                sum_squares[j] += (item - old_mean) * (item - mean[j]);
            }
        }

        let scale = Array1::from_iter(sum_squares.iter().enumerate().map(|(j, &ss)| {
            let variance = ss / n_rows as f64;
            let std = variance.sqrt();
            if std < MIN_SCALE || is_constant(variance, mean[j], n_rows) {
                warn!(column = j, "zero-variance score column, using unit scale");
                1.0
            } else {
                std
            }
        }));

        Ok(StandardizationState { mean, scale })
    }

    pub fn n_features(&self) -> usize {
        self.mean.len()
    }

    pub fn mean(&self) -> &Array1<f64> {
        &self.mean
    }

    pub fn scale(&self) -> &Array1<f64> {
        &self.scale
    }

    /// Z-score `matrix` with the fitted statistics.
    pub fn transform(&self, matrix: ArrayView2<f64>) -> Result<Array2<f64>> {
        if matrix.ncols() != self.n_features() {
            return Err(OutlierError::DimensionMismatch {
                context: "standardization columns",
                expected: self.n_features(),
                got: matrix.ncols(),
            });
        }
        Ok((&matrix - &self.mean) / &self.scale)
    }
}

/// Fit the per-column statistics on `matrix` and return it z-scored.
pub fn fit_transform(matrix: ArrayView2<f64>) -> Result<(Array2<f64>, StandardizationState)> {
    let state = StandardizationState::fit(matrix)?;
    let scaled = state.transform(matrix)?;
    Ok((scaled, state))
}

/// Apply previously fitted statistics to `matrix`.
pub fn transform(matrix: ArrayView2<f64>, state: &StandardizationState) -> Result<Array2<f64>> {
    state.transform(matrix)
}
