use ndarray::{Array1, Array2, ArrayView1};
use serde::{Deserialize, Serialize};

use crate::error::{OutlierError, Result};

/// Left/right index bounds of every sliding window over a series.
///
/// Window `i` covers `left_inds[i]..right_inds[i]`; the point at
/// `right_inds[i]` is the value the window predicts.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct WindowBounds {
    pub left_inds: Vec<usize>,
    pub right_inds: Vec<usize>,
}

impl WindowBounds {
    pub fn len(&self) -> usize {
        self.left_inds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.left_inds.is_empty()
    }

    /// Iterate `(left, right)` pairs.
    pub fn pairs(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.left_inds
            .iter()
            .copied()
            .zip(self.right_inds.iter().copied())
    }
}

/// A per-window result paired with the bounds it was computed on.
#[derive(Debug, Clone, PartialEq)]
pub struct Windowed<T> {
    pub values: T,
    pub bounds: WindowBounds,
}

fn check_window_params(n: usize, window_size: usize, step_size: usize) -> Result<()> {
    if window_size < 1 {
        return Err(OutlierError::InvalidWindowConfig(
            "window_size must be at least 1".to_string(),
        ));
    }
    if step_size < 1 {
        return Err(OutlierError::InvalidWindowConfig(
            "step_size must be at least 1".to_string(),
        ));
    }
    if n <= window_size {
        return Err(OutlierError::InvalidWindowConfig(format!(
            "series of length {} is too short for window_size {}",
            n, window_size
        )));
    }
    Ok(())
}

/// Number of windows that still have a successor point to predict:
/// `floor((n - w - 1) / s) + 1`.
pub fn valid_window_count(n: usize, window_size: usize, step_size: usize) -> Result<usize> {
    check_window_params(n, window_size, step_size)?;
    Ok((n - window_size - 1) / step_size + 1)
}

/// Bounds of every valid window, in start order.
pub fn window_bounds(n: usize, window_size: usize, step_size: usize) -> Result<WindowBounds> {
    let count = valid_window_count(n, window_size, step_size)?;
    let left_inds: Vec<usize> = (0..count).map(|i| i * step_size).collect();
    let right_inds = left_inds.iter().map(|l| l + window_size).collect();
    Ok(WindowBounds {
        left_inds,
        right_inds,
    })
}

/// Build the regression design: one row per window, plus the value that
/// follows each window as the target.
pub fn windowed_design(
    values: ArrayView1<f64>,
    bounds: &WindowBounds,
    window_size: usize,
) -> (Array2<f64>, Array1<f64>) {
    let mut design = Array2::<f64>::zeros((bounds.len(), window_size));
    let mut targets = Array1::<f64>::zeros(bounds.len());
    for (row, (left, right)) in bounds.pairs().enumerate() {
        design
            .row_mut(row)
            .assign(&values.slice(ndarray::s![left..right]));
        targets[row] = values[right];
    }
    (design, targets)
}
