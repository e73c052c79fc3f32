pub mod combination;
pub mod evaluation;
pub mod least_squares;
pub mod standardizer;
pub mod threshold;
pub mod window;

use ndarray::{Array2, ArrayView2};

use crate::error::{OutlierError, Result};

/// Build an N x D matrix from row vectors (one row per time index).
pub fn matrix_from_rows(rows: &[Vec<f64>]) -> Result<Array2<f64>> {
    let n_rows = rows.len();
    let n_cols = rows.first().map(Vec::len).unwrap_or(0);
    if n_rows == 0 || n_cols == 0 {
        return Err(OutlierError::InvalidInput(
            "expected at least one row and one column".to_string(),
        ));
    }
    if let Some(i) = rows.iter().position(|row| row.len() != n_cols) {
        return Err(OutlierError::InvalidInput(format!(
            "row {} has {} values, expected {}",
            i,
            rows[i].len(),
            n_cols
        )));
    }
    let flat: Vec<f64> = rows.iter().flatten().copied().collect();
    let matrix = Array2::from_shape_vec((n_rows, n_cols), flat)
        .map_err(|e| OutlierError::InvalidInput(e.to_string()))?;
    check_finite(matrix.view())?;
    Ok(matrix)
}

/// Reject empty matrices and matrices with NaN/infinite entries.
pub(crate) fn check_finite(x: ArrayView2<f64>) -> Result<()> {
    if x.nrows() < 1 || x.ncols() < 1 {
        return Err(OutlierError::InvalidInput(format!(
            "input must have at least one row and one dimension, got {}x{}",
            x.nrows(),
            x.ncols()
        )));
    }
    if let Some(((row, col), _)) = x.indexed_iter().find(|(_, v)| !v.is_finite()) {
        return Err(OutlierError::InvalidInput(format!(
            "non-finite value at row {}, column {}",
            row, col
        )));
    }
    Ok(())
}
