//! Autoregressive outlier detection for univariate and multivariate time
//! series.
//!
//! Each dimension is modelled by a least-squares autoregressive predictor
//! over sliding windows; the absolute prediction error of a window is its
//! outlier score. [`MultiAutoRegOD`] standardizes and combines the
//! per-dimension scores into one score per window and labels the windows
//! that exceed a contamination-driven threshold.
//!
//! ```no_run
//! use autoreg_od::{matrix_from_rows, CollectiveDetector, MultiAutoRegConfig, MultiAutoRegOD};
//!
//! let x = matrix_from_rows(&[
//!     vec![3., 5.], vec![5., 9.], vec![7., 2.], vec![42., 20.],
//!     vec![8., 12.], vec![10., 12.], vec![12., 12.], vec![18., 16.],
//!     vec![20., 7.], vec![18., 10.], vec![23., 12.], vec![22., 15.],
//! ])?;
//! let mut clf = MultiAutoRegOD::with_config(MultiAutoRegConfig::new(3).with_contamination(0.2))?;
//! clf.fit(x.view())?;
//! let labels = clf.predict(x.view())?;
//! # Ok::<(), autoreg_od::OutlierError>(())
//! ```

pub mod config;
pub mod error;
pub mod models;
pub mod utils;

#[cfg(feature = "python")]
mod python;

pub use config::MultiAutoRegConfig;
pub use error::{OutlierError, Result};
pub use models::autoreg::AutoRegOD;
pub use models::base_model::CollectiveDetector;
pub use models::multi_autoreg::MultiAutoRegOD;
pub use utils::combination::{combine, normalize_weights, CombinationMethod, ScoreCombiner};
pub use utils::evaluation::{evaluate_labels, LabelMetrics};
pub use utils::matrix_from_rows;
pub use utils::standardizer::{fit_transform, transform, StandardizationState};
pub use utils::threshold::{ProbabilityMethod, ScoreThreshold};
pub use utils::window::{valid_window_count, window_bounds, WindowBounds, Windowed};

#[cfg(feature = "python")]
use pyo3::prelude::*;

/// A Python module implemented in Rust.
#[cfg(feature = "python")]
#[pymodule]
fn autoreg_od(_py: Python, m: &PyModule) -> PyResult<()> {
    // AutoRegOD:
    m.add_class::<python::PyAutoRegOD>()?;
    // MultiAutoRegOD:
    m.add_class::<python::PyMultiAutoRegOD>()?;
    Ok(())
}
