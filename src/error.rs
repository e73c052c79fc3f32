//! Error types shared by every detector in the crate.

use thiserror::Error;

/// Result type alias for outlier-detection operations.
pub type Result<T> = std::result::Result<T, OutlierError>;

/// Errors raised while fitting or scoring a detector.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum OutlierError {
    #[error("Invalid window configuration: {0}")]
    InvalidWindowConfig(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Dimension mismatch for {context}: expected {expected}, got {got}")]
    DimensionMismatch {
        context: &'static str,
        expected: usize,
        got: usize,
    },

    #[error("Detector not fitted: call fit() before scoring")]
    NotFitted,

    #[error("Unsupported combination method: {0}")]
    UnsupportedCombinationMethod(String),

    #[error("Inconsistent windowing across dimensions: {0}")]
    InconsistentWindowing(String),

    #[error("Invalid parameter: {name} - {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    #[error("Regression failed: {0}")]
    Regression(String),

    #[error("Thread pool error: {0}")]
    ThreadPool(String),
}
