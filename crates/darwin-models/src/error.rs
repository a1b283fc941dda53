//! Error types for model fitting and prediction.

use thiserror::Error;

/// Result type for model operations.
pub type Result<T> = std::result::Result<T, ModelError>;

/// Errors that can occur while fitting or applying a model
#[derive(Debug, Error)]
pub enum ModelError {
    /// Row or column counts disagree
    #[error("Dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch {
        /// Expected size
        expected: usize,
        /// Actual size
        got: usize,
    },

    /// Predict or score called before fit
    #[error("Model has not been fitted yet")]
    NotFitted,

    /// No rows or no columns
    #[error("Empty input")]
    EmptyInput,

    /// NaN or infinite value in the input
    #[error("Non-finite value at row {row}")]
    NonFiniteInput {
        /// First offending row
        row: usize,
    },

    /// Normal equations could not be solved
    #[error("Matrix is singular and cannot be inverted")]
    SingularMatrix,

    /// A configuration value is out of range
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}
