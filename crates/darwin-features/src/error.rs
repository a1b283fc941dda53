//! Error types for feature and outcome computation.

use thiserror::Error;

/// Result type for feature operations.
pub type Result<T> = std::result::Result<T, FeatureError>;

/// Errors raised while building feature or outcome tables.
#[derive(Debug, Error)]
pub enum FeatureError {
    /// A required input column is absent
    #[error("Missing column: {0}")]
    MissingColumn(String),

    /// Two columns in one table share a name
    #[error("Duplicate column: {0}")]
    DuplicateColumn(String),

    /// A configuration value is out of range
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A column name did not match any known feature or outcome
    #[error("Unknown column: {0}")]
    UnknownColumn(String),

    /// Polars error
    #[error("Polars error: {0}")]
    Polars(#[from] polars::prelude::PolarsError),

    /// Data access error
    #[error("Data error: {0}")]
    Data(#[from] darwin_data::DataError),
}
