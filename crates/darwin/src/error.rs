//! Error types for dataset alignment and the end-to-end pipeline.

use thiserror::Error;

/// Errors raised while aligning features with outcomes.
#[derive(Debug, Error)]
pub enum DatasetError {
    /// A required column is absent from an input table
    #[error("Missing column: {0}")]
    MissingColumn(String),

    /// No row survived the join and null filtering
    #[error("No complete rows after alignment")]
    Empty,

    /// The features table carries no feature columns
    #[error("Features table has no feature columns")]
    NoFeatures,

    /// A split left one side without rows
    #[error("Invalid split: {0}")]
    InvalidSplit(String),

    /// Matrix construction failed
    #[error("Shape error: {0}")]
    Shape(#[from] ndarray::ShapeError),

    /// Polars error
    #[error("Polars error: {0}")]
    Polars(#[from] polars::prelude::PolarsError),

    /// Feature or outcome computation error
    #[error("Feature error: {0}")]
    Feature(#[from] darwin_features::FeatureError),

    /// Data access error
    #[error("Data error: {0}")]
    Data(#[from] darwin_data::DataError),
}

/// Errors raised by [`crate::Pipeline`].
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The configuration is inconsistent
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Feature or outcome computation error
    #[error("Feature error: {0}")]
    Feature(#[from] darwin_features::FeatureError),

    /// Alignment error
    #[error("Dataset error: {0}")]
    Dataset(#[from] DatasetError),

    /// Model error
    #[error("Model error: {0}")]
    Model(#[from] darwin_models::ModelError),

    /// Data access error
    #[error("Data error: {0}")]
    Data(#[from] darwin_data::DataError),

    /// Polars error
    #[error("Polars error: {0}")]
    Polars(#[from] polars::prelude::PolarsError),

    /// Configuration parse error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Config file error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The causality audit found a column reading data it should not see
    #[error("Lookahead detected in {column}: {mismatches} rows changed")]
    Lookahead {
        /// Offending column
        column: String,
        /// Number of failed rows
        mismatches: usize,
    },
}
