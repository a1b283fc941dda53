//! Export of predictions and model diagnostics.
//!
//! Predictions carry the same `(date, symbol)` key as the features and
//! outcomes tables they were made from, so they can be joined back onto
//! either table downstream.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Write;
use std::path::Path;
use thiserror::Error;

/// Errors that can occur during export operations.
#[derive(Debug, Error)]
pub enum ExportError {
    /// CSV serialization error.
    #[error("CSV serialization error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON serialization error.
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Polars error while reading a frame.
    #[error("Polars error: {0}")]
    Polars(#[from] polars::prelude::PolarsError),

    /// Invalid format error.
    #[error("Invalid format: {0}")]
    InvalidFormat(String),
}

/// Export format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    /// Comma-separated values format.
    Csv,

    /// Compact JSON format.
    Json,

    /// Pretty-printed JSON format.
    PrettyJson,
}

impl ExportFormat {
    /// Get the file extension for this format.
    pub const fn extension(&self) -> &str {
        match self {
            Self::Csv => "csv",
            Self::Json | Self::PrettyJson => "json",
        }
    }

    /// Infer the format from a file extension (`.json` is pretty-printed).
    pub fn from_path(path: &Path) -> Result<Self, ExportError> {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("csv") => Ok(Self::Csv),
            Some(ext) if ext.eq_ignore_ascii_case("json") => Ok(Self::PrettyJson),
            other => Err(ExportError::InvalidFormat(format!(
                "Unsupported extension: {}",
                other.unwrap_or("<none>")
            ))),
        }
    }
}

/// A model prediction for one `(date, symbol)` row.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PredictionRecord {
    /// Session the prediction is made at the close of.
    pub date: NaiveDate,

    /// Security symbol.
    pub symbol: String,

    /// Predicted outcome value.
    pub predicted: f64,

    /// Realised outcome, when already observed.
    pub actual: Option<f64>,
}

impl PredictionRecord {
    /// Create a new prediction record.
    pub const fn new(date: NaiveDate, symbol: String, predicted: f64, actual: Option<f64>) -> Self {
        Self {
            date,
            symbol,
            predicted,
            actual,
        }
    }

    /// Prediction error, when the outcome is known.
    pub fn error(&self) -> Option<f64> {
        self.actual.map(|a| self.predicted - a)
    }
}

/// Relative importance of one feature in a fitted model.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FeatureImportance {
    /// Feature column name.
    pub feature: String,

    /// Importance weight.
    pub importance: f64,
}

/// Trait for exporting data in various formats.
pub trait Exporter {
    /// Export data to a string in the specified format.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    fn export_to_string(&self, format: ExportFormat) -> Result<String, ExportError>;

    /// Export data to a file in the specified format.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or file writing fails.
    fn export_to_file(&self, path: &Path, format: ExportFormat) -> Result<(), ExportError> {
        let content = self.export_to_string(format)?;
        let mut file = File::create(path)?;
        file.write_all(content.as_bytes())?;
        Ok(())
    }
}

/// Serialize records with the csv crate into a string.
fn csv_string<T: Serialize>(records: &[T]) -> Result<String, ExportError> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    for record in records {
        wtr.serialize(record)?;
    }
    let bytes = wtr.into_inner().map_err(|e| e.into_error())?;
    String::from_utf8(bytes).map_err(|e| ExportError::InvalidFormat(e.to_string()))
}

impl Exporter for [PredictionRecord] {
    fn export_to_string(&self, format: ExportFormat) -> Result<String, ExportError> {
        match format {
            ExportFormat::Csv => csv_string(self),
            ExportFormat::Json => Ok(serde_json::to_string(self)?),
            ExportFormat::PrettyJson => Ok(serde_json::to_string_pretty(self)?),
        }
    }
}

impl Exporter for [FeatureImportance] {
    fn export_to_string(&self, format: ExportFormat) -> Result<String, ExportError> {
        match format {
            ExportFormat::Csv => csv_string(self),
            ExportFormat::Json => Ok(serde_json::to_string(self)?),
            ExportFormat::PrettyJson => Ok(serde_json::to_string_pretty(self)?),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn records() -> Vec<PredictionRecord> {
        let date = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        vec![
            PredictionRecord::new(date, "AAPL".to_string(), 0.012, Some(0.02)),
            PredictionRecord::new(date, "MSFT".to_string(), -0.004, None),
        ]
    }

    #[test]
    fn test_predictions_csv() {
        let csv = records().export_to_string(ExportFormat::Csv).unwrap();
        let lines: Vec<&str> = csv.lines().collect();

        assert_eq!(lines[0], "date,symbol,predicted,actual");
        assert_eq!(lines[1], "2024-03-01,AAPL,0.012,0.02");
        // Unknown outcomes are empty fields
        assert_eq!(lines[2], "2024-03-01,MSFT,-0.004,");
    }

    #[test]
    fn test_predictions_json() {
        let json = records().export_to_string(ExportFormat::Json).unwrap();
        let parsed: Vec<PredictionRecord> = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, records());
        assert!(json.contains("\"actual\":null"));
    }

    #[test]
    fn test_prediction_error() {
        let records = records();
        assert!((records[0].error().unwrap() + 0.008).abs() < 1e-12);
        assert_eq!(records[1].error(), None);
    }

    #[test]
    fn test_importances_pretty_json() {
        let importances = vec![FeatureImportance {
            feature: "close_chg_5d".to_string(),
            importance: 0.7,
        }];
        let json = importances.export_to_string(ExportFormat::PrettyJson).unwrap();
        assert!(json.contains('\n'));
        assert!(json.contains("close_chg_5d"));
    }

    #[rstest]
    #[case("out/predictions.csv", Some(ExportFormat::Csv))]
    #[case("predictions.JSON", Some(ExportFormat::PrettyJson))]
    #[case("predictions.parquet", None)]
    #[case("predictions", None)]
    fn test_format_from_path(#[case] path: &str, #[case] expected: Option<ExportFormat>) {
        assert_eq!(ExportFormat::from_path(Path::new(path)).ok(), expected);
    }

    #[test]
    fn test_export_to_file() {
        let path = std::env::temp_dir().join(format!("darwin-export-{}.csv", std::process::id()));
        records().export_to_file(&path, ExportFormat::Csv).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("date,symbol"));
        std::fs::remove_file(path).ok();
    }
}
