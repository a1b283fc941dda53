//! Errors raised while retrieving, caching or reading quotes.

use chrono::NaiveDate;
use thiserror::Error;

/// Result alias used across `darwin-data`.
pub type Result<T> = std::result::Result<T, DataError>;

/// Failure of a quote source, the cache, or a quote file.
#[derive(Debug, Error)]
pub enum DataError {
    /// The request itself was malformed
    #[error("Requested range {start}..={end} is empty")]
    InvalidDateRange {
        /// First requested date
        start: NaiveDate,
        /// Last requested date
        end: NaiveDate,
    },

    /// Blank or otherwise unusable ticker
    #[error("Invalid symbol: {0}")]
    InvalidSymbol(String),

    /// The source answered but had no rows
    #[error("No quotes for {symbol}: {reason}")]
    MissingData {
        /// Requested symbol
        symbol: String,
        /// What was missing
        reason: String,
    },

    /// Upstream Yahoo Finance failure
    #[error("Yahoo Finance: {0}")]
    YahooApi(String),

    /// Timestamp outside the representable range
    #[error("Cannot convert timestamp: {0}")]
    TimeConversion(String),

    /// Malformed value in a file or cache row
    #[error("Parse error: {0}")]
    Parse(String),

    /// SQLite failure
    #[error("Cache database: {0}")]
    Database(#[from] rusqlite::Error),

    /// Quote file could not be read or written
    #[error("Quote file: {0}")]
    Csv(#[from] csv::Error),

    /// Frame construction failed
    #[error("Polars: {0}")]
    Polars(#[from] polars::prelude::PolarsError),

    /// Filesystem failure
    #[error("IO: {0}")]
    Io(#[from] std::io::Error),
}

impl From<yahoo_finance_api::YahooError> for DataError {
    fn from(err: yahoo_finance_api::YahooError) -> Self {
        Self::YahooApi(err.to_string())
    }
}
