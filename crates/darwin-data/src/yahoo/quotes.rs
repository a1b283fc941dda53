//! Adjusted daily history from Yahoo Finance.

use crate::error::{DataError, Result};
use crate::frame::{self, QuoteRow};
use crate::source::{QuoteSource, fetch_batch, validate_request};
use chrono::{DateTime, NaiveDate};
use polars::prelude::*;
use std::time::Duration;
use tokio::time::sleep;
use yahoo_finance_api as yahoo;

/// Delay between requests unless configured otherwise.
const DEFAULT_RATE_LIMIT: Duration = Duration::from_millis(1000);

/// Yahoo Finance source that pauses after every request.
pub struct YahooQuoteProvider {
    connector: yahoo::YahooConnector,
    rate_limit: Duration,
}

impl std::fmt::Debug for YahooQuoteProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("YahooQuoteProvider")
            .field("rate_limit", &self.rate_limit)
            .finish_non_exhaustive()
    }
}

impl YahooQuoteProvider {
    /// One request per second.
    pub fn new() -> Result<Self> {
        Self::with_rate_limit(DEFAULT_RATE_LIMIT)
    }

    /// Pause for `rate_limit` after each request.
    pub fn with_rate_limit(rate_limit: Duration) -> Result<Self> {
        Ok(Self {
            connector: yahoo::YahooConnector::new()?,
            rate_limit,
        })
    }

    /// Midnight UTC at the start of `date`.
    fn to_offset(date: NaiveDate) -> Result<time::OffsetDateTime> {
        let seconds = date
            .and_hms_opt(0, 0, 0)
            .ok_or_else(|| DataError::TimeConversion(format!("Invalid date {}", date)))?
            .and_utc()
            .timestamp();
        time::OffsetDateTime::from_unix_timestamp(seconds)
            .map_err(|e| DataError::TimeConversion(e.to_string()))
    }

    /// UTC calendar day of a bar timestamp in seconds.
    fn session_date(timestamp: i64) -> Result<NaiveDate> {
        DateTime::from_timestamp(timestamp, 0)
            .map(|t| t.date_naive())
            .ok_or_else(|| DataError::TimeConversion(format!("Timestamp {} out of range", timestamp)))
    }

    fn to_row(symbol: &str, bar: &yahoo::Quote) -> Result<QuoteRow> {
        Ok(QuoteRow {
            symbol: symbol.to_string(),
            date: Self::session_date(bar.timestamp as i64)?,
            open: bar.open,
            high: bar.high,
            low: bar.low,
            close: bar.close,
            volume: bar.volume,
            adjusted_close: bar.adjclose,
        })
    }

    /// Fetch several symbols one after another, keeping the rate limit.
    ///
    /// Failing symbols are logged and skipped; only a batch where every
    /// symbol failed is an error.
    pub async fn fetch_quotes_batch(
        &self,
        symbols: &[String],
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<DataFrame> {
        fetch_batch(self, symbols, start, end, 1, |_, _| {}).await
    }
}

impl QuoteSource for YahooQuoteProvider {
    fn name(&self) -> &str {
        "yahoo"
    }

    /// Both ends are inclusive; the request runs to midnight after `end`.
    async fn fetch_quotes(&self, symbol: &str, start: NaiveDate, end: NaiveDate) -> Result<DataFrame> {
        validate_request(symbol, start, end)?;

        let from = Self::to_offset(start)?;
        let to = Self::to_offset(end.succ_opt().unwrap_or(end))?;
        let response = self.connector.get_quote_history(symbol, from, to).await?;
        let bars = response
            .quotes()
            .map_err(|e| DataError::YahooApi(e.to_string()))?;

        if bars.is_empty() {
            return Err(DataError::MissingData {
                symbol: symbol.to_string(),
                reason: format!("Yahoo returned no bars between {} and {}", start, end),
            });
        }

        let rows = bars
            .iter()
            .map(|bar| Self::to_row(symbol, bar))
            .collect::<Result<Vec<_>>>()?;
        let df = frame::quotes_from_rows(&rows)?;

        tracing::debug!(%symbol, rows = df.height(), "fetched quotes from yahoo");
        sleep(self.rate_limit).await;
        Ok(df)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::QUOTE_COLUMNS;

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    #[test]
    fn test_to_offset_is_midnight_utc() {
        let offset = YahooQuoteProvider::to_offset(date(2024, 1, 2)).unwrap();
        assert_eq!(offset.unix_timestamp(), 1_704_153_600);
    }

    #[test]
    fn test_session_date_is_utc_day() {
        // 2024-01-02 14:30 UTC, the NYSE open
        assert_eq!(YahooQuoteProvider::session_date(1_704_205_800).unwrap(), date(2024, 1, 2));
        assert_eq!(YahooQuoteProvider::session_date(1_704_153_599).unwrap(), date(2024, 1, 1));
    }

    #[tokio::test]
    #[ignore = "requires network access to Yahoo Finance"]
    async fn test_fetch_quotes() {
        let provider = YahooQuoteProvider::new().unwrap();
        let df = provider
            .fetch_quotes("AAPL", date(2024, 1, 2), date(2024, 1, 31))
            .await
            .unwrap();

        assert!(df.height() > 15);
        assert_eq!(df.get_column_names(), QUOTE_COLUMNS.to_vec());
    }

    #[tokio::test]
    async fn test_request_validation_precedes_network() {
        let provider = YahooQuoteProvider::with_rate_limit(Duration::ZERO).unwrap();

        let reversed = provider
            .fetch_quotes("AAPL", date(2024, 2, 1), date(2024, 1, 1))
            .await;
        assert!(matches!(reversed, Err(DataError::InvalidDateRange { .. })));

        let blank = provider
            .fetch_quotes("  ", date(2024, 1, 1), date(2024, 1, 31))
            .await;
        assert!(matches!(blank, Err(DataError::InvalidSymbol(_))));
    }

    #[tokio::test]
    async fn test_batch_of_rejected_symbols_fails() {
        let provider = YahooQuoteProvider::with_rate_limit(Duration::ZERO).unwrap();
        let symbols = vec![" ".to_string(), String::new()];
        let result = provider
            .fetch_quotes_batch(&symbols, date(2024, 1, 1), date(2024, 1, 31))
            .await;
        assert!(matches!(result, Err(DataError::MissingData { .. })));
    }
}
