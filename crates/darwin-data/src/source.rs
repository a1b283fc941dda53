//! Market data sources.
//!
//! A [`QuoteSource`] turns `(symbol, start, end)` into an adjusted OHLCV
//! frame. The Yahoo provider talks to the network; [`FrameSource`] serves an
//! already loaded frame, which is how offline files and tests feed the
//! pipeline.

use crate::error::{DataError, Result};
use crate::frame::{self, QUOTE_COLUMNS};
use chrono::NaiveDate;
use futures::stream::{self, StreamExt};
use polars::prelude::*;

/// Anything that can produce adjusted OHLCV rows for a symbol and date range.
#[allow(async_fn_in_trait)]
pub trait QuoteSource {
    /// Short identifier of the data source (e.g. "yahoo").
    fn name(&self) -> &str;

    /// Fetch quotes for `symbol` between `start` and `end` inclusive.
    ///
    /// The returned frame has the columns in [`QUOTE_COLUMNS`].
    async fn fetch_quotes(&self, symbol: &str, start: NaiveDate, end: NaiveDate)
    -> Result<DataFrame>;
}

/// Validate a request before it reaches a source.
pub fn validate_request(symbol: &str, start: NaiveDate, end: NaiveDate) -> Result<()> {
    if start > end {
        return Err(DataError::InvalidDateRange { start, end });
    }

    if symbol.trim().is_empty() {
        return Err(DataError::InvalidSymbol("Empty symbol".to_string()));
    }

    Ok(())
}

/// Fetch several symbols from one source, at most `concurrency` at a time.
///
/// `on_result` sees every symbol's outcome as it completes. Failing symbols
/// are logged and skipped; the batch fails only when no symbol returned
/// rows. The combined frame is sorted by symbol, then date.
pub async fn fetch_batch<S, F>(
    source: &S,
    symbols: &[String],
    start: NaiveDate,
    end: NaiveDate,
    concurrency: usize,
    mut on_result: F,
) -> Result<DataFrame>
where
    S: QuoteSource,
    F: FnMut(&str, &Result<DataFrame>),
{
    let mut results = std::pin::pin!(
        stream::iter(symbols)
            .map(|symbol| async move { (symbol, source.fetch_quotes(symbol, start, end).await) })
            .buffer_unordered(concurrency.max(1))
    );

    let mut frames = Vec::with_capacity(symbols.len());
    while let Some((symbol, result)) = results.next().await {
        on_result(symbol, &result);
        match result {
            Ok(df) => frames.push(df.lazy()),
            Err(e) => tracing::warn!(source = source.name(), %symbol, error = %e, "skipping symbol"),
        }
    }

    if frames.is_empty() {
        return Err(DataError::MissingData {
            symbol: symbols.join(","),
            reason: "every symbol in the batch failed".to_string(),
        });
    }
    tracing::debug!(source = source.name(), fetched = frames.len(), requested = symbols.len(), "fetched batch");

    Ok(concat(frames, UnionArgs::default())?
        .sort(["symbol", "date"], SortMultipleOptions::default())
        .collect()?)
}

/// Quote source backed by an in-memory frame holding any number of symbols.
#[derive(Debug, Clone)]
pub struct FrameSource {
    quotes: DataFrame,
}

impl FrameSource {
    /// Wrap a quote frame.
    pub fn new(quotes: DataFrame) -> Result<Self> {
        frame::require_columns(&quotes, &QUOTE_COLUMNS)?;
        Ok(Self { quotes })
    }

    /// Symbols available in this source.
    pub fn symbols(&self) -> Result<Vec<String>> {
        frame::symbols(&self.quotes)
    }

    /// The full underlying frame.
    pub const fn quotes(&self) -> &DataFrame {
        &self.quotes
    }
}

impl QuoteSource for FrameSource {
    fn name(&self) -> &str {
        "frame"
    }

    async fn fetch_quotes(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<DataFrame> {
        validate_request(symbol, start, end)?;

        let df = self
            .quotes
            .clone()
            .lazy()
            .filter(col("symbol").eq(lit(symbol)))
            .filter(frame::on_or_before(end))
            .filter(frame::before(start).not())
            .sort(["date"], SortMultipleOptions::default())
            .select(QUOTE_COLUMNS.iter().map(|c| col(*c)).collect::<Vec<_>>())
            .collect()?;

        if df.height() == 0 {
            return Err(DataError::MissingData {
                symbol: symbol.to_string(),
                reason: "No rows in requested range".to_string(),
            });
        }

        Ok(df)
    }
}
