//! Loading quotes for the CLI.
//!
//! Quotes come either from a quote file or from Yahoo Finance through the
//! SQLite cache: cached symbols are read back, the rest are fetched
//! concurrently and written to the cache.

use super::cache_manager;
use chrono::NaiveDate;
use darwin::Universe;
use darwin_data::yahoo::YahooQuoteProvider;
use darwin_data::{DataError, SqliteCache, fetch_batch, offline};
use indicatif::ProgressBar;
use polars::prelude::*;
use std::path::Path;

/// Errors raised while loading quotes.
#[derive(Debug, thiserror::Error)]
pub(crate) enum DataPipelineError {
    /// Data source or cache error
    #[error("Data error: {0}")]
    Data(#[from] DataError),
    /// Polars error
    #[error("Polars error: {0}")]
    Polars(#[from] PolarsError),
}

/// How the cache takes part in a fetch.
#[derive(Debug, Clone, Copy)]
pub(crate) struct FetchConfig {
    /// Read from and write to the cache.
    pub use_cache: bool,
    /// Ignore cached rows and fetch everything again.
    pub force_refresh: bool,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            use_cache: true,
            force_refresh: false,
        }
    }
}

/// Concurrent Yahoo requests.
const DEFAULT_CONCURRENCY: usize = 8;

/// Read quotes from a file, keeping only the requested symbols when any are given.
pub(crate) fn load_quote_file(path: &Path, symbols: &[String]) -> Result<DataFrame, DataPipelineError> {
    let quotes = offline::read_quotes(path)?;
    if symbols.is_empty() {
        return Ok(quotes);
    }

    let wanted = symbols
        .iter()
        .map(|s| col("symbol").eq(lit(s.as_str())))
        .reduce(|a, b| a.or(b))
        .unwrap_or_else(|| lit(false));
    let df = quotes.lazy().filter(wanted).collect()?;
    if df.height() == 0 {
        return Err(DataError::MissingData {
            symbol: symbols.join(","),
            reason: format!("Not present in {}", path.display()),
        }
        .into());
    }
    Ok(df)
}

/// Fetch quotes for every symbol, using the cache when enabled.
///
/// Symbols that fail are logged and skipped. The call errors only when no
/// symbol produced rows.
pub(crate) async fn fetch_universe_quotes(
    provider: &YahooQuoteProvider,
    symbols: &[String],
    start: NaiveDate,
    end: NaiveDate,
    config: FetchConfig,
    progress: Option<&ProgressBar>,
) -> Result<DataFrame, DataPipelineError> {
    let cache = match config.use_cache.then(cache_manager::open_cache) {
        Some(Ok(cache)) => Some(cache),
        Some(Err(e)) => {
            tracing::warn!(error = %e, "cache unavailable, fetching everything");
            None
        }
        None => None,
    };

    let mut frames = Vec::new();
    let mut to_fetch = Vec::new();
    for symbol in symbols {
        match cache.as_ref() {
            Some(cache) if !config.force_refresh => match cached(cache, symbol, start, end) {
                Some(df) => frames.push(df.lazy()),
                None => to_fetch.push(symbol.clone()),
            },
            _ => to_fetch.push(symbol.clone()),
        }
    }
    tracing::debug!(cached = frames.len(), to_fetch = to_fetch.len(), "planned fetch");

    if let Some(pb) = progress {
        pb.set_length(symbols.len() as u64);
        pb.set_position(frames.len() as u64);
        if to_fetch.is_empty() {
            pb.set_message("Loading from cache...");
        } else {
            pb.set_message(format!(
                "Fetching {} symbols ({} concurrent)...",
                to_fetch.len(),
                DEFAULT_CONCURRENCY
            ));
        }
    }

    if !to_fetch.is_empty() {
        let fetched = fetch_batch(provider, &to_fetch, start, end, DEFAULT_CONCURRENCY, |symbol, result| {
            if let Some(pb) = progress {
                pb.inc(1);
            }
            if let (Some(cache), Ok(df)) = (cache.as_ref(), result)
                && let Err(e) = cache.put_quotes(df)
            {
                tracing::warn!(%symbol, error = %e, "failed to cache quotes");
            }
        })
        .await;

        match fetched {
            Ok(df) => frames.push(df.lazy()),
            Err(e) if !frames.is_empty() => tracing::warn!(error = %e, "using cached symbols only"),
            Err(e) => return Err(e.into()),
        }
    }

    if frames.is_empty() {
        return Err(DataError::MissingData {
            symbol: symbols.join(","),
            reason: "No symbols requested".to_string(),
        }
        .into());
    }

    let combined = concat(frames, UnionArgs::default())?
        .sort(["symbol", "date"], Default::default())
        .collect()?;
    Ok(combined)
}

fn cached(cache: &SqliteCache, symbol: &str, start: NaiveDate, end: NaiveDate) -> Option<DataFrame> {
    match cache.has_quotes(symbol, start, end) {
        Ok(true) => cache.get_quotes(symbol, start, end).ok(),
        _ => None,
    }
}

/// Write the universe's sector assignments to the cache.
pub(crate) fn store_securities(universe: &dyn Universe) -> Result<usize, DataPipelineError> {
    let cache = cache_manager::open_cache()?;
    let records = universe.security_records();
    for record in &records {
        cache.put_security(record)?;
    }
    Ok(records.len())
}
