//! SQLite caching layer for market data.

use crate::error::{DataError, Result};
use crate::frame::{self, QuoteRow};
use chrono::{NaiveDate, Utc};
use polars::prelude::*;
use rusqlite::{Connection, OptionalExtension, params};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Fraction of calendar days that must be present as trading rows for a
/// cached range to count as complete.
const MIN_COVERAGE: f64 = 0.6;

/// SQLite cache for market data.
#[derive(Debug)]
pub struct SqliteCache {
    conn: Connection,
}

/// Slow-changing reference attributes of a security.
///
/// These rows back the master table: one snapshot per symbol, overwritten
/// whenever fresher reference data arrives.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SecurityRecord {
    /// Stock symbol
    pub symbol: String,
    /// Company name
    pub name: Option<String>,
    /// Two-digit GICS sector code
    pub sector_code: Option<u8>,
    /// Shares outstanding
    pub shares_outstanding: Option<f64>,
}

impl SecurityRecord {
    /// Create a record with only a symbol set.
    pub fn new(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            name: None,
            sector_code: None,
            shares_outstanding: None,
        }
    }

    /// Set the sector code.
    pub const fn with_sector_code(mut self, code: u8) -> Self {
        self.sector_code = Some(code);
        self
    }

    /// Set the shares outstanding.
    pub const fn with_shares_outstanding(mut self, shares: f64) -> Self {
        self.shares_outstanding = Some(shares);
        self
    }
}

impl SqliteCache {
    /// Create a new SQLite cache.
    ///
    /// # Arguments
    /// * `path` - Path to the SQLite database file
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)?;
        let cache = Self { conn };
        cache.initialize_schema()?;
        Ok(cache)
    }

    /// Create an in-memory cache (useful for testing).
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let cache = Self { conn };
        cache.initialize_schema()?;
        Ok(cache)
    }

    /// Initialize the database schema.
    fn initialize_schema(&self) -> Result<()> {
        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS quotes (
                symbol TEXT NOT NULL,
                date TEXT NOT NULL,
                open REAL NOT NULL,
                high REAL NOT NULL,
                low REAL NOT NULL,
                close REAL NOT NULL,
                volume INTEGER NOT NULL,
                adjusted_close REAL NOT NULL,
                cached_at TEXT NOT NULL,
                PRIMARY KEY (symbol, date)
            )",
            [],
        )?;

        self.conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_quotes_symbol_date ON quotes(symbol, date)",
            [],
        )?;

        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS securities (
                symbol TEXT PRIMARY KEY,
                name TEXT,
                sector_code INTEGER,
                shares_outstanding REAL,
                updated_at TEXT NOT NULL
            )",
            [],
        )?;

        Ok(())
    }

    /// Check if quotes are cached for a symbol and date range.
    pub fn has_quotes(&self, symbol: &str, start: NaiveDate, end: NaiveDate) -> Result<bool> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM quotes
             WHERE symbol = ?1 AND date >= ?2 AND date <= ?3",
            params![symbol, start.to_string(), end.to_string()],
            |row| row.get(0),
        )?;

        // Roughly 252 sessions in 365 calendar days, so a complete range
        // holds about 69% of calendar days.
        let days = (end - start).num_days() + 1;
        let expected_count = (days as f64 * MIN_COVERAGE) as i64;

        Ok(count > 0 && count >= expected_count)
    }

    /// Get cached quotes for a symbol and date range.
    pub fn get_quotes(&self, symbol: &str, start: NaiveDate, end: NaiveDate) -> Result<DataFrame> {
        let mut stmt = self.conn.prepare(
            "SELECT symbol, date, open, high, low, close, volume, adjusted_close
             FROM quotes
             WHERE symbol = ?1 AND date >= ?2 AND date <= ?3
             ORDER BY date ASC",
        )?;

        let rows = stmt.query_map(params![symbol, start.to_string(), end.to_string()], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, f64>(2)?,
                row.get::<_, f64>(3)?,
                row.get::<_, f64>(4)?,
                row.get::<_, f64>(5)?,
                row.get::<_, i64>(6)?,
                row.get::<_, f64>(7)?,
            ))
        })?;

        let mut quotes = Vec::new();
        for row in rows {
            let (symbol, date, open, high, low, close, volume, adjusted_close) = row?;
            let date = NaiveDate::parse_from_str(&date, "%Y-%m-%d")
                .map_err(|e| DataError::Parse(format!("Invalid cached date '{}': {}", date, e)))?;
            quotes.push(QuoteRow {
                symbol,
                date,
                open,
                high,
                low,
                close,
                volume: volume as u64,
                adjusted_close,
            });
        }

        if quotes.is_empty() {
            return Err(DataError::MissingData {
                symbol: symbol.to_string(),
                reason: "No cached data found".to_string(),
            });
        }

        frame::quotes_from_rows(&quotes)
    }

    /// Store quotes in the cache.
    pub fn put_quotes(&self, df: &DataFrame) -> Result<()> {
        let cached_at = Utc::now().to_rfc3339();
        let rows = frame::rows_from_quotes(df)?;

        let tx = self.conn.unchecked_transaction()?;

        for row in &rows {
            tx.execute(
                "INSERT OR REPLACE INTO quotes
                 (symbol, date, open, high, low, close, volume, adjusted_close, cached_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                params![
                    row.symbol,
                    row.date.to_string(),
                    row.open,
                    row.high,
                    row.low,
                    row.close,
                    row.volume as i64,
                    row.adjusted_close,
                    cached_at
                ],
            )?;
        }

        tx.commit()?;
        tracing::debug!(rows = rows.len(), "cached quotes");
        Ok(())
    }

    /// Remove every cached quote for a symbol.
    pub fn clear_quotes(&self, symbol: &str) -> Result<usize> {
        let removed = self
            .conn
            .execute("DELETE FROM quotes WHERE symbol = ?1", params![symbol])?;
        Ok(removed)
    }

    /// Store (or replace) the reference record of a security.
    pub fn put_security(&self, record: &SecurityRecord) -> Result<()> {
        let updated_at = Utc::now().to_rfc3339();

        self.conn.execute(
            "INSERT OR REPLACE INTO securities
             (symbol, name, sector_code, shares_outstanding, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                record.symbol,
                record.name,
                record.sector_code.map(i64::from),
                record.shares_outstanding,
                updated_at
            ],
        )?;

        Ok(())
    }

    /// Get the reference record of a security.
    pub fn get_security(&self, symbol: &str) -> Result<Option<SecurityRecord>> {
        let record = self
            .conn
            .query_row(
                "SELECT symbol, name, sector_code, shares_outstanding
                 FROM securities WHERE symbol = ?1",
                params![symbol],
                Self::security_from_row,
            )
            .optional()?;

        Ok(record)
    }

    /// Get every stored security record, ordered by symbol.
    pub fn securities(&self) -> Result<Vec<SecurityRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT symbol, name, sector_code, shares_outstanding
             FROM securities ORDER BY symbol",
        )?;

        let records = stmt
            .query_map([], Self::security_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(records)
    }

    fn security_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<SecurityRecord> {
        let sector_code: Option<i64> = row.get(2)?;
        Ok(SecurityRecord {
            symbol: row.get(0)?,
            name: row.get(1)?,
            sector_code: sector_code.and_then(|c| u8::try_from(c).ok()),
            shares_outstanding: row.get(3)?,
        })
    }

    /// Get cache statistics.
    pub fn stats(&self) -> Result<CacheStats> {
        let quotes_count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM quotes", [], |row| row.get(0))?;

        let symbols_count: i64 =
            self.conn
                .query_row("SELECT COUNT(DISTINCT symbol) FROM quotes", [], |row| {
                    row.get(0)
                })?;

        let securities_count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM securities", [], |row| row.get(0))?;

        Ok(CacheStats {
            total_quotes: quotes_count as usize,
            unique_symbols: symbols_count as usize,
            securities: securities_count as usize,
        })
    }
}

/// Cache statistics.
#[derive(Debug, Clone)]
pub struct CacheStats {
    /// Total number of quote records
    pub total_quotes: usize,
    /// Number of unique symbols with quotes
    pub unique_symbols: usize,
    /// Number of security reference records
    pub securities: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quotes(symbol: &str, days: u32) -> DataFrame {
        let rows: Vec<QuoteRow> = (1..=days)
            .map(|day| QuoteRow {
                symbol: symbol.to_string(),
                date: NaiveDate::from_ymd_opt(2024, 1, day).unwrap(),
                open: 10.0,
                high: 11.0,
                low: 9.0,
                close: 10.0 + day as f64,
                volume: 1_000 * day as u64,
                adjusted_close: 9.5 + day as f64,
            })
            .collect();
        frame::quotes_from_rows(&rows).unwrap()
    }

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, day).unwrap()
    }

    #[test]
    fn test_cache_initialization() {
        let cache = SqliteCache::in_memory();
        assert!(cache.is_ok());
    }

    #[test]
    fn test_quote_operations() {
        let cache = SqliteCache::in_memory().unwrap();
        cache.put_quotes(&quotes("AAPL", 10)).unwrap();

        let df = cache.get_quotes("AAPL", date(3), date(7)).unwrap();
        assert_eq!(df.height(), 5);
        assert_eq!(df.column("date").unwrap().dtype(), &DataType::Date);

        let adj = frame::column_f64(&df, "adjusted_close").unwrap();
        assert_eq!(adj.first().copied().flatten(), Some(12.5));
    }

    #[test]
    fn test_put_quotes_replaces_existing_rows() {
        let cache = SqliteCache::in_memory().unwrap();
        cache.put_quotes(&quotes("AAPL", 5)).unwrap();
        cache.put_quotes(&quotes("AAPL", 5)).unwrap();

        let stats = cache.stats().unwrap();
        assert_eq!(stats.total_quotes, 5);
        assert_eq!(stats.unique_symbols, 1);
    }

    #[test]
    fn test_has_quotes_coverage() {
        let cache = SqliteCache::in_memory().unwrap();
        cache.put_quotes(&quotes("AAPL", 10)).unwrap();

        assert!(cache.has_quotes("AAPL", date(1), date(10)).unwrap());
        assert!(!cache.has_quotes("AAPL", date(1), date(31)).unwrap());
        assert!(!cache.has_quotes("MSFT", date(1), date(10)).unwrap());
    }

    #[test]
    fn test_missing_quotes() {
        let cache = SqliteCache::in_memory().unwrap();
        let result = cache.get_quotes("AAPL", date(1), date(10));
        assert!(matches!(result, Err(DataError::MissingData { .. })));
    }

    #[test]
    fn test_clear_quotes() {
        let cache = SqliteCache::in_memory().unwrap();
        cache.put_quotes(&quotes("AAPL", 4)).unwrap();
        cache.put_quotes(&quotes("MSFT", 4)).unwrap();

        assert_eq!(cache.clear_quotes("AAPL").unwrap(), 4);
        assert_eq!(cache.stats().unwrap().unique_symbols, 1);
    }

    #[test]
    fn test_security_operations() {
        let cache = SqliteCache::in_memory().unwrap();

        let aapl = SecurityRecord::new("AAPL")
            .with_sector_code(45)
            .with_shares_outstanding(15.4e9);
        cache.put_security(&aapl).unwrap();
        cache.put_security(&SecurityRecord::new("XOM")).unwrap();

        assert_eq!(cache.get_security("AAPL").unwrap(), Some(aapl));
        assert_eq!(cache.get_security("MSFT").unwrap(), None);

        let all = cache.securities().unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[1].symbol, "XOM");
        assert_eq!(all[1].sector_code, None);
        assert_eq!(cache.stats().unwrap().securities, 2);
    }

    #[test]
    fn test_cache_stats_empty() {
        let cache = SqliteCache::in_memory().unwrap();

        let stats = cache.stats().unwrap();
        assert_eq!(stats.total_quotes, 0);
        assert_eq!(stats.unique_symbols, 0);
        assert_eq!(stats.securities, 0);
    }
}
