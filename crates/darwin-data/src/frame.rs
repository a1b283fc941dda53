//! Quote frame helpers.
//!
//! Every quote frame handled by Darwin has the columns listed in
//! [`QUOTE_COLUMNS`], with `date` stored as a polars `Date`. These helpers
//! build such frames from rows and read typed values back out of any frame.

use crate::error::{DataError, Result};
use chrono::NaiveDate;
use polars::prelude::*;
use serde::{Deserialize, Serialize};

/// Column layout of a quote frame.
pub const QUOTE_COLUMNS: [&str; 8] = [
    "symbol",
    "date",
    "open",
    "high",
    "low",
    "close",
    "volume",
    "adjusted_close",
];

/// A single adjusted OHLCV observation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuoteRow {
    /// Ticker symbol
    pub symbol: String,
    /// Trading session date
    pub date: NaiveDate,
    /// Opening price
    pub open: f64,
    /// Session high
    pub high: f64,
    /// Session low
    pub low: f64,
    /// Closing price
    pub close: f64,
    /// Shares traded
    pub volume: u64,
    /// Split and dividend adjusted close
    pub adjusted_close: f64,
}

/// Days since the Unix epoch, matching the physical representation of a polars `Date`.
pub fn epoch_days(date: NaiveDate) -> i32 {
    let epoch = NaiveDate::from_ymd_opt(1970, 1, 1).unwrap_or_default();
    (date - epoch).num_days() as i32
}

/// Predicate selecting rows dated on or before `date`.
pub fn on_or_before(date: NaiveDate) -> Expr {
    col("date")
        .cast(DataType::Int32)
        .lt_eq(lit(epoch_days(date)))
}

/// Predicate selecting rows dated strictly before `date`.
pub fn before(date: NaiveDate) -> Expr {
    col("date").cast(DataType::Int32).lt(lit(epoch_days(date)))
}

/// Build a quote frame from rows.
///
/// The frame keeps row order; callers sort when they need to.
pub fn quotes_from_rows(rows: &[QuoteRow]) -> Result<DataFrame> {
    let df = DataFrame::new(vec![
        Column::new(
            "symbol".into(),
            rows.iter().map(|r| r.symbol.as_str()).collect::<Vec<_>>(),
        ),
        Column::new(
            "date".into(),
            rows.iter().map(|r| r.date.to_string()).collect::<Vec<_>>(),
        ),
        Column::new(
            "open".into(),
            rows.iter().map(|r| r.open).collect::<Vec<_>>(),
        ),
        Column::new(
            "high".into(),
            rows.iter().map(|r| r.high).collect::<Vec<_>>(),
        ),
        Column::new("low".into(), rows.iter().map(|r| r.low).collect::<Vec<_>>()),
        Column::new(
            "close".into(),
            rows.iter().map(|r| r.close).collect::<Vec<_>>(),
        ),
        Column::new(
            "volume".into(),
            rows.iter().map(|r| r.volume).collect::<Vec<_>>(),
        ),
        Column::new(
            "adjusted_close".into(),
            rows.iter().map(|r| r.adjusted_close).collect::<Vec<_>>(),
        ),
    ])?;

    let df = df
        .lazy()
        .with_column(col("date").cast(DataType::Date))
        .collect()?;

    Ok(df)
}

/// Read a quote frame back into rows, skipping rows with missing values.
pub fn rows_from_quotes(df: &DataFrame) -> Result<Vec<QuoteRow>> {
    require_columns(df, &QUOTE_COLUMNS)?;

    let symbols = column_strings(df, "symbol")?;
    let dates = column_dates(df, "date")?;
    let opens = column_f64(df, "open")?;
    let highs = column_f64(df, "high")?;
    let lows = column_f64(df, "low")?;
    let closes = column_f64(df, "close")?;
    let volumes = column_f64(df, "volume")?;
    let adj_closes = column_f64(df, "adjusted_close")?;

    let mut rows = Vec::with_capacity(df.height());
    for i in 0..df.height() {
        if let (
            Some(symbol),
            Some(date),
            Some(open),
            Some(high),
            Some(low),
            Some(close),
            Some(volume),
            Some(adjusted_close),
        ) = (
            symbols[i].clone(),
            dates[i],
            opens[i],
            highs[i],
            lows[i],
            closes[i],
            volumes[i],
            adj_closes[i],
        ) {
            rows.push(QuoteRow {
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
    }

    Ok(rows)
}

/// Fail with [`DataError::Parse`] unless every column in `names` exists.
pub fn require_columns(df: &DataFrame, names: &[&str]) -> Result<()> {
    let present = df.get_column_names();
    for name in names {
        if !present.iter().any(|c| c.as_str() == *name) {
            return Err(DataError::Parse(format!("Missing column: {}", name)));
        }
    }
    Ok(())
}

/// Read a column as optional strings.
pub fn column_strings(df: &DataFrame, name: &str) -> Result<Vec<Option<String>>> {
    let column = df.column(name)?.cast(&DataType::String)?;
    let values = column.str()?;
    Ok(values.into_iter().map(|v| v.map(str::to_string)).collect())
}

/// Read a column as optional `f64` values, casting numeric types.
pub fn column_f64(df: &DataFrame, name: &str) -> Result<Vec<Option<f64>>> {
    let column = df.column(name)?.cast(&DataType::Float64)?;
    let values = column.f64()?;
    Ok(values.into_iter().collect())
}

/// Read a `Date` (or ISO date string) column as optional `NaiveDate` values.
pub fn column_dates(df: &DataFrame, name: &str) -> Result<Vec<Option<NaiveDate>>> {
    column_strings(df, name)?
        .into_iter()
        .map(|value| {
            value
                .map(|s| {
                    NaiveDate::parse_from_str(&s, "%Y-%m-%d")
                        .map_err(|e| DataError::Parse(format!("Invalid date '{}': {}", s, e)))
                })
                .transpose()
        })
        .collect()
}

/// Distinct symbols in a frame, sorted.
pub fn symbols(df: &DataFrame) -> Result<Vec<String>> {
    let mut symbols: Vec<String> = column_strings(df, "symbol")?
        .into_iter()
        .flatten()
        .collect();
    symbols.sort();
    symbols.dedup();
    Ok(symbols)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn row(symbol: &str, day: u32, close: f64) -> QuoteRow {
        QuoteRow {
            symbol: symbol.to_string(),
            date: NaiveDate::from_ymd_opt(2024, 1, day).unwrap(),
            open: close,
            high: close + 1.0,
            low: close - 1.0,
            close,
            volume: 1_000,
            adjusted_close: close,
        }
    }

    #[rstest]
    #[case(1970, 1, 1, 0)]
    #[case(1970, 1, 11, 10)]
    #[case(1969, 12, 31, -1)]
    #[case(2024, 1, 2, 19_724)]
    fn test_epoch_days(#[case] year: i32, #[case] month: u32, #[case] day: u32, #[case] expected: i32) {
        let date = NaiveDate::from_ymd_opt(year, month, day).unwrap();
        assert_eq!(epoch_days(date), expected);
    }

    #[test]
    fn test_quotes_from_rows_layout() {
        let df = quotes_from_rows(&[row("AAPL", 2, 10.0), row("MSFT", 2, 20.0)]).unwrap();

        assert_eq!(df.height(), 2);
        assert_eq!(df.get_column_names(), QUOTE_COLUMNS.to_vec());
        assert_eq!(df.column("date").unwrap().dtype(), &DataType::Date);
    }

    #[test]
    fn test_rows_from_quotes_preserves_values() {
        let rows = vec![row("AAPL", 2, 10.0), row("AAPL", 3, 11.0)];
        let df = quotes_from_rows(&rows).unwrap();

        assert_eq!(rows_from_quotes(&df).unwrap(), rows);
    }

    #[test]
    fn test_date_predicates() {
        let df = quotes_from_rows(&[
            row("AAPL", 2, 10.0),
            row("AAPL", 3, 11.0),
            row("AAPL", 4, 12.0),
        ])
        .unwrap();
        let cutoff = NaiveDate::from_ymd_opt(2024, 1, 3).unwrap();

        let kept = df.clone().lazy().filter(on_or_before(cutoff)).collect().unwrap();
        assert_eq!(kept.height(), 2);

        let kept = df.lazy().filter(before(cutoff)).collect().unwrap();
        assert_eq!(kept.height(), 1);
    }

    #[test]
    fn test_require_columns() {
        let df = quotes_from_rows(&[row("AAPL", 2, 10.0)]).unwrap();
        assert!(require_columns(&df, &["symbol", "close"]).is_ok());
        assert!(matches!(
            require_columns(&df, &["market_cap"]),
            Err(DataError::Parse(_))
        ));
    }

    #[test]
    fn test_symbols_sorted_unique() {
        let df = quotes_from_rows(&[
            row("MSFT", 2, 10.0),
            row("AAPL", 2, 10.0),
            row("MSFT", 3, 10.0),
        ])
        .unwrap();
        assert_eq!(symbols(&df).unwrap(), vec!["AAPL", "MSFT"]);
    }
}
