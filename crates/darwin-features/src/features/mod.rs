//! Lookback features.
//!
//! Every feature is computed per symbol over rows sorted by date, so a
//! window never crosses from one symbol into another.

pub mod moving_average;
pub mod price_change;
pub mod range;
pub mod volatility;
pub mod volume;

pub use moving_average::MovingAverageRatio;
pub use price_change::PriceChange;
pub use range::IntradayRange;
pub use volatility::RollingVolatility;
pub use volume::{LogVolume, RelativeVolume};

use crate::error::{FeatureError, Result};
use polars::prelude::*;

/// Simple daily return of the adjusted close, per symbol.
pub(crate) fn daily_returns() -> Expr {
    col("adjusted_close") / col("adjusted_close").shift(lit(1)).over([col("symbol")]) - lit(1.0)
}

/// Fixed rolling window options.
pub(crate) fn fixed_window(window: usize, min_periods: usize) -> RollingOptionsFixedWindow {
    RollingOptionsFixedWindow {
        window_size: window,
        min_periods,
        ..Default::default()
    }
}

/// Reject zero-length windows and `min_periods` larger than the window.
pub(crate) fn validate_window(name: &str, window: usize, min_periods: usize) -> Result<()> {
    if window == 0 {
        return Err(FeatureError::InvalidConfig(format!(
            "{}: window must be positive",
            name
        )));
    }
    if min_periods == 0 || min_periods > window {
        return Err(FeatureError::InvalidConfig(format!(
            "{}: min_periods must be in 1..={}",
            name, window
        )));
    }
    Ok(())
}

#[cfg(test)]
pub(crate) mod testing {
    //! Synthetic quote frames shared by feature and outcome tests.

    use chrono::NaiveDate;
    use darwin_data::frame::{QuoteRow, quotes_from_rows};
    use polars::prelude::*;

    /// Build quotes for one symbol from a list of adjusted closes.
    pub(crate) fn quotes(symbol: &str, closes: &[f64]) -> Vec<QuoteRow> {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        closes
            .iter()
            .enumerate()
            .map(|(i, &close)| QuoteRow {
                symbol: symbol.to_string(),
                date: start + chrono::Duration::days(i as i64),
                open: close,
                high: close * 1.02,
                low: close * 0.98,
                close,
                volume: 1_000 + 100 * i as u64,
                adjusted_close: close,
            })
            .collect()
    }

    /// Frame with the given rows, shuffled out of date order.
    pub(crate) fn frame(mut rows: Vec<QuoteRow>) -> DataFrame {
        rows.reverse();
        quotes_from_rows(&rows).unwrap()
    }

    /// Values of `column` for `symbol`, in date order.
    pub(crate) fn values(df: &DataFrame, symbol: &str, column: &str) -> Vec<Option<f64>> {
        let sorted = df
            .clone()
            .lazy()
            .filter(col("symbol").eq(lit(symbol)))
            .sort(["date"], SortMultipleOptions::default())
            .collect()
            .unwrap();
        darwin_data::frame::column_f64(&sorted, column).unwrap()
    }
}
