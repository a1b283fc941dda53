//! Intraday Range Feature
//!
//! `range_1d = (high - low) / close` for the current session.

use crate::error::Result;
use crate::traits::Feature;
use polars::prelude::*;

/// IntradayRange measures the session's high-low spread relative to close
#[derive(Debug, Default)]
pub struct IntradayRange;

impl IntradayRange {
    /// Output column name.
    pub const NAME: &'static str = "range_1d";
}

impl Feature for IntradayRange {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn lookback(&self) -> usize {
        0
    }

    fn required_columns(&self) -> &[&str] {
        &["symbol", "date", "high", "low", "close"]
    }

    fn compute(&self, data: LazyFrame) -> Result<LazyFrame> {
        let result = data
            .with_columns([((col("high") - col("low")) / col("close")).alias(Self::NAME)])
            .sort(["symbol", "date"], Default::default())
            .select([col("symbol"), col("date"), col(Self::NAME)]);

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::testing::{frame, quotes, values};
    use approx::assert_relative_eq;

    #[test]
    fn test_range() {
        let df = frame(quotes("AAPL", &[50.0, 80.0]));
        let out = IntradayRange.compute(df.lazy()).unwrap().collect().unwrap();

        // high = 1.02 close, low = 0.98 close
        for v in values(&out, "AAPL", "range_1d") {
            assert_relative_eq!(v.unwrap(), 0.04, epsilon = 1e-12);
        }
    }
}
