//! Price Change Feature
//!
//! Trailing return of the adjusted close over a fixed number of sessions:
//! `adjusted_close[t] / adjusted_close[t - n] - 1`.

use crate::error::Result;
use crate::traits::{Configurable, Feature};
use polars::prelude::*;
use serde::{Deserialize, Serialize};

/// Configuration for the PriceChange feature
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceChangeConfig {
    /// Lookback in sessions (default: 5)
    pub lookback: usize,
}

impl Default for PriceChangeConfig {
    fn default() -> Self {
        Self { lookback: 5 }
    }
}

/// PriceChange computes the trailing `n`-session return
#[derive(Debug)]
pub struct PriceChange {
    config: PriceChangeConfig,
    name: String,
}

impl PriceChange {
    /// Trailing return over `lookback` sessions.
    pub fn new(lookback: usize) -> Self {
        Self::with_config(PriceChangeConfig { lookback })
    }
}

impl Feature for PriceChange {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.config.lookback
    }

    fn required_columns(&self) -> &[&str] {
        &["symbol", "date", "adjusted_close"]
    }

    fn compute(&self, data: LazyFrame) -> Result<LazyFrame> {
        super::validate_window(&self.name, self.config.lookback, 1)?;
        let lookback = self.config.lookback as i64;

        let result = data
            .sort(["symbol", "date"], Default::default())
            .with_columns([(col("adjusted_close")
                / col("adjusted_close")
                    .shift(lit(lookback))
                    .over([col("symbol")])
                - lit(1.0))
            .alias(self.name.as_str())])
            .select([col("symbol"), col("date"), col(self.name.as_str())]);

        Ok(result)
    }
}

impl Configurable for PriceChange {
    type Config = PriceChangeConfig;

    fn with_config(config: Self::Config) -> Self {
        let name = format!("close_chg_{}d", config.lookback);
        Self { config, name }
    }

    fn config(&self) -> &Self::Config {
        &self.config
    }
}

impl Default for PriceChange {
    fn default() -> Self {
        Self::with_config(PriceChangeConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::testing::{frame, quotes, values};
    use approx::assert_relative_eq;

    #[test]
    fn test_feature_name() {
        assert_eq!(PriceChange::default().name(), "close_chg_5d");
        assert_eq!(PriceChange::new(20).name(), "close_chg_20d");
    }

    #[test]
    fn test_trailing_return() {
        let df = frame(quotes("AAPL", &[100.0, 110.0, 121.0, 133.1]));
        let out = PriceChange::new(2).compute(df.lazy()).unwrap().collect().unwrap();

        let v = values(&out, "AAPL", "close_chg_2d");
        assert_eq!(v[0], None);
        assert_eq!(v[1], None);
        assert_relative_eq!(v[2].unwrap(), 0.21, epsilon = 1e-12);
        assert_relative_eq!(v[3].unwrap(), 0.21, epsilon = 1e-12);
    }

    #[test]
    fn test_window_does_not_cross_symbols() {
        let mut rows = quotes("AAPL", &[100.0, 200.0]);
        rows.extend(quotes("MSFT", &[50.0, 55.0]));
        let out = PriceChange::new(1)
            .compute(frame(rows).lazy())
            .unwrap()
            .collect()
            .unwrap();

        assert_eq!(values(&out, "MSFT", "close_chg_1d")[0], None);
        assert_relative_eq!(
            values(&out, "MSFT", "close_chg_1d")[1].unwrap(),
            0.1,
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_zero_lookback_rejected() {
        let df = frame(quotes("AAPL", &[1.0, 2.0]));
        assert!(PriceChange::new(0).compute(df.lazy()).is_err());
    }
}
