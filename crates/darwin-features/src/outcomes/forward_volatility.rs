//! Forward Volatility Outcome
//!
//! `vol_fwd_{n}d` is the sample standard deviation of the next `n` daily
//! returns, i.e. the returns on rows `t+1 ..= t+n`. It is the trailing
//! `n`-return volatility taken at row `t+n` and shifted back by `n`.

use crate::error::Result;
use crate::traits::{Configurable, Outcome};
use polars::prelude::*;
use serde::{Deserialize, Serialize};

/// Configuration for the ForwardVolatility outcome
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForwardVolatilityConfig {
    /// Sessions ahead (default: 20, minimum: 2)
    pub horizon: usize,
}

impl Default for ForwardVolatilityConfig {
    fn default() -> Self {
        Self { horizon: 20 }
    }
}

/// ForwardVolatility records realized volatility over the next `n` sessions
#[derive(Debug)]
pub struct ForwardVolatility {
    config: ForwardVolatilityConfig,
    name: String,
}

impl ForwardVolatility {
    /// Volatility of the next `horizon` daily returns.
    pub fn new(horizon: usize) -> Self {
        Self::with_config(ForwardVolatilityConfig { horizon })
    }
}

impl Outcome for ForwardVolatility {
    fn name(&self) -> &str {
        &self.name
    }

    fn horizon(&self) -> usize {
        self.config.horizon
    }

    fn required_columns(&self) -> &[&str] {
        &["symbol", "date", "adjusted_close"]
    }

    fn compute(&self, data: LazyFrame) -> Result<LazyFrame> {
        let horizon = self.config.horizon;
        super::validate_horizon(&self.name, horizon, 2)?;

        let result = data
            .sort(["symbol", "date"], Default::default())
            .with_columns([crate::features::daily_returns().alias("daily_return")])
            .with_columns([col("daily_return")
                .rolling_std(crate::features::fixed_window(horizon, horizon))
                .over([col("symbol")])
                .alias("trailing_vol")])
            .with_columns([col("trailing_vol")
                .shift(lit(-(horizon as i64)))
                .over([col("symbol")])
                .alias(self.name.as_str())])
            .select([col("symbol"), col("date"), col(self.name.as_str())]);

        Ok(result)
    }
}

impl Configurable for ForwardVolatility {
    type Config = ForwardVolatilityConfig;

    fn with_config(config: Self::Config) -> Self {
        let name = format!("vol_fwd_{}d", config.horizon);
        Self { config, name }
    }

    fn config(&self) -> &Self::Config {
        &self.config
    }
}

impl Default for ForwardVolatility {
    fn default() -> Self {
        Self::with_config(ForwardVolatilityConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::testing::{frame, quotes, values};
    use approx::assert_relative_eq;

    #[test]
    fn test_volatility_of_next_returns() {
        // returns on rows 1..=4: +10%, -10%, +10%, 0%
        let df = frame(quotes("AAPL", &[100.0, 110.0, 99.0, 108.9, 108.9]));
        let out = ForwardVolatility::new(2)
            .compute(df.lazy())
            .unwrap()
            .collect()
            .unwrap();

        let v = values(&out, "AAPL", "vol_fwd_2d");
        // row 0 sees returns +10%, -10%: sample std = sqrt(0.02)
        assert_relative_eq!(v[0].unwrap(), 0.02_f64.sqrt(), epsilon = 1e-9);
        // row 2 sees returns +10%, 0%
        assert_relative_eq!(v[2].unwrap(), 0.005_f64.sqrt(), epsilon = 1e-9);
        assert_eq!(&v[3..], &[None, None]);
    }

    #[test]
    fn test_horizon_of_one_rejected() {
        let df = frame(quotes("AAPL", &[1.0, 2.0, 3.0]));
        assert!(ForwardVolatility::new(1).compute(df.lazy()).is_err());
    }
}
