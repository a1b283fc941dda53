//! Rolling Volatility Feature
//!
//! Sample standard deviation of daily returns over a trailing window,
//! optionally annualized by `sqrt(252)`.

use crate::error::Result;
use crate::traits::{Configurable, Feature};
use polars::prelude::*;
use serde::{Deserialize, Serialize};

/// Trading sessions per year used for annualization.
const SESSIONS_PER_YEAR: f64 = 252.0;

/// Configuration for the RollingVolatility feature
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RollingVolatilityConfig {
    /// Rolling window size in sessions (default: 20)
    pub window: usize,
    /// Minimum number of returns in the window (default: 10)
    pub min_periods: usize,
    /// Multiply by sqrt(252) (default: false)
    pub annualize: bool,
}

impl Default for RollingVolatilityConfig {
    fn default() -> Self {
        Self {
            window: 20,
            min_periods: 10,
            annualize: false,
        }
    }
}

/// RollingVolatility computes realized volatility of daily returns
#[derive(Debug)]
pub struct RollingVolatility {
    config: RollingVolatilityConfig,
    name: String,
}

impl RollingVolatility {
    /// Volatility over `window` sessions requiring a full window.
    pub fn new(window: usize) -> Self {
        Self::with_config(RollingVolatilityConfig {
            window,
            min_periods: window,
            annualize: false,
        })
    }
}

impl Feature for RollingVolatility {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.config.min_periods
    }

    fn required_columns(&self) -> &[&str] {
        &["symbol", "date", "adjusted_close"]
    }

    fn compute(&self, data: LazyFrame) -> Result<LazyFrame> {
        let window = self.config.window;
        let min_periods = self.config.min_periods;
        super::validate_window(&self.name, window, min_periods)?;

        let mut result = data
            .sort(["symbol", "date"], Default::default())
            .with_columns([super::daily_returns().alias("daily_return")])
            .with_columns([col("daily_return")
                .rolling_std(super::fixed_window(window, min_periods))
                .over([col("symbol")])
                .alias(self.name.as_str())]);

        if self.config.annualize {
            result = result.with_columns([
                (col(self.name.as_str()) * lit(SESSIONS_PER_YEAR.sqrt())).alias(self.name.as_str())
            ]);
        }

        Ok(result.select([col("symbol"), col("date"), col(self.name.as_str())]))
    }
}

impl Configurable for RollingVolatility {
    type Config = RollingVolatilityConfig;

    fn with_config(config: Self::Config) -> Self {
        let name = format!("vol_{}d", config.window);
        Self { config, name }
    }

    fn config(&self) -> &Self::Config {
        &self.config
    }
}

impl Default for RollingVolatility {
    fn default() -> Self {
        Self::with_config(RollingVolatilityConfig::default())
    }
}
