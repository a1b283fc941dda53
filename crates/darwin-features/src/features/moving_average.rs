//! Moving Average Ratio Feature
//!
//! Distance of the adjusted close from its simple moving average:
//! `adjusted_close / SMA_n(adjusted_close) - 1`. The average includes the
//! current session, which is known at the close.

use crate::error::Result;
use crate::traits::{Configurable, Feature};
use polars::prelude::*;
use serde::{Deserialize, Serialize};

/// Configuration for the MovingAverageRatio feature
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MovingAverageRatioConfig {
    /// Averaging window in sessions (default: 20)
    pub window: usize,
}

impl Default for MovingAverageRatioConfig {
    fn default() -> Self {
        Self { window: 20 }
    }
}

/// MovingAverageRatio measures how stretched price is from its trend
#[derive(Debug)]
pub struct MovingAverageRatio {
    config: MovingAverageRatioConfig,
    name: String,
}

impl MovingAverageRatio {
    /// Ratio to the `window`-session moving average.
    pub fn new(window: usize) -> Self {
        Self::with_config(MovingAverageRatioConfig { window })
    }
}

impl Feature for MovingAverageRatio {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.config.window.saturating_sub(1)
    }

    fn required_columns(&self) -> &[&str] {
        &["symbol", "date", "adjusted_close"]
    }

    fn compute(&self, data: LazyFrame) -> Result<LazyFrame> {
        let window = self.config.window;
        super::validate_window(&self.name, window, window)?;

        let result = data
            .sort(["symbol", "date"], Default::default())
            .with_columns([col("adjusted_close")
                .rolling_mean(super::fixed_window(window, window))
                .over([col("symbol")])
                .alias("sma")])
            .with_columns([
                (col("adjusted_close") / col("sma") - lit(1.0)).alias(self.name.as_str())
            ])
            .select([col("symbol"), col("date"), col(self.name.as_str())]);

        Ok(result)
    }
}

impl Configurable for MovingAverageRatio {
    type Config = MovingAverageRatioConfig;

    fn with_config(config: Self::Config) -> Self {
        let name = format!("close_sma_{}d", config.window);
        Self { config, name }
    }

    fn config(&self) -> &Self::Config {
        &self.config
    }
}

impl Default for MovingAverageRatio {
    fn default() -> Self {
        Self::with_config(MovingAverageRatioConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::testing::{frame, quotes, values};
    use approx::assert_relative_eq;

    #[test]
    fn test_feature_name() {
        assert_eq!(MovingAverageRatio::default().name(), "close_sma_20d");
        assert_eq!(MovingAverageRatio::default().lookback(), 19);
    }

    #[test]
    fn test_ratio_to_average() {
        let df = frame(quotes("AAPL", &[10.0, 20.0, 30.0, 40.0]));
        let out = MovingAverageRatio::new(3)
            .compute(df.lazy())
            .unwrap()
            .collect()
            .unwrap();

        let v = values(&out, "AAPL", "close_sma_3d");
        assert_eq!(v[0], None);
        assert_eq!(v[1], None);
        assert_relative_eq!(v[2].unwrap(), 30.0 / 20.0 - 1.0, epsilon = 1e-12);
        assert_relative_eq!(v[3].unwrap(), 40.0 / 30.0 - 1.0, epsilon = 1e-12);
    }
}
