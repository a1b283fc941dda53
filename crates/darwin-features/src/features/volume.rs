//! Volume Features
//!
//! - [`RelativeVolume`]: today's volume over its trailing average,
//!   `volume / mean(volume, n)`.
//! - [`LogVolume`]: `ln(1 + volume)`, which tames the heavy right tail of
//!   raw share counts.

use crate::error::Result;
use crate::traits::{Configurable, Feature};
use polars::prelude::*;
use serde::{Deserialize, Serialize};

/// Configuration for the RelativeVolume feature
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelativeVolumeConfig {
    /// Averaging window in sessions (default: 20)
    pub window: usize,
}

impl Default for RelativeVolumeConfig {
    fn default() -> Self {
        Self { window: 20 }
    }
}

/// RelativeVolume compares a session's volume with its recent average
#[derive(Debug)]
pub struct RelativeVolume {
    config: RelativeVolumeConfig,
    name: String,
}

impl RelativeVolume {
    /// Relative volume against a `window`-session average.
    pub fn new(window: usize) -> Self {
        Self::with_config(RelativeVolumeConfig { window })
    }
}

impl Feature for RelativeVolume {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.config.window.saturating_sub(1)
    }

    fn required_columns(&self) -> &[&str] {
        &["symbol", "date", "volume"]
    }

    fn compute(&self, data: LazyFrame) -> Result<LazyFrame> {
        let window = self.config.window;
        super::validate_window(&self.name, window, window)?;

        let volume = col("volume").cast(DataType::Float64);
        let result = data
            .sort(["symbol", "date"], Default::default())
            .with_columns([volume
                .clone()
                .rolling_mean(super::fixed_window(window, window))
                .over([col("symbol")])
                .alias("avg_volume")])
            // A zero average (halted stock) yields null rather than inf
            .with_columns([when(col("avg_volume").gt(lit(0.0)))
                .then(volume / col("avg_volume"))
                .otherwise(lit(NULL).cast(DataType::Float64))
                .alias(self.name.as_str())])
            .select([col("symbol"), col("date"), col(self.name.as_str())]);

        Ok(result)
    }
}

impl Configurable for RelativeVolume {
    type Config = RelativeVolumeConfig;

    fn with_config(config: Self::Config) -> Self {
        let name = format!("rel_volume_{}d", config.window);
        Self { config, name }
    }

    fn config(&self) -> &Self::Config {
        &self.config
    }
}

impl Default for RelativeVolume {
    fn default() -> Self {
        Self::with_config(RelativeVolumeConfig::default())
    }
}

/// LogVolume is the natural log of one plus the session volume
#[derive(Debug, Default)]
pub struct LogVolume;

impl LogVolume {
    /// Output column name.
    pub const NAME: &'static str = "log_volume";
}

impl Feature for LogVolume {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn lookback(&self) -> usize {
        0
    }

    fn required_columns(&self) -> &[&str] {
        &["symbol", "date", "volume"]
    }

    fn compute(&self, data: LazyFrame) -> Result<LazyFrame> {
        let result = data
            .with_columns([col("volume")
                .cast(DataType::Float64)
                .apply(
                    |c: Column| {
                        let s = c.as_materialized_series();
                        Ok(Some(s.f64()?.apply_values(f64::ln_1p).into_series().into()))
                    },
                    GetOutput::from_type(DataType::Float64),
                )
                .alias(Self::NAME)])
            .sort(["symbol", "date"], Default::default())
            .select([col("symbol"), col("date"), col(Self::NAME)]);

        Ok(result)
    }
}
