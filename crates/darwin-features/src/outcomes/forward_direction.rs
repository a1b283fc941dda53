//! Forward Direction Outcome
//!
//! `up_fwd_{n}d` is 1.0 when the adjusted close `n` sessions ahead is above
//! today's, 0.0 otherwise, and null when the future is unobserved.

use crate::error::Result;
use crate::traits::{Configurable, Outcome};
use polars::prelude::*;
use serde::{Deserialize, Serialize};

/// Configuration for the ForwardDirection outcome
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForwardDirectionConfig {
    /// Sessions ahead (default: 5)
    pub horizon: usize,
}

impl Default for ForwardDirectionConfig {
    fn default() -> Self {
        Self { horizon: 5 }
    }
}

/// ForwardDirection is a 0/1 up-move indicator over the next `n` sessions
#[derive(Debug)]
pub struct ForwardDirection {
    config: ForwardDirectionConfig,
    name: String,
}

impl ForwardDirection {
    /// Direction over the next `horizon` sessions.
    pub fn new(horizon: usize) -> Self {
        Self::with_config(ForwardDirectionConfig { horizon })
    }
}

impl Outcome for ForwardDirection {
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
        super::validate_horizon(&self.name, self.config.horizon, 1)?;

        // Comparison against a null return stays null before the cast
        let result = data
            .sort(["symbol", "date"], Default::default())
            .with_columns([super::forward_return(self.config.horizon)
                .gt(lit(0.0))
                .cast(DataType::Float64)
                .alias(self.name.as_str())])
            .select([col("symbol"), col("date"), col(self.name.as_str())]);

        Ok(result)
    }
}

impl Configurable for ForwardDirection {
    type Config = ForwardDirectionConfig;

    fn with_config(config: Self::Config) -> Self {
        let name = format!("up_fwd_{}d", config.horizon);
        Self { config, name }
    }

    fn config(&self) -> &Self::Config {
        &self.config
    }
}

impl Default for ForwardDirection {
    fn default() -> Self {
        Self::with_config(ForwardDirectionConfig::default())
    }
}
