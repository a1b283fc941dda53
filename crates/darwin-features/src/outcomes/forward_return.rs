//! Forward Return Outcome
//!
//! `close_fwd_{n}d = adjusted_close[t + n] / adjusted_close[t] - 1`

use crate::error::Result;
use crate::traits::{Configurable, Outcome};
use polars::prelude::*;
use serde::{Deserialize, Serialize};

/// Configuration for the ForwardReturn outcome
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForwardReturnConfig {
    /// Sessions ahead (default: 5)
    pub horizon: usize,
}

impl Default for ForwardReturnConfig {
    fn default() -> Self {
        Self { horizon: 5 }
    }
}

/// ForwardReturn records the return over the next `n` sessions
#[derive(Debug)]
pub struct ForwardReturn {
    config: ForwardReturnConfig,
    name: String,
}

impl ForwardReturn {
    /// Return over the next `horizon` sessions.
    pub fn new(horizon: usize) -> Self {
        Self::with_config(ForwardReturnConfig { horizon })
    }
}

impl Outcome for ForwardReturn {
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

        let result = data
            .sort(["symbol", "date"], Default::default())
            .with_columns([super::forward_return(self.config.horizon).alias(self.name.as_str())])
            .select([col("symbol"), col("date"), col(self.name.as_str())]);

        Ok(result)
    }
}

impl Configurable for ForwardReturn {
    type Config = ForwardReturnConfig;

    fn with_config(config: Self::Config) -> Self {
        let name = format!("close_fwd_{}d", config.horizon);
        Self { config, name }
    }

    fn config(&self) -> &Self::Config {
        &self.config
    }
}

impl Default for ForwardReturn {
    fn default() -> Self {
        Self::with_config(ForwardReturnConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::testing::{frame, quotes, values};
    use approx::assert_relative_eq;
    use rstest::rstest;

    #[rstest]
    #[case(1, "close_fwd_1d")]
    #[case(5, "close_fwd_5d")]
    #[case(20, "close_fwd_20d")]
    fn test_outcome_name(#[case] horizon: usize, #[case] expected: &str) {
        assert_eq!(ForwardReturn::new(horizon).name(), expected);
    }

    #[test]
    fn test_future_value_lands_on_current_row() {
        let df = frame(quotes("AAPL", &[100.0, 110.0, 121.0, 133.1]));
        let out = ForwardReturn::new(1).compute(df.lazy()).unwrap().collect().unwrap();

        let v = values(&out, "AAPL", "close_fwd_1d");
        assert_relative_eq!(v[0].unwrap(), 0.1, epsilon = 1e-12);
        assert_relative_eq!(v[2].unwrap(), 0.1, epsilon = 1e-12);
        assert_eq!(v[3], None);
    }

    #[test]
    fn test_tail_rows_are_null_per_symbol() {
        let mut rows = quotes("AAPL", &[1.0, 2.0, 3.0, 4.0]);
        rows.extend(quotes("MSFT", &[5.0, 6.0, 7.0, 8.0]));
        let out = ForwardReturn::new(2)
            .compute(frame(rows).lazy())
            .unwrap()
            .collect()
            .unwrap();

        for symbol in ["AAPL", "MSFT"] {
            let v = values(&out, symbol, "close_fwd_2d");
            assert!(v[0].is_some() && v[1].is_some());
            assert_eq!(&v[2..], &[None, None]);
        }
    }

    #[test]
    fn test_zero_horizon_rejected() {
        let df = frame(quotes("AAPL", &[1.0, 2.0]));
        assert!(ForwardReturn::new(0).compute(df.lazy()).is_err());
    }
}
