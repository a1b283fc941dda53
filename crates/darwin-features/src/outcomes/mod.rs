//! Forward-looking outcomes.
//!
//! Each outcome shifts future values of a symbol back onto the current row
//! with a negative `shift` applied `.over(symbol)`. The last `horizon` rows
//! of every symbol therefore come out null.

pub mod forward_direction;
pub mod forward_return;
pub mod forward_volatility;

pub use forward_direction::ForwardDirection;
pub use forward_return::ForwardReturn;
pub use forward_volatility::ForwardVolatility;

use crate::error::{FeatureError, Result};
use polars::prelude::*;

/// `adjusted_close[t + horizon] / adjusted_close[t] - 1`, per symbol.
pub(crate) fn forward_return(horizon: usize) -> Expr {
    col("adjusted_close")
        .shift(lit(-(horizon as i64)))
        .over([col("symbol")])
        / col("adjusted_close")
        - lit(1.0)
}

pub(crate) fn validate_horizon(name: &str, horizon: usize, min: usize) -> Result<()> {
    if horizon < min {
        return Err(FeatureError::InvalidConfig(format!(
            "{}: horizon must be at least {}",
            name, min
        )));
    }
    Ok(())
}
