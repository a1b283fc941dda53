//! Column Registry
//!
//! Catalog of every feature and outcome Darwin can compute, and lookup of
//! concrete instances from column names such as `close_chg_5d` or
//! `up_fwd_20d`. Windowed columns encode their window as `_{n}d`.

use crate::error::{FeatureError, Result};
use crate::features::{
    IntradayRange, LogVolume, MovingAverageRatio, PriceChange, RelativeVolume, RollingVolatility,
};
use crate::outcomes::{ForwardDirection, ForwardReturn, ForwardVolatility};
use crate::traits::{Feature, Outcome};

/// Whether a column is a predictor or a target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnKind {
    /// Known at the end of the row's session
    Feature,
    /// Observed after the row's session
    Outcome,
}

/// Column metadata
#[derive(Debug, Clone)]
pub struct ColumnInfo {
    /// Column prefix; windowed columns append `{n}d`
    pub prefix: &'static str,
    /// True when the column name carries a window length
    pub windowed: bool,
    /// Smallest accepted window; zero for columns without one
    pub min_window: usize,
    /// Feature or outcome
    pub kind: ColumnKind,
    /// Brief description of what the column measures
    pub description: &'static str,
    /// Quote columns read to compute it
    pub required_columns: &'static [&'static str],
}

impl ColumnInfo {
    /// Display pattern, e.g. `close_chg_{n}d`.
    pub fn pattern(&self) -> String {
        if self.windowed {
            format!("{}{{n}}d", self.prefix)
        } else {
            self.prefix.to_string()
        }
    }

    /// Window length encoded in `name`, or `None` if it does not match.
    fn window(&self, name: &str) -> Option<usize> {
        if !self.windowed {
            return (name == self.prefix).then_some(0);
        }
        name.strip_prefix(self.prefix)?
            .strip_suffix('d')?
            .parse()
            .ok()
    }
}

/// All available features
pub fn available_features() -> Vec<ColumnInfo> {
    vec![
        ColumnInfo {
            prefix: "close_chg_",
            windowed: true,
            min_window: 1,
            kind: ColumnKind::Feature,
            description: "Trailing return of the adjusted close",
            required_columns: &["symbol", "date", "adjusted_close"],
        },
        ColumnInfo {
            prefix: "close_sma_",
            windowed: true,
            min_window: 1,
            kind: ColumnKind::Feature,
            description: "Adjusted close relative to its simple moving average",
            required_columns: &["symbol", "date", "adjusted_close"],
        },
        ColumnInfo {
            prefix: "vol_",
            windowed: true,
            min_window: 2,
            kind: ColumnKind::Feature,
            description: "Standard deviation of trailing daily returns",
            required_columns: &["symbol", "date", "adjusted_close"],
        },
        ColumnInfo {
            prefix: "rel_volume_",
            windowed: true,
            min_window: 1,
            kind: ColumnKind::Feature,
            description: "Volume relative to its trailing average",
            required_columns: &["symbol", "date", "volume"],
        },
        ColumnInfo {
            prefix: "range_1d",
            windowed: false,
            min_window: 0,
            kind: ColumnKind::Feature,
            description: "Session high-low range over close",
            required_columns: &["symbol", "date", "high", "low", "close"],
        },
        ColumnInfo {
            prefix: "log_volume",
            windowed: false,
            min_window: 0,
            kind: ColumnKind::Feature,
            description: "Natural log of one plus session volume",
            required_columns: &["symbol", "date", "volume"],
        },
    ]
}

/// All available outcomes
pub fn available_outcomes() -> Vec<ColumnInfo> {
    vec![
        ColumnInfo {
            prefix: "close_fwd_",
            windowed: true,
            min_window: 1,
            kind: ColumnKind::Outcome,
            description: "Return of the adjusted close over the next n sessions",
            required_columns: &["symbol", "date", "adjusted_close"],
        },
        ColumnInfo {
            prefix: "up_fwd_",
            windowed: true,
            min_window: 1,
            kind: ColumnKind::Outcome,
            description: "1.0 if the adjusted close rises over the next n sessions",
            required_columns: &["symbol", "date", "adjusted_close"],
        },
        ColumnInfo {
            prefix: "vol_fwd_",
            windowed: true,
            min_window: 2,
            kind: ColumnKind::Outcome,
            description: "Standard deviation of the next n daily returns",
            required_columns: &["symbol", "date", "adjusted_close"],
        },
    ]
}

/// Metadata for a concrete column name, feature or outcome.
pub fn get_column_info(name: &str) -> Option<ColumnInfo> {
    available_outcomes()
        .into_iter()
        .chain(available_features())
        .find(|info| info.window(name).is_some())
}

fn window_of(name: &str, kind: ColumnKind) -> Result<(&'static str, usize)> {
    let info = get_column_info(name)
        .filter(|info| info.kind == kind)
        .ok_or_else(|| FeatureError::UnknownColumn(name.to_string()))?;
    let window = info
        .window(name)
        .ok_or_else(|| FeatureError::UnknownColumn(name.to_string()))?;
    if info.windowed && window < info.min_window {
        return Err(FeatureError::InvalidConfig(format!(
            "{}: window must be at least {}",
            name, info.min_window
        )));
    }
    Ok((info.prefix, window))
}

/// Construct the feature that produces column `name`.
pub fn parse_feature(name: &str) -> Result<Box<dyn Feature>> {
    let (prefix, n) = window_of(name, ColumnKind::Feature)?;
    let feature: Box<dyn Feature> = match prefix {
        "close_chg_" => Box::new(PriceChange::new(n)),
        "close_sma_" => Box::new(MovingAverageRatio::new(n)),
        "vol_" => Box::new(RollingVolatility::new(n)),
        "rel_volume_" => Box::new(RelativeVolume::new(n)),
        "range_1d" => Box::new(IntradayRange),
        "log_volume" => Box::new(LogVolume),
        _ => return Err(FeatureError::UnknownColumn(name.to_string())),
    };
    Ok(feature)
}

/// Construct the outcome that produces column `name`.
pub fn parse_outcome(name: &str) -> Result<Box<dyn Outcome>> {
    let (prefix, n) = window_of(name, ColumnKind::Outcome)?;
    let outcome: Box<dyn Outcome> = match prefix {
        "close_fwd_" => Box::new(ForwardReturn::new(n)),
        "up_fwd_" => Box::new(ForwardDirection::new(n)),
        "vol_fwd_" => Box::new(ForwardVolatility::new(n)),
        _ => return Err(FeatureError::UnknownColumn(name.to_string())),
    };
    Ok(outcome)
}
