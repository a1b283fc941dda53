//! Feature and outcome tables.
//!
//! A table is built from a quote frame by computing every column
//! independently and left-joining each result onto the `(symbol, date)`
//! keys of the quotes. Rows are never dropped here: warm-up rows of a
//! feature and tail rows of an outcome stay in the table as nulls, and
//! are only removed when features and outcomes are aligned.

use crate::error::{FeatureError, Result};
use crate::features::{
    IntradayRange, LogVolume, MovingAverageRatio, PriceChange, RelativeVolume, RollingVolatility,
};
use crate::outcomes::{ForwardDirection, ForwardReturn};
use crate::traits::{Feature, Outcome};
use polars::prelude::*;

/// Check that `df` carries every column in `names`.
pub(crate) fn require_columns(df: &DataFrame, names: &[&str]) -> Result<()> {
    let present = df.get_column_names();
    for name in names {
        if !present.iter().any(|c| c.as_str() == *name) {
            return Err(FeatureError::MissingColumn((*name).to_string()));
        }
    }
    Ok(())
}

/// Sorted `(symbol, date)` keys of a quote frame.
fn keys(quotes: &DataFrame) -> Result<LazyFrame> {
    require_columns(quotes, &["symbol", "date"])?;
    Ok(quotes
        .clone()
        .lazy()
        .select([col("symbol"), col("date")])
        .sort(["symbol", "date"], Default::default()))
}

/// Left-join one computed column onto the running table.
fn join_column(table: LazyFrame, column: LazyFrame) -> LazyFrame {
    table.join(
        column,
        [col("symbol"), col("date")],
        [col("symbol"), col("date")],
        JoinArgs::new(JoinType::Left),
    )
}

/// Move `date` in front of `symbol` and restore `(symbol, date)` order.
fn finish(table: LazyFrame, names: &[String]) -> Result<DataFrame> {
    let mut columns = vec![col("date"), col("symbol")];
    columns.extend(names.iter().map(|n| col(n.as_str())));
    Ok(table
        .select(columns)
        .sort(["symbol", "date"], Default::default())
        .collect()?)
}

/// An ordered collection of features that builds a features table.
#[derive(Debug, Default)]
pub struct FeatureSet {
    features: Vec<Box<dyn Feature>>,
}

impl FeatureSet {
    /// An empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Momentum, trend, volatility, volume and range features.
    pub fn standard() -> Self {
        let features: Vec<Box<dyn Feature>> = vec![
            Box::new(PriceChange::new(1)),
            Box::new(PriceChange::new(5)),
            Box::new(PriceChange::new(20)),
            Box::new(MovingAverageRatio::new(20)),
            Box::new(RollingVolatility::new(20)),
            Box::new(RelativeVolume::new(20)),
            Box::new(IntradayRange),
            Box::new(LogVolume),
        ];
        Self { features }
    }

    /// Features parsed from their column names.
    pub fn from_names<S: AsRef<str>>(names: &[S]) -> Result<Self> {
        let mut set = Self::new();
        for name in names {
            set.push(crate::registry::parse_feature(name.as_ref())?)?;
        }
        Ok(set)
    }

    /// Append a feature, rejecting duplicate column names.
    pub fn push(&mut self, feature: Box<dyn Feature>) -> Result<()> {
        if self.features.iter().any(|f| f.name() == feature.name()) {
            return Err(FeatureError::DuplicateColumn(feature.name().to_string()));
        }
        self.features.push(feature);
        Ok(())
    }

    /// Builder form of [`FeatureSet::push`].
    pub fn with(mut self, feature: Box<dyn Feature>) -> Result<Self> {
        self.push(feature)?;
        Ok(self)
    }

    /// Column names in table order.
    pub fn names(&self) -> Vec<String> {
        self.features.iter().map(|f| f.name().to_string()).collect()
    }

    /// Largest lookback among the features.
    pub fn max_lookback(&self) -> usize {
        self.features.iter().map(|f| f.lookback()).max().unwrap_or(0)
    }

    /// Number of features.
    pub fn len(&self) -> usize {
        self.features.len()
    }

    /// True when the set holds no features.
    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Iterate over the features.
    pub fn iter(&self) -> impl Iterator<Item = &dyn Feature> {
        self.features.iter().map(|f| f.as_ref())
    }

    /// Build the features table `[date, symbol, f1, ..., fk]`.
    pub fn build(&self, quotes: &DataFrame) -> Result<DataFrame> {
        let mut table = keys(quotes)?;
        for feature in &self.features {
            require_columns(quotes, feature.required_columns())?;
            let column = feature.compute(quotes.clone().lazy())?;
            table = join_column(table, column);
        }

        let df = finish(table, &self.names())?;
        tracing::debug!(rows = df.height(), features = self.len(), "built features table");
        Ok(df)
    }
}

/// An ordered collection of outcomes that builds an outcomes table.
#[derive(Debug, Default)]
pub struct OutcomeSet {
    outcomes: Vec<Box<dyn Outcome>>,
}

impl OutcomeSet {
    /// An empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Forward returns at 1, 5 and 20 sessions plus `up_fwd_5d`.
    pub fn standard() -> Self {
        let outcomes: Vec<Box<dyn Outcome>> = vec![
            Box::new(ForwardReturn::new(1)),
            Box::new(ForwardReturn::new(5)),
            Box::new(ForwardReturn::new(20)),
            Box::new(ForwardDirection::new(5)),
        ];
        Self { outcomes }
    }

    /// Outcomes parsed from their column names.
    pub fn from_names<S: AsRef<str>>(names: &[S]) -> Result<Self> {
        let mut set = Self::new();
        for name in names {
            set.push(crate::registry::parse_outcome(name.as_ref())?)?;
        }
        Ok(set)
    }

    /// Append an outcome, rejecting duplicate column names.
    pub fn push(&mut self, outcome: Box<dyn Outcome>) -> Result<()> {
        if self.outcomes.iter().any(|o| o.name() == outcome.name()) {
            return Err(FeatureError::DuplicateColumn(outcome.name().to_string()));
        }
        self.outcomes.push(outcome);
        Ok(())
    }

    /// Builder form of [`OutcomeSet::push`].
    pub fn with(mut self, outcome: Box<dyn Outcome>) -> Result<Self> {
        self.push(outcome)?;
        Ok(self)
    }

    /// Column names in table order.
    pub fn names(&self) -> Vec<String> {
        self.outcomes.iter().map(|o| o.name().to_string()).collect()
    }

    /// Largest horizon among the outcomes.
    pub fn max_horizon(&self) -> usize {
        self.outcomes.iter().map(|o| o.horizon()).max().unwrap_or(0)
    }

    /// Number of outcomes.
    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    /// True when the set holds no outcomes.
    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    /// Iterate over the outcomes.
    pub fn iter(&self) -> impl Iterator<Item = &dyn Outcome> {
        self.outcomes.iter().map(|o| o.as_ref())
    }

    /// Build the outcomes table `[date, symbol, o1, ..., om]`.
    pub fn build(&self, quotes: &DataFrame) -> Result<DataFrame> {
        let mut table = keys(quotes)?;
        for outcome in &self.outcomes {
            require_columns(quotes, outcome.required_columns())?;
            let column = outcome.compute(quotes.clone().lazy())?;
            table = join_column(table, column);
        }

        let df = finish(table, &self.names())?;
        tracing::debug!(rows = df.height(), outcomes = self.len(), "built outcomes table");
        Ok(df)
    }
}
