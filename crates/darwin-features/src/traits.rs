//! Core traits for table columns.
//!
//! Both traits take a quote frame (see `darwin_data::frame::QUOTE_COLUMNS`)
//! as a `LazyFrame` and return `[symbol, date, <name>]`. They differ only in
//! which direction in time they are allowed to look.

use crate::error::Result;
use polars::prelude::LazyFrame;
use std::fmt::Debug;

/// A predictor known at the end of its row's session.
///
/// The value on the row dated `d` may only depend on rows of the same
/// symbol dated on or before `d`.
pub trait Feature: Debug + Send + Sync {
    /// Output column name.
    fn name(&self) -> &str;

    /// Number of prior sessions needed before the first non-null value.
    fn lookback(&self) -> usize;

    /// Quote columns read by this feature.
    fn required_columns(&self) -> &[&str];

    /// Compute `[symbol, date, <name>]` for every input row.
    fn compute(&self, data: LazyFrame) -> Result<LazyFrame>;
}

/// A target observed after its row's session.
///
/// The value on the row dated `d` reads the session `d` itself, usually its
/// close as the base, plus the next [`Outcome::horizon`] sessions, and
/// nothing later. It is therefore known only after the window closes. The
/// last `horizon` rows of each symbol are null because their window has not
/// been observed.
pub trait Outcome: Debug + Send + Sync {
    /// Output column name.
    fn name(&self) -> &str;

    /// Number of sessions into the future the outcome spans.
    fn horizon(&self) -> usize;

    /// Quote columns read by this outcome.
    fn required_columns(&self) -> &[&str];

    /// Compute `[symbol, date, <name>]` for every input row.
    fn compute(&self, data: LazyFrame) -> Result<LazyFrame>;
}

/// Columns parameterised by a serde-friendly configuration.
pub trait Configurable: Sized {
    /// Configuration type.
    type Config: Clone + Default;

    /// Construct from a configuration.
    fn with_config(config: Self::Config) -> Self;

    /// The active configuration.
    fn config(&self) -> &Self::Config;
}
