//! Lookahead audit.
//!
//! A feature is causal if truncating history at a cutoff does not change
//! any of its values on or before the cutoff. An outcome is causal in the
//! opposite sense: the last `horizon` rows before the cutoff must be null
//! because their future has not been observed, and every earlier row must
//! match the full-history value.

use crate::error::Result;
use crate::table::require_columns;
use crate::traits::{Feature, Outcome};
use chrono::NaiveDate;
use darwin_data::frame::{column_dates, column_f64, column_strings, on_or_before};
use polars::prelude::*;
use serde::Serialize;

/// Relative tolerance when comparing recomputed values.
const TOLERANCE: f64 = 1e-9;

/// Why a row failed the audit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MismatchKind {
    /// Truncating history changed the value
    ValueChanged,
    /// An outcome had a value although its future lies past the cutoff
    UnobservedFuture,
}

/// A row that failed the audit
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuditMismatch {
    /// Symbol of the row
    pub symbol: String,
    /// Date of the row
    pub date: NaiveDate,
    /// Value computed on full history
    pub full: Option<f64>,
    /// Value computed on truncated history
    pub truncated: Option<f64>,
    /// Failure kind
    pub kind: MismatchKind,
}

/// Result of auditing one column at one cutoff
#[derive(Debug, Clone, Serialize)]
pub struct AuditReport {
    /// Audited column
    pub column: String,
    /// History was truncated after this date
    pub cutoff: NaiveDate,
    /// Rows compared
    pub rows_checked: usize,
    /// Rows that failed
    pub mismatches: Vec<AuditMismatch>,
}

impl AuditReport {
    /// True when no row failed.
    pub fn is_clean(&self) -> bool {
        self.mismatches.is_empty()
    }
}

/// One row of the full/truncated comparison.
struct Row {
    symbol: String,
    date: NaiveDate,
    full: Option<f64>,
    truncated: Option<f64>,
}

impl Row {
    fn agrees(&self) -> bool {
        match (self.full, self.truncated) {
            (None, None) => true,
            (Some(a), Some(b)) if a.is_nan() && b.is_nan() => true,
            (Some(a), Some(b)) => (a - b).abs() <= TOLERANCE * (1.0 + a.abs()),
            _ => false,
        }
    }

    fn mismatch(self, kind: MismatchKind) -> AuditMismatch {
        AuditMismatch {
            symbol: self.symbol,
            date: self.date,
            full: self.full,
            truncated: self.truncated,
            kind,
        }
    }
}

/// Compute a column on full and truncated history and pair the values on
/// rows dated on or before the cutoff, sorted by `(symbol, date)`.
fn compare<F>(name: &str, quotes: &DataFrame, cutoff: NaiveDate, compute: F) -> Result<Vec<Row>>
where
    F: Fn(LazyFrame) -> Result<LazyFrame>,
{
    require_columns(quotes, &["symbol", "date"])?;

    let full = compute(quotes.clone().lazy())?
        .filter(on_or_before(cutoff))
        .select([col("symbol"), col("date"), col(name).alias("full")]);
    let truncated = compute(quotes.clone().lazy().filter(on_or_before(cutoff)))?
        .select([col("symbol"), col("date"), col(name).alias("truncated")]);

    let joined = truncated
        .join(
            full,
            [col("symbol"), col("date")],
            [col("symbol"), col("date")],
            JoinArgs::new(JoinType::Left),
        )
        .sort(["symbol", "date"], Default::default())
        .collect()?;

    let symbols = column_strings(&joined, "symbol")?;
    let dates = column_dates(&joined, "date")?;
    let full = column_f64(&joined, "full")?;
    let truncated = column_f64(&joined, "truncated")?;

    let rows = symbols
        .into_iter()
        .zip(dates)
        .zip(full.into_iter().zip(truncated))
        .filter_map(|((symbol, date), (full, truncated))| {
            Some(Row {
                symbol: symbol?,
                date: date?,
                full,
                truncated,
            })
        })
        .collect();
    Ok(rows)
}

/// Audit a feature by truncating history at `cutoff`.
pub fn audit_feature(
    feature: &dyn Feature,
    quotes: &DataFrame,
    cutoff: NaiveDate,
) -> Result<AuditReport> {
    let rows = compare(feature.name(), quotes, cutoff, |lf| feature.compute(lf))?;
    let rows_checked = rows.len();

    let mismatches = rows
        .into_iter()
        .filter(|row| !row.agrees())
        .map(|row| row.mismatch(MismatchKind::ValueChanged))
        .collect();

    Ok(AuditReport {
        column: feature.name().to_string(),
        cutoff,
        rows_checked,
        mismatches,
    })
}

/// Audit an outcome by truncating history at `cutoff`.
pub fn audit_outcome(
    outcome: &dyn Outcome,
    quotes: &DataFrame,
    cutoff: NaiveDate,
) -> Result<AuditReport> {
    let rows = compare(outcome.name(), quotes, cutoff, |lf| outcome.compute(lf))?;
    let rows_checked = rows.len();
    let horizon = outcome.horizon();

    // Rows are grouped by symbol; count each symbol's rows to find its tail
    let mut counts: Vec<usize> = Vec::new();
    let mut previous: Option<&str> = None;
    for row in &rows {
        if previous == Some(row.symbol.as_str()) {
            if let Some(last) = counts.last_mut() {
                *last += 1;
            }
        } else {
            counts.push(1);
        }
        previous = Some(row.symbol.as_str());
    }

    let mut mismatches = Vec::new();
    let mut rows = rows.into_iter();
    for count in counts {
        let observed = count.saturating_sub(horizon);
        for (i, row) in rows.by_ref().take(count).enumerate() {
            if i >= observed {
                if row.truncated.is_some() {
                    mismatches.push(row.mismatch(MismatchKind::UnobservedFuture));
                }
            } else if !row.agrees() {
                mismatches.push(row.mismatch(MismatchKind::ValueChanged));
            }
        }
    }

    if !mismatches.is_empty() {
        tracing::warn!(
            column = outcome.name(),
            %cutoff,
            mismatches = mismatches.len(),
            "outcome failed lookahead audit"
        );
    }

    Ok(AuditReport {
        column: outcome.name().to_string(),
        cutoff,
        rows_checked,
        mismatches,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FeatureError;
    use crate::features::testing::{frame, quotes};
    use crate::features::{MovingAverageRatio, PriceChange, RollingVolatility};
    use crate::outcomes::{ForwardDirection, ForwardReturn, ForwardVolatility};

    fn sample() -> DataFrame {
        let a: Vec<f64> = (0..40).map(|i| 100.0 + (i as f64 * 0.7).sin() * 5.0).collect();
        let b: Vec<f64> = (0..40).map(|i| 50.0 + i as f64 * 0.3).collect();
        let mut rows = quotes("AAPL", &a);
        rows.extend(quotes("MSFT", &b));
        frame(rows)
    }

    fn cutoff() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 25).unwrap()
    }

    /// Centered moving average: peeks one session ahead.
    #[derive(Debug)]
    struct Centered;

    impl Feature for Centered {
        fn name(&self) -> &str {
            "centered"
        }

        fn lookback(&self) -> usize {
            1
        }

        fn required_columns(&self) -> &[&str] {
            &["symbol", "date", "adjusted_close"]
        }

        fn compute(&self, data: LazyFrame) -> Result<LazyFrame> {
            Ok(data
                .sort(["symbol", "date"], Default::default())
                .with_columns([((col("adjusted_close").shift(lit(1)).over([col("symbol")])
                    + col("adjusted_close").shift(lit(-1)).over([col("symbol")]))
                    / lit(2.0))
                .alias("centered")])
                .select([col("symbol"), col("date"), col("centered")]))
        }
    }

    /// Outcome that claims a one-session horizon but looks two ahead.
    #[derive(Debug)]
    struct Understated;

    impl Outcome for Understated {
        fn name(&self) -> &str {
            "understated"
        }

        fn horizon(&self) -> usize {
            1
        }

        fn required_columns(&self) -> &[&str] {
            &["symbol", "date", "adjusted_close"]
        }

        fn compute(&self, data: LazyFrame) -> Result<LazyFrame> {
            ForwardReturn::new(2)
                .compute(data)
                .map(|lf| lf.select([col("symbol"), col("date"), col("close_fwd_2d").alias("understated")]))
        }
    }

    #[test]
    fn test_causal_features_pass() {
        let df = sample();
        let features: Vec<Box<dyn Feature>> = vec![
            Box::new(PriceChange::new(5)),
            Box::new(MovingAverageRatio::new(10)),
            Box::new(RollingVolatility::new(10)),
        ];
        for feature in &features {
            let report = audit_feature(feature.as_ref(), &df, cutoff()).unwrap();
            assert_eq!(report.rows_checked, 50);
            assert!(report.is_clean(), "{} failed", report.column);
        }
    }

    #[test]
    fn test_lookahead_feature_flagged() {
        let report = audit_feature(&Centered, &sample(), cutoff()).unwrap();
        // The last row per symbol loses its future neighbour
        assert_eq!(report.mismatches.len(), 2);
        assert!(report
            .mismatches
            .iter()
            .all(|m| m.date == cutoff() && m.kind == MismatchKind::ValueChanged));
    }

    #[test]
    fn test_forward_outcomes_pass() {
        let df = sample();
        let outcomes: Vec<Box<dyn Outcome>> = vec![
            Box::new(ForwardReturn::new(5)),
            Box::new(ForwardDirection::new(3)),
            Box::new(ForwardVolatility::new(4)),
        ];
        for outcome in &outcomes {
            let report = audit_outcome(outcome.as_ref(), &df, cutoff()).unwrap();
            assert!(report.is_clean(), "{} failed", report.column);
        }
    }

    #[test]
    fn test_understated_horizon_flagged() {
        let report = audit_outcome(&Understated, &sample(), cutoff()).unwrap();
        // Row t-1 before the cutoff still has a value on full history but is
        // null on truncated history, which the audit sees as a changed value
        assert_eq!(report.mismatches.len(), 2);
        assert!(report
            .mismatches
            .iter()
            .all(|m| m.kind == MismatchKind::ValueChanged));
    }

    #[test]
    fn test_missing_key_column() {
        let df = sample().drop("symbol").unwrap();
        assert!(matches!(
            audit_feature(&PriceChange::new(1), &df, cutoff()),
            Err(FeatureError::MissingColumn(_))
        ));
    }
}
