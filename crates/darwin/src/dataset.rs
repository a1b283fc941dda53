//! Aligned training matrices.
//!
//! The features table and the outcomes table meet only here. [`align`]
//! inner-joins them on `(date, symbol)`, keeps the feature columns and one
//! outcome column, and drops every row with a missing or non-finite value:
//! warm-up rows at the start of each symbol's history and the unobserved
//! tail at its end disappear by omission.

use crate::error::DatasetError;
use chrono::NaiveDate;
use darwin_data::frame::{column_dates, column_f64, column_strings};
use darwin_features::{AuditReport, FeatureError, FeatureSet, Outcome, audit_feature, audit_outcome};
use darwin_output::PredictionRecord;
use ndarray::{Array1, Array2};
use polars::prelude::*;

type Result<T> = std::result::Result<T, DatasetError>;

/// Key columns shared by the features and outcomes tables.
const KEYS: [&str; 2] = ["date", "symbol"];

/// Features and one outcome, row-aligned on `(date, symbol)`.
///
/// Rows are sorted by date, then symbol.
#[derive(Debug, Clone)]
pub struct AlignedDataset {
    /// Row keys
    pub keys: Vec<(NaiveDate, String)>,
    /// Feature names in column order
    pub feature_names: Vec<String>,
    /// Outcome column
    pub target_name: String,
    /// Feature matrix, one row per key
    pub x: Array2<f64>,
    /// Outcome values, one per key
    pub y: Array1<f64>,
}

impl AlignedDataset {
    /// Number of rows.
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// True when there are no rows.
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Number of feature columns.
    pub fn n_features(&self) -> usize {
        self.feature_names.len()
    }

    /// Distinct dates, ascending.
    pub fn dates(&self) -> Vec<NaiveDate> {
        let mut dates: Vec<NaiveDate> = self.keys.iter().map(|(d, _)| *d).collect();
        dates.dedup();
        dates
    }

    /// Split into rows dated before `split_date` and rows dated on or after it.
    pub fn temporal_split(&self, split_date: NaiveDate) -> Result<(Self, Self)> {
        self.purged_split(split_date, 0)
    }

    /// Like [`temporal_split`](Self::temporal_split), but also drops the
    /// last `gap` training dates.
    ///
    /// A training row's outcome spans the sessions after its date; with
    /// `gap` equal to the outcome horizon no training outcome overlaps the
    /// test period.
    pub fn purged_split(&self, split_date: NaiveDate, gap: usize) -> Result<(Self, Self)> {
        let dates = self.dates();
        let first_test = dates.partition_point(|d| *d < split_date);
        let train_end = first_test.saturating_sub(gap);

        if train_end == 0 {
            return Err(DatasetError::InvalidSplit(format!(
                "no training dates before {} with a gap of {}",
                split_date, gap
            )));
        }
        if first_test == dates.len() {
            return Err(DatasetError::InvalidSplit(format!(
                "no test dates on or after {}",
                split_date
            )));
        }

        let train_cutoff = dates[train_end];
        let train: Vec<usize> = (0..self.len())
            .filter(|&i| self.keys[i].0 < train_cutoff)
            .collect();
        let test: Vec<usize> = (0..self.len())
            .filter(|&i| self.keys[i].0 >= split_date)
            .collect();

        tracing::debug!(
            train = train.len(),
            test = test.len(),
            purged = self.len() - train.len() - test.len(),
            %split_date,
            "split dataset"
        );
        Ok((self.select(&train), self.select(&test)))
    }

    /// The date at quantile `fraction` of the distinct dates.
    ///
    /// At least one date is left on each side.
    pub fn split_fraction(&self, fraction: f64) -> Result<NaiveDate> {
        if !(fraction > 0.0 && fraction < 1.0) {
            return Err(DatasetError::InvalidSplit(format!(
                "fraction must lie strictly between 0 and 1, got {}",
                fraction
            )));
        }
        let dates = self.dates();
        if dates.len() < 2 {
            return Err(DatasetError::InvalidSplit(format!(
                "need at least two dates, found {}",
                dates.len()
            )));
        }
        let index = ((dates.len() as f64 * fraction).floor() as usize).clamp(1, dates.len() - 1);
        Ok(dates[index])
    }

    /// Pair predictions with keys and realised outcomes.
    pub fn to_records(&self, predicted: &Array1<f64>) -> Vec<PredictionRecord> {
        self.keys
            .iter()
            .zip(predicted.iter().zip(self.y.iter()))
            .map(|((date, symbol), (p, y))| PredictionRecord::new(*date, symbol.clone(), *p, Some(*y)))
            .collect()
    }

    fn select(&self, rows: &[usize]) -> Self {
        Self {
            keys: rows.iter().map(|&i| self.keys[i].clone()).collect(),
            feature_names: self.feature_names.clone(),
            target_name: self.target_name.clone(),
            x: self.x.select(ndarray::Axis(0), rows),
            y: self.y.select(ndarray::Axis(0), rows),
        }
    }
}

/// Features for rows whose outcome may not be known yet.
#[derive(Debug, Clone)]
pub struct FeatureMatrix {
    /// Row keys, sorted by date then symbol
    pub keys: Vec<(NaiveDate, String)>,
    /// Feature names in column order
    pub feature_names: Vec<String>,
    /// Feature values
    pub x: Array2<f64>,
}

impl FeatureMatrix {
    /// Number of rows.
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// True when there are no rows.
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Rows of the most recent date only.
    pub fn latest(&self) -> Self {
        let latest = self.keys.iter().map(|(d, _)| *d).max();
        let rows: Vec<usize> = (0..self.len())
            .filter(|&i| Some(self.keys[i].0) == latest)
            .collect();
        Self {
            keys: rows.iter().map(|&i| self.keys[i].clone()).collect(),
            feature_names: self.feature_names.clone(),
            x: self.x.select(ndarray::Axis(0), &rows),
        }
    }

    /// Pair predictions with keys. Outcomes are unknown.
    pub fn to_records(&self, predicted: &Array1<f64>) -> Vec<PredictionRecord> {
        self.keys
            .iter()
            .zip(predicted.iter())
            .map(|((date, symbol), p)| PredictionRecord::new(*date, symbol.clone(), *p, None))
            .collect()
    }
}

/// Inner-join a features table with one outcome column.
///
/// Every column of `features` other than `date` and `symbol` is a feature.
pub fn align(features: &DataFrame, outcomes: &DataFrame, outcome_column: &str) -> Result<AlignedDataset> {
    require(features, &KEYS)?;
    require(outcomes, &KEYS)?;
    require(outcomes, &[outcome_column])?;

    let feature_names = feature_columns(features)?;
    if feature_names.iter().any(|n| n == outcome_column) {
        return Err(FeatureError::DuplicateColumn(outcome_column.to_string()).into());
    }

    let mut value_names = feature_names.clone();
    value_names.push(outcome_column.to_string());

    let target = outcomes
        .clone()
        .lazy()
        .select([col("date"), col("symbol"), col(outcome_column)]);
    let joined = features.clone().lazy().join(
        target,
        [col("date"), col("symbol")],
        [col("date"), col("symbol")],
        JoinArgs::new(JoinType::Inner),
    );
    let df = complete_rows(joined, &value_names).collect()?;

    if df.height() == 0 {
        return Err(DatasetError::Empty);
    }

    let keys = read_keys(&df)?;
    let x = read_matrix(&df, &feature_names)?;
    let y = Array1::from_vec(
        column_f64(&df, outcome_column)?
            .into_iter()
            .map(|v| v.unwrap_or(f64::NAN))
            .collect(),
    );

    tracing::debug!(
        rows = keys.len(),
        features = feature_names.len(),
        outcome = outcome_column,
        "aligned dataset"
    );
    Ok(AlignedDataset {
        keys,
        feature_names,
        target_name: outcome_column.to_string(),
        x,
        y,
    })
}

/// Rows of a features table with every feature present and finite.
pub fn feature_matrix(features: &DataFrame) -> Result<FeatureMatrix> {
    require(features, &KEYS)?;
    let feature_names = feature_columns(features)?;

    let df = complete_rows(features.clone().lazy(), &feature_names).collect()?;
    let keys = read_keys(&df)?;
    let x = read_matrix(&df, &feature_names)?;

    Ok(FeatureMatrix {
        keys,
        feature_names,
        x,
    })
}

/// Outcome of auditing every column of a run at several cutoffs.
#[derive(Debug, Clone, Default)]
pub struct AlignmentCheck {
    /// One report per column and cutoff
    pub reports: Vec<AuditReport>,
}

impl AlignmentCheck {
    /// True when every report is clean.
    pub fn is_clean(&self) -> bool {
        self.reports.iter().all(AuditReport::is_clean)
    }

    /// Reports with at least one failed row.
    pub fn failures(&self) -> impl Iterator<Item = &AuditReport> {
        self.reports.iter().filter(|r| !r.is_clean())
    }

    /// Rows compared across all reports.
    pub fn rows_checked(&self) -> usize {
        self.reports.iter().map(|r| r.rows_checked).sum()
    }
}

/// Audit each feature and the outcome at `samples` cutoffs spread evenly
/// over the dates of `quotes`.
pub fn verify_alignment(
    quotes: &DataFrame,
    features: &FeatureSet,
    outcome: &dyn Outcome,
    samples: usize,
) -> Result<AlignmentCheck> {
    let mut dates: Vec<NaiveDate> = column_dates(quotes, "date")?.into_iter().flatten().collect();
    dates.sort();
    dates.dedup();

    let mut check = AlignmentCheck::default();
    if dates.is_empty() {
        return Ok(check);
    }

    let mut cutoffs: Vec<NaiveDate> = (1..=samples)
        .map(|k| dates[(dates.len() * k / (samples + 1)).min(dates.len() - 1)])
        .collect();
    cutoffs.dedup();

    for cutoff in cutoffs {
        for feature in features.iter() {
            check.reports.push(audit_feature(feature, quotes, cutoff)?);
        }
        check.reports.push(audit_outcome(outcome, quotes, cutoff)?);
    }

    tracing::debug!(
        reports = check.reports.len(),
        rows = check.rows_checked(),
        clean = check.is_clean(),
        "verified alignment"
    );
    Ok(check)
}

fn require(df: &DataFrame, names: &[&str]) -> Result<()> {
    let present = df.get_column_names();
    match names.iter().find(|n| !present.iter().any(|c| c.as_str() == **n)) {
        Some(missing) => Err(DatasetError::MissingColumn(missing.to_string())),
        None => Ok(()),
    }
}

fn feature_columns(df: &DataFrame) -> Result<Vec<String>> {
    let names: Vec<String> = df
        .get_column_names()
        .into_iter()
        .map(|c| c.to_string())
        .filter(|c| !KEYS.contains(&c.as_str()))
        .collect();
    if names.is_empty() {
        return Err(DatasetError::NoFeatures);
    }
    Ok(names)
}

/// Cast value columns to `f64`, keep rows where all are finite, sort by `(date, symbol)`.
fn complete_rows(lf: LazyFrame, names: &[String]) -> LazyFrame {
    let casts: Vec<Expr> = names
        .iter()
        .map(|n| col(n.as_str()).cast(DataType::Float64))
        .collect();
    let finite = names
        .iter()
        .map(|n| col(n.as_str()).is_finite().fill_null(lit(false)))
        .reduce(|a, b| a.and(b))
        .unwrap_or_else(|| lit(true));

    lf.with_columns(casts)
        .filter(finite)
        .sort(["date", "symbol"], Default::default())
}

fn read_keys(df: &DataFrame) -> Result<Vec<(NaiveDate, String)>> {
    let dates = column_dates(df, "date")?;
    let symbols = column_strings(df, "symbol")?;
    dates
        .into_iter()
        .zip(symbols)
        .map(|(date, symbol)| match (date, symbol) {
            (Some(date), Some(symbol)) => Ok((date, symbol)),
            _ => Err(DatasetError::MissingColumn("date/symbol key".to_string())),
        })
        .collect()
}

fn read_matrix(df: &DataFrame, names: &[String]) -> Result<Array2<f64>> {
    let columns = names
        .iter()
        .map(|n| column_f64(df, n))
        .collect::<std::result::Result<Vec<_>, _>>()?;

    let mut values = Vec::with_capacity(df.height() * names.len());
    for row in 0..df.height() {
        values.extend(columns.iter().map(|c| c[row].unwrap_or(f64::NAN)));
    }
    Ok(Array2::from_shape_vec((df.height(), names.len()), values)?)
}
