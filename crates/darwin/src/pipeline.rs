//! End-to-end runs.
//!
//! A run builds the features and outcomes tables from one quote frame,
//! aligns them, fits a model on the earlier dates, evaluates it on the
//! later dates, then refits on every aligned row and predicts the most
//! recent session, whose outcome is not yet observed.

use crate::dataset::{AlignmentCheck, align, feature_matrix, verify_alignment};
use crate::error::PipelineError;
use crate::universe::{DefaultUniverse, ListUniverse, Universe};
use chrono::NaiveDate;
use darwin_data::frame;
use darwin_features::{FeatureSet, MasterTable, Outcome, OutcomeSet, parse_outcome};
use darwin_models::{ForestConfig, ModelKind, RegressionMetrics};
use darwin_output::{FeatureImportance, PredictionRecord, RunReport};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::Path;

type Result<T> = std::result::Result<T, PipelineError>;

/// Settings of one run, loadable from JSON. Missing keys take defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Symbols to fetch and model
    pub symbols: Vec<String>,
    /// Years of history to fetch
    pub years: u32,
    /// Feature column names; the standard set when empty
    pub features: Vec<String>,
    /// Outcome column to predict
    pub outcome: String,
    /// Regressor to fit
    pub model: ModelKind,
    /// Tree and forest settings
    pub forest: ForestConfig,
    /// Share of dates used for training
    pub train_fraction: f64,
    /// Training dates dropped before the split; the outcome horizon when unset
    pub purge: Option<usize>,
    /// Add sector indicator columns from the master table
    pub include_sectors: bool,
    /// Cutoffs at which the causality audit runs; zero disables it
    pub audit_samples: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            symbols: DefaultUniverse.symbols(),
            years: 5,
            features: Vec::new(),
            outcome: "close_fwd_5d".to_string(),
            model: ModelKind::default(),
            forest: ForestConfig::default(),
            train_fraction: 0.8,
            purge: None,
            include_sectors: false,
            audit_samples: 3,
        }
    }
}

impl PipelineConfig {
    /// Parse a JSON document.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read a JSON file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Check ranges and resolve every column name.
    pub fn validate(&self) -> Result<()> {
        if self.symbols.is_empty() {
            return Err(PipelineError::Config("symbols must not be empty".to_string()));
        }
        if self.years == 0 {
            return Err(PipelineError::Config("years must be positive".to_string()));
        }
        if !(self.train_fraction > 0.0 && self.train_fraction < 1.0) {
            return Err(PipelineError::Config(format!(
                "train_fraction must lie strictly between 0 and 1, got {}",
                self.train_fraction
            )));
        }
        if self.forest.n_trees == 0 {
            return Err(PipelineError::Config("forest.n_trees must be positive".to_string()));
        }
        self.feature_set()?;
        self.outcome_column()?;
        Ok(())
    }

    /// The configured features.
    pub fn feature_set(&self) -> Result<FeatureSet> {
        if self.features.is_empty() {
            Ok(FeatureSet::standard())
        } else {
            Ok(FeatureSet::from_names(&self.features)?)
        }
    }

    /// The configured outcome.
    pub fn outcome_column(&self) -> Result<Box<dyn Outcome>> {
        Ok(parse_outcome(&self.outcome)?)
    }

    /// The configured symbols as a universe.
    pub fn universe(&self) -> ListUniverse {
        ListUniverse::new(&self.symbols)
    }

    /// First date to fetch for a run ending on `end`.
    pub fn start_date(&self, end: NaiveDate) -> NaiveDate {
        end - chrono::Duration::days(365 * i64::from(self.years))
    }
}

/// Everything a run produced.
#[derive(Debug, Clone)]
pub struct PipelineReport {
    /// Summary for display and export
    pub run: RunReport,
    /// Out-of-sample predictions with realised outcomes
    pub test_predictions: Vec<PredictionRecord>,
    /// Predictions for the latest session, outcomes unknown
    pub latest_predictions: Vec<PredictionRecord>,
    /// Causality audit, when enabled
    pub audit: Option<AlignmentCheck>,
}

/// Train, evaluate and predict from a quote frame.
#[derive(Debug, Clone)]
pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    /// Create a pipeline from a validated configuration.
    pub fn new(config: PipelineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// The active configuration.
    pub const fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Build the features table, with sector indicators when configured.
    pub fn features_table(&self, quotes: &DataFrame, master: Option<&MasterTable>) -> Result<DataFrame> {
        let table = self.config.feature_set()?.build(quotes)?;
        match master {
            Some(master) if self.config.include_sectors => sector_columns(master, &table),
            _ => Ok(table),
        }
    }

    /// Build the outcomes table for the configured outcome.
    pub fn outcomes_table(&self, quotes: &DataFrame) -> Result<DataFrame> {
        let outcomes = OutcomeSet::new().with(self.config.outcome_column()?)?;
        Ok(outcomes.build(quotes)?)
    }

    /// Run the pipeline.
    ///
    /// Fails with [`PipelineError::Lookahead`] when the audit finds a
    /// feature or outcome reading data it should not see.
    pub fn run(&self, quotes: &DataFrame, master: Option<&MasterTable>) -> Result<PipelineReport> {
        let config = &self.config;
        let outcome = config.outcome_column()?;

        let audit = if config.audit_samples > 0 {
            let check = verify_alignment(
                quotes,
                &config.feature_set()?,
                outcome.as_ref(),
                config.audit_samples,
            )?;
            if let Some(failed) = check.failures().next() {
                return Err(PipelineError::Lookahead {
                    column: failed.column.clone(),
                    mismatches: failed.mismatches.len(),
                });
            }
            Some(check)
        } else {
            None
        };

        let features = self.features_table(quotes, master)?;
        let outcomes = self.outcomes_table(quotes)?;
        let dataset = align(&features, &outcomes, outcome.name())?;

        let split_date = dataset.split_fraction(config.train_fraction)?;
        let gap = config.purge.unwrap_or_else(|| outcome.horizon());
        let (train, test) = dataset.purged_split(split_date, gap)?;

        let mut model = config.model.build(&config.forest);
        model.fit(&train.x, &train.y)?;
        let train_pred = model.predict(&train.x)?;
        let test_pred = model.predict(&test.x)?;
        let train_metrics = RegressionMetrics::calculate(&train.y, &train_pred)?;
        let test_metrics = RegressionMetrics::calculate(&test.y, &test_pred)?;
        tracing::info!(
            model = model.name(),
            train = train.len(),
            test = test.len(),
            test_r2 = test_metrics.r2,
            test_ic = test_metrics.ic,
            "evaluated model"
        );

        // Refit on all aligned rows before predicting the unobserved session
        let mut model = config.model.build(&config.forest);
        model.fit(&dataset.x, &dataset.y)?;
        let latest = feature_matrix(&features)?.latest();
        let latest_predictions = if latest.is_empty() {
            Vec::new()
        } else {
            latest.to_records(&model.predict(&latest.x)?)
        };

        let mut importances: Vec<FeatureImportance> = model
            .feature_importances()
            .map(|values| {
                dataset
                    .feature_names
                    .iter()
                    .zip(values)
                    .map(|(feature, importance)| FeatureImportance {
                        feature: feature.clone(),
                        importance,
                    })
                    .collect()
            })
            .unwrap_or_default();
        importances.sort_by(|a, b| b.importance.total_cmp(&a.importance));

        let mut run = RunReport::new(model.name(), outcome.name()).with_latest_predictions(&latest_predictions);
        run.features = dataset.feature_names.clone();
        run.symbols = frame::symbols(quotes)?.len();
        run.split_date = Some(split_date);
        run.train_samples = train.len();
        run.test_samples = test.len();
        run.train_metrics = Some(train_metrics);
        run.test_metrics = Some(test_metrics);
        run.importances = importances;

        Ok(PipelineReport {
            run,
            test_predictions: test.to_records(&test_pred),
            latest_predictions,
            audit,
        })
    }
}

/// Attach sector indicators, dropping the first as the reference level.
///
/// Symbols absent from the master table get zeros.
fn sector_columns(master: &MasterTable, table: &DataFrame) -> Result<DataFrame> {
    let codes = master.sector_codes();
    let joined = master.attach_sector_dummies(table)?;
    let names: Vec<String> = codes.iter().map(|c| format!("sector_{}", c)).collect();

    let mut lf = joined.lazy().with_columns(
        names
            .iter()
            .map(|n| col(n.as_str()).fill_null(lit(0.0)))
            .collect::<Vec<_>>(),
    );
    if let Some(reference) = names.first() {
        lf = lf.drop([reference.as_str()]);
    }
    Ok(lf.collect()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = PipelineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.symbols.len(), 33);
        assert_eq!(config.feature_set().unwrap().len(), FeatureSet::standard().len());
    }

    #[test]
    fn test_partial_json_takes_defaults() {
        let config = PipelineConfig::from_json_str(
            r#"{"symbols": ["AAPL", "MSFT"], "model": "forest", "forest": {"n_trees": 10}}"#,
        )
        .unwrap();

        assert_eq!(config.symbols, vec!["AAPL", "MSFT"]);
        assert_eq!(config.model, ModelKind::Forest);
        assert_eq!(config.forest.n_trees, 10);
        assert_eq!(config.forest.max_depth, 10);
        assert_eq!(config.outcome, "close_fwd_5d");
        assert_eq!(config.train_fraction, 0.8);
    }

    #[test]
    fn test_invalid_configs() {
        let bad = [
            r#"{"symbols": []}"#,
            r#"{"train_fraction": 1.5}"#,
            r#"{"outcome": "close_chg_5d"}"#,
            r#"{"outcome": "vol_fwd_1d"}"#,
            r#"{"features": ["nonsense_3d"]}"#,
            r#"{"years": 0}"#,
        ];
        for json in bad {
            assert!(PipelineConfig::from_json_str(json).is_err(), "{}", json);
        }
        assert!(matches!(
            PipelineConfig::from_json_str("{not json"),
            Err(PipelineError::Json(_))
        ));
    }

    #[test]
    fn test_sector_columns_drop_reference_and_zero_unknowns() {
        let master = MasterTable::from_records(&[
            darwin_data::SecurityRecord::new("XOM").with_sector_code(10),
            darwin_data::SecurityRecord::new("AAPL").with_sector_code(45),
        ]);
        let table = df!(
            "symbol" => ["AAPL", "XOM", "TSLA"],
            "f1" => [1.0, 2.0, 3.0],
        )
        .unwrap();

        let out = sector_columns(&master, &table).unwrap();
        let names: Vec<String> = out.get_column_names().iter().map(|c| c.to_string()).collect();
        assert_eq!(names, vec!["symbol", "f1", "sector_45"]);

        let symbols = frame::column_strings(&out, "symbol").unwrap();
        let it = frame::column_f64(&out, "sector_45").unwrap();
        for (symbol, value) in symbols.iter().zip(it) {
            let expected = if symbol.as_deref() == Some("AAPL") { 1.0 } else { 0.0 };
            assert_eq!(value, Some(expected), "{:?}", symbol);
        }
    }

    #[test]
    fn test_start_date() {
        let config = PipelineConfig {
            years: 2,
            ..Default::default()
        };
        let end = NaiveDate::from_ymd_opt(2024, 6, 30).unwrap();
        assert_eq!(config.start_date(end), NaiveDate::from_ymd_opt(2022, 7, 1).unwrap());
    }
}
