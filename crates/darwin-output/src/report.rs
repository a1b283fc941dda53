//! Run reports.

use crate::export::{ExportError, FeatureImportance, PredictionRecord};
use chrono::{DateTime, NaiveDate, Utc};
use darwin_models::RegressionMetrics;
use serde::{Deserialize, Serialize};
use std::fmt::Write;

/// Summary of one train/evaluate/predict run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    /// Report generation timestamp.
    pub timestamp: DateTime<Utc>,

    /// Model name.
    pub model: String,

    /// Outcome column the model was trained on.
    pub outcome: String,

    /// Feature columns in matrix order.
    pub features: Vec<String>,

    /// Number of symbols in the universe.
    pub symbols: usize,

    /// First date of the test period.
    pub split_date: Option<NaiveDate>,

    /// Training rows.
    pub train_samples: usize,

    /// Test rows.
    pub test_samples: usize,

    /// In-sample metrics.
    pub train_metrics: Option<RegressionMetrics>,

    /// Out-of-sample metrics.
    pub test_metrics: Option<RegressionMetrics>,

    /// Feature importances, strongest first.
    pub importances: Vec<FeatureImportance>,

    /// Predictions for the most recent session, highest first.
    pub latest_predictions: Vec<PredictionRecord>,
}

impl RunReport {
    /// Create an empty report for a model and outcome.
    pub fn new(model: impl Into<String>, outcome: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            model: model.into(),
            outcome: outcome.into(),
            features: Vec::new(),
            symbols: 0,
            split_date: None,
            train_samples: 0,
            test_samples: 0,
            train_metrics: None,
            test_metrics: None,
            importances: Vec::new(),
            latest_predictions: Vec::new(),
        }
    }

    /// Keep the predictions of the latest date in `records`, highest first.
    pub fn with_latest_predictions(mut self, records: &[PredictionRecord]) -> Self {
        let latest = records.iter().map(|r| r.date).max();
        let mut selected: Vec<PredictionRecord> = records
            .iter()
            .filter(|r| Some(r.date) == latest)
            .cloned()
            .collect();
        selected.sort_by(|a, b| b.predicted.total_cmp(&a.predicted));
        self.latest_predictions = selected;
        self
    }

    /// Convert report to a JSON string.
    pub fn to_json(&self) -> Result<String, ExportError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Plain text rendering for terminals.
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "Darwin run: {} -> {}", self.model, self.outcome);
        let _ = writeln!(out, "{}", "=".repeat(40));
        let _ = writeln!(out, "Symbols:   {}", self.symbols);
        let _ = writeln!(out, "Features:  {}", self.features.join(", "));
        if let Some(date) = self.split_date {
            let _ = writeln!(out, "Split:     test from {}", date);
        }
        let _ = writeln!(
            out,
            "Samples:   {} train / {} test",
            self.train_samples, self.test_samples
        );

        for (label, metrics) in [("Train", &self.train_metrics), ("Test", &self.test_metrics)] {
            if let Some(m) = metrics {
                let _ = writeln!(
                    out,
                    "{:5}      R2 {:>8.4}  IC {:>7.4}  rank IC {:>7.4}  hit {:>5.1}%  RMSE {:.6}",
                    label,
                    m.r2,
                    m.ic,
                    m.rank_ic,
                    m.hit_rate * 100.0,
                    m.rmse
                );
            }
        }

        if !self.importances.is_empty() {
            let _ = writeln!(out, "\nFeature importance:");
            for item in &self.importances {
                let _ = writeln!(out, "  {:20} {:.4}", item.feature, item.importance);
            }
        }

        if !self.latest_predictions.is_empty() {
            let _ = writeln!(
                out,
                "\nLatest predictions ({}):",
                self.latest_predictions[0].date
            );
            for record in &self.latest_predictions {
                let _ = writeln!(out, "  {:8} {:>+10.5}", record.symbol, record.predicted);
            }
        }
        out
    }

    /// Markdown rendering with metric and prediction tables.
    pub fn to_markdown(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "# Darwin run: `{}` on `{}`\n", self.model, self.outcome);
        let _ = writeln!(out, "- Generated: {}", self.timestamp.format("%Y-%m-%d %H:%M UTC"));
        let _ = writeln!(out, "- Symbols: {}", self.symbols);
        let _ = writeln!(out, "- Features: {}", self.features.join(", "));
        if let Some(date) = self.split_date {
            let _ = writeln!(out, "- Test period starts: {}", date);
        }
        let _ = writeln!(
            out,
            "- Samples: {} train / {} test\n",
            self.train_samples, self.test_samples
        );

        let _ = writeln!(out, "| Set | N | R² | IC | Rank IC | Hit rate | RMSE |");
        let _ = writeln!(out, "|-----|---|----|----|---------|----------|------|");
        for (label, metrics) in [("Train", &self.train_metrics), ("Test", &self.test_metrics)] {
            if let Some(m) = metrics {
                let _ = writeln!(
                    out,
                    "| {} | {} | {:.4} | {:.4} | {:.4} | {:.1}% | {:.6} |",
                    label,
                    m.n_samples,
                    m.r2,
                    m.ic,
                    m.rank_ic,
                    m.hit_rate * 100.0,
                    m.rmse
                );
            }
        }

        if !self.latest_predictions.is_empty() {
            let _ = writeln!(out, "\n## Latest predictions\n");
            let _ = writeln!(out, "| Date | Symbol | Predicted |");
            let _ = writeln!(out, "|------|--------|-----------|");
            for record in &self.latest_predictions {
                let _ = writeln!(
                    out,
                    "| {} | {} | {:+.5} |",
                    record.date, record.symbol, record.predicted
                );
            }
        }
        out
    }
}
