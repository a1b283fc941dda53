//! Integration tests: synthetic quotes through the full pipeline.

use chrono::NaiveDate;
use darwin::data::frame::{QuoteRow, quotes_from_rows};
use darwin::features::MasterTable;
use darwin::models::{ForestConfig, ModelKind};
use darwin::{DefaultUniverse, ListUniverse, Pipeline, PipelineConfig, PipelineError, Universe, align};
use polars::prelude::DataFrame;
use rstest::rstest;

const SYMBOLS: [&str; 3] = ["AAPL", "XOM", "JPM"];

fn quotes(days: i64) -> DataFrame {
    let start = NaiveDate::from_ymd_opt(2023, 1, 2).unwrap();
    let rows: Vec<QuoteRow> = SYMBOLS
        .iter()
        .enumerate()
        .flat_map(|(k, symbol)| {
            (0..days).map(move |i| {
                let t = i as f64;
                let close = 50.0 * (1.0 + k as f64) + 4.0 * (t * 0.25 + k as f64).sin() + t * 0.05;
                QuoteRow {
                    symbol: symbol.to_string(),
                    date: start + chrono::Duration::days(i),
                    open: close * 0.998,
                    high: close * 1.012,
                    low: close * 0.988,
                    close,
                    volume: 2_000_000 + ((i * 37 + k as i64 * 11) % 13) as u64 * 40_000,
                    adjusted_close: close,
                }
            })
        })
        .collect();
    quotes_from_rows(&rows).unwrap()
}

fn config(model: ModelKind) -> PipelineConfig {
    PipelineConfig {
        symbols: SYMBOLS.iter().map(|s| s.to_string()).collect(),
        features: vec![
            "close_chg_1d".to_string(),
            "close_chg_5d".to_string(),
            "close_sma_10d".to_string(),
            "vol_10d".to_string(),
            "range_1d".to_string(),
        ],
        outcome: "close_fwd_5d".to_string(),
        model,
        forest: ForestConfig {
            n_trees: 8,
            max_depth: 5,
            ..Default::default()
        },
        audit_samples: 2,
        ..Default::default()
    }
}

#[rstest]
#[case(ModelKind::Linear)]
#[case(ModelKind::Tree)]
#[case(ModelKind::Forest)]
fn test_run_each_model(#[case] model: ModelKind) {
    let q = quotes(150);
    let pipeline = Pipeline::new(config(model)).unwrap();
    let report = pipeline.run(&q, None).unwrap();

    let run = &report.run;
    assert_eq!(run.model, model.as_str());
    assert_eq!(run.outcome, "close_fwd_5d");
    assert_eq!(run.symbols, 3);
    assert!(run.train_samples > run.test_samples);
    assert!(run.test_samples > 0);
    assert!(run.train_metrics.as_ref().unwrap().mse.is_finite());

    let split = run.split_date.unwrap();
    assert!(report.test_predictions.iter().all(|p| p.date >= split));
    assert!(report.test_predictions.iter().all(|p| p.actual.is_some()));
    assert_eq!(report.test_predictions.len(), run.test_samples);

    // Latest session has features but no observed outcome
    let last = NaiveDate::from_ymd_opt(2023, 1, 2).unwrap() + chrono::Duration::days(149);
    assert_eq!(report.latest_predictions.len(), 3);
    assert!(report.latest_predictions.iter().all(|p| p.date == last && p.actual.is_none()));
    assert_eq!(run.latest_predictions.len(), 3);

    assert!(report.audit.as_ref().unwrap().is_clean());

    match model {
        ModelKind::Linear => assert!(run.importances.is_empty()),
        _ => assert_eq!(run.importances.len(), 5),
    }
}

#[test]
fn test_training_rows_precede_purge_gap() {
    let q = quotes(150);
    let pipeline = Pipeline::new(config(ModelKind::Linear)).unwrap();
    let report = pipeline.run(&q, None).unwrap();

    let features = pipeline.features_table(&q, None).unwrap();
    let outcomes = pipeline.outcomes_table(&q).unwrap();
    let dataset = align(&features, &outcomes, "close_fwd_5d").unwrap();

    // Five dates are purged between the training and test periods
    assert_eq!(
        dataset.len(),
        report.run.train_samples + report.run.test_samples + 5 * SYMBOLS.len()
    );
}

#[test]
fn test_sector_indicators_from_universe() {
    let q = quotes(120);
    let universe = ListUniverse::new(&SYMBOLS);
    let master = MasterTable::from_records(&universe.security_records());

    let mut config = config(ModelKind::Linear);
    config.include_sectors = true;
    config.audit_samples = 0;
    let pipeline = Pipeline::new(config).unwrap();

    let features = pipeline.features_table(&q, Some(&master)).unwrap();
    // Energy (10) is the reference level; Financials (40) and IT (45) remain
    let names: Vec<String> = features.get_column_names().iter().map(|c| c.to_string()).collect();
    assert!(!names.contains(&"sector_10".to_string()));
    assert!(names.contains(&"sector_40".to_string()));
    assert!(names.contains(&"sector_45".to_string()));

    let report = pipeline.run(&q, Some(&master)).unwrap();
    assert_eq!(report.run.features.len(), 7);
    assert!(report.audit.is_none());
}

#[test]
fn test_too_little_history_is_an_error() {
    let q = quotes(12);
    let pipeline = Pipeline::new(config(ModelKind::Linear)).unwrap();
    assert!(matches!(
        pipeline.run(&q, None),
        Err(PipelineError::Dataset(_))
    ));
}

#[test]
fn test_default_universe_symbols_configure_a_run() {
    let config = PipelineConfig {
        symbols: DefaultUniverse.symbols(),
        ..Default::default()
    };
    assert!(Pipeline::new(config).is_ok());
}
