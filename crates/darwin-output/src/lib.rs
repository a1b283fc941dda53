#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/darwin/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod export;
pub mod frame;
pub mod report;

pub use export::{ExportError, ExportFormat, Exporter, FeatureImportance, PredictionRecord};
pub use frame::{write_frame_csv, write_frame_csv_file};
pub use report::RunReport;
