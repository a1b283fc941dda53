#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/darwin/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod audit;
pub mod error;
pub mod features;
pub mod master;
pub mod outcomes;
pub mod registry;
pub mod table;
pub mod traits;

pub use audit::{AuditMismatch, AuditReport, MismatchKind, audit_feature, audit_outcome};
pub use error::{FeatureError, Result};
pub use master::MasterTable;
pub use registry::{
    ColumnInfo, ColumnKind, available_features, available_outcomes, get_column_info,
    parse_feature, parse_outcome,
};
pub use table::{FeatureSet, OutcomeSet};
pub use traits::{Configurable, Feature, Outcome};
