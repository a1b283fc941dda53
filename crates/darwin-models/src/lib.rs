#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/darwin/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod error;
pub mod forest;
pub mod kind;
pub mod linear;
pub mod metrics;
pub mod traits;
pub mod tree;

pub use error::{ModelError, Result};
pub use forest::{ForestConfig, RandomForest};
pub use kind::ModelKind;
pub use linear::LinearRegression;
pub use metrics::RegressionMetrics;
pub use traits::Regressor;
pub use tree::{DecisionTree, TreeConfig};
