#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/darwin/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod dataset;
pub mod error;
pub mod pipeline;
pub mod universe;

// Re-export member crates
pub use darwin_data as data;
pub use darwin_features as features;
pub use darwin_models as models;
pub use darwin_output as output;

pub use dataset::{AlignedDataset, AlignmentCheck, FeatureMatrix, align, feature_matrix, verify_alignment};
pub use error::{DatasetError, PipelineError};
pub use pipeline::{Pipeline, PipelineConfig, PipelineReport};
pub use universe::{Constituent, DefaultUniverse, GicsSector, ListUniverse, Universe};

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
