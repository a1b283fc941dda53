//! Model selection by name.

use crate::error::ModelError;
use crate::forest::{ForestConfig, RandomForest};
use crate::linear::LinearRegression;
use crate::traits::Regressor;
use crate::tree::{DecisionTree, TreeConfig};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Which regressor a run should fit
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelKind {
    /// Ordinary least squares with intercept
    #[default]
    Linear,
    /// Single CART tree
    Tree,
    /// Random forest
    Forest,
}

impl ModelKind {
    /// All kinds, in display order.
    pub const ALL: [Self; 3] = [Self::Linear, Self::Tree, Self::Forest];

    /// Lowercase name used in configs and on the command line.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Linear => "linear",
            Self::Tree => "tree",
            Self::Forest => "forest",
        }
    }

    /// Instantiate an unfitted model. Tree settings are taken from `forest`.
    pub fn build(&self, forest: &ForestConfig) -> Box<dyn Regressor> {
        match self {
            Self::Linear => Box::new(LinearRegression::default()),
            Self::Tree => Box::new(DecisionTree::new(TreeConfig {
                max_depth: forest.max_depth,
                min_samples_split: forest.min_samples_split,
                min_samples_leaf: forest.min_samples_leaf,
                max_features: forest.max_features,
                seed: forest.seed,
            })),
            Self::Forest => Box::new(RandomForest::new(forest.clone())),
        }
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModelKind {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "linear" | "ols" => Ok(Self::Linear),
            "tree" => Ok(Self::Tree),
            "forest" | "random_forest" | "rf" => Ok(Self::Forest),
            other => Err(ModelError::InvalidConfig(format!("Unknown model: {}", other))),
        }
    }
}
