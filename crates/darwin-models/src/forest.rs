//! Random forest regression.
//!
//! Each tree is grown on a bootstrap sample of the rows (drawn with a
//! ChaCha8 generator seeded from `seed + tree index`) and considers a
//! random subset of features at every split. Trees are built in parallel
//! with rayon; the forest predicts the mean of its trees.

use crate::error::{ModelError, Result};
use crate::traits::{Regressor, check_features, check_training};
use crate::tree::{DecisionTree, TreeConfig};
use ndarray::{Array1, Array2};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Random forest configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ForestConfig {
    /// Number of trees (default: 100)
    pub n_trees: usize,
    /// Maximum depth of each tree (default: 10)
    pub max_depth: usize,
    /// Minimum samples to split (default: 5)
    pub min_samples_split: usize,
    /// Minimum samples in a leaf (default: 2)
    pub min_samples_leaf: usize,
    /// Features considered per split; a third of the features when `None`
    pub max_features: Option<usize>,
    /// Grow each tree on a bootstrap sample (default: true)
    pub bootstrap: bool,
    /// Base random seed (default: 42)
    pub seed: u64,
}

impl Default for ForestConfig {
    fn default() -> Self {
        Self {
            n_trees: 100,
            max_depth: 10,
            min_samples_split: 5,
            min_samples_leaf: 2,
            max_features: None,
            bootstrap: true,
            seed: 42,
        }
    }
}

/// Bagged ensemble of regression trees
#[derive(Debug, Clone)]
pub struct RandomForest {
    config: ForestConfig,
    trees: Vec<DecisionTree>,
    n_features: usize,
    feature_importances: Vec<f64>,
}

impl Default for RandomForest {
    fn default() -> Self {
        Self::new(ForestConfig::default())
    }
}

impl RandomForest {
    /// Create an unfitted forest.
    pub const fn new(config: ForestConfig) -> Self {
        Self {
            config,
            trees: Vec::new(),
            n_features: 0,
            feature_importances: Vec::new(),
        }
    }

    /// The active configuration.
    pub const fn config(&self) -> &ForestConfig {
        &self.config
    }

    /// Number of fitted trees.
    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    /// Mean normalised importance per feature across trees.
    pub fn importances(&self) -> &[f64] {
        &self.feature_importances
    }

    fn tree_config(&self, index: usize, n_features: usize) -> TreeConfig {
        let max_features = self
            .config
            .max_features
            .unwrap_or_else(|| (n_features / 3).max(1));
        TreeConfig {
            max_depth: self.config.max_depth,
            min_samples_split: self.config.min_samples_split,
            min_samples_leaf: self.config.min_samples_leaf,
            max_features: Some(max_features),
            seed: self.config.seed.wrapping_add(index as u64),
        }
    }
}

/// Row indices for one tree: a bootstrap sample, or every row once.
fn sample_rows(n: usize, bootstrap: bool, seed: u64) -> Vec<usize> {
    if !bootstrap {
        return (0..n).collect();
    }
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    (0..n).map(|_| rng.gen_range(0..n)).collect()
}

impl Regressor for RandomForest {
    fn name(&self) -> &str {
        "forest"
    }

    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        check_training(x, y)?;
        if self.config.n_trees == 0 {
            return Err(ModelError::InvalidConfig(
                "n_trees must be at least 1".to_string(),
            ));
        }

        let n_features = x.ncols();
        let trees = (0..self.config.n_trees)
            .into_par_iter()
            .map(|i| {
                let config = self.tree_config(i, n_features);
                let rows = sample_rows(x.nrows(), self.config.bootstrap, config.seed);
                let mut tree = DecisionTree::new(config);
                tree.fit_rows(x, y, &rows)?;
                Ok(tree)
            })
            .collect::<Result<Vec<_>>>()?;

        let mut importances = vec![0.0; n_features];
        for tree in &trees {
            for (total, importance) in importances.iter_mut().zip(tree.importances()) {
                *total += importance;
            }
        }
        let sum: f64 = importances.iter().sum();
        if sum > 0.0 {
            for importance in &mut importances {
                *importance /= sum;
            }
        }

        self.trees = trees;
        self.n_features = n_features;
        self.feature_importances = importances;

        tracing::debug!(
            trees = self.trees.len(),
            samples = x.nrows(),
            features = n_features,
            "fitted random forest"
        );
        Ok(())
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        if self.trees.is_empty() {
            return Err(ModelError::NotFitted);
        }
        check_features(x, self.n_features)?;

        let per_tree = self
            .trees
            .par_iter()
            .map(|tree| tree.predict(x))
            .collect::<Result<Vec<_>>>()?;

        let mut sum = Array1::<f64>::zeros(x.nrows());
        for predictions in &per_tree {
            sum += predictions;
        }
        Ok(sum / self.trees.len() as f64)
    }

    fn feature_importances(&self) -> Option<Vec<f64>> {
        (!self.trees.is_empty()).then(|| self.feature_importances.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn data() -> (Array2<f64>, Array1<f64>) {
        let x = Array2::from_shape_fn((80, 3), |(i, j)| match j {
            0 => (i % 20) as f64,
            1 => ((i * 13) % 7) as f64,
            _ => ((i * 5) % 11) as f64,
        });
        let y = Array1::from_shape_fn(80, |i| if i % 20 < 10 { -1.0 } else { 1.0 });
        (x, y)
    }

    fn small() -> ForestConfig {
        ForestConfig {
            n_trees: 16,
            max_features: Some(3),
            ..Default::default()
        }
    }

    #[test]
    fn test_fits_signal() {
        let (x, y) = data();
        let mut forest = RandomForest::new(small());
        forest.fit(&x, &y).unwrap();

        assert_eq!(forest.n_trees(), 16);
        assert!(forest.score(&x, &y).unwrap() > 0.9);

        let importances = forest.importances();
        assert_relative_eq!(importances.iter().sum::<f64>(), 1.0, epsilon = 1e-9);
        assert!(importances[0] > importances[1] && importances[0] > importances[2]);
    }

    #[test]
    fn test_same_seed_same_predictions() {
        let (x, y) = data();
        let mut a = RandomForest::new(small());
        let mut b = RandomForest::new(small());
        a.fit(&x, &y).unwrap();
        b.fit(&x, &y).unwrap();
        assert_eq!(a.predict(&x).unwrap(), b.predict(&x).unwrap());
    }

    #[test]
    fn test_bootstrap_sample_is_seeded() {
        assert_eq!(sample_rows(50, true, 7), sample_rows(50, true, 7));
        assert_ne!(sample_rows(50, true, 7), sample_rows(50, true, 8));
        assert_eq!(sample_rows(4, false, 7), vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_default_max_features() {
        let forest = RandomForest::default();
        assert_eq!(forest.tree_config(0, 9).max_features, Some(3));
        assert_eq!(forest.tree_config(0, 2).max_features, Some(1));
        assert_eq!(forest.tree_config(3, 2).seed, 45);
    }

    #[test]
    fn test_not_fitted() {
        let (x, _) = data();
        assert!(matches!(
            RandomForest::default().predict(&x),
            Err(ModelError::NotFitted)
        ));
    }
}
