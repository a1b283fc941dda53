//! CART regression tree.
//!
//! Splits greedily on the threshold that most reduces the weighted MSE of
//! the two children. Candidate thresholds are midpoints between adjacent
//! distinct values, evaluated with running sums over the sorted column.

use crate::error::{ModelError, Result};
use crate::traits::{Regressor, check_features, check_training};
use ndarray::{Array1, Array2, ArrayView1};
use rand::SeedableRng;
use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// Decision tree configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreeConfig {
    /// Maximum depth of the tree (default: 10)
    pub max_depth: usize,
    /// Minimum samples required to split a node (default: 5)
    pub min_samples_split: usize,
    /// Minimum samples in each leaf (default: 2)
    pub min_samples_leaf: usize,
    /// Features considered per split, all when `None`
    pub max_features: Option<usize>,
    /// Seed for the per-split feature shuffle (default: 42)
    pub seed: u64,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            max_depth: 10,
            min_samples_split: 5,
            min_samples_leaf: 2,
            max_features: None,
            seed: 42,
        }
    }
}

impl TreeConfig {
    pub(crate) fn validate(&self) -> Result<()> {
        if self.min_samples_leaf == 0 {
            return Err(ModelError::InvalidConfig(
                "min_samples_leaf must be at least 1".to_string(),
            ));
        }
        if self.min_samples_split < 2 {
            return Err(ModelError::InvalidConfig(
                "min_samples_split must be at least 2".to_string(),
            ));
        }
        if self.max_features == Some(0) {
            return Err(ModelError::InvalidConfig(
                "max_features must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
enum Node {
    Leaf {
        value: f64,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: Box<Node>,
        right: Box<Node>,
    },
}

impl Node {
    fn predict(&self, row: ArrayView1<'_, f64>) -> f64 {
        let mut node = self;
        loop {
            match node {
                Self::Leaf { value } => return *value,
                Self::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    node = if row[*feature] <= *threshold {
                        left.as_ref()
                    } else {
                        right.as_ref()
                    };
                }
            }
        }
    }

    fn depth(&self) -> usize {
        match self {
            Self::Leaf { .. } => 1,
            Self::Split { left, right, .. } => 1 + left.depth().max(right.depth()),
        }
    }

    fn n_leaves(&self) -> usize {
        match self {
            Self::Leaf { .. } => 1,
            Self::Split { left, right, .. } => left.n_leaves() + right.n_leaves(),
        }
    }
}

struct BestSplit {
    feature: usize,
    threshold: f64,
    left: Vec<usize>,
    right: Vec<usize>,
    gain: f64,
}

/// Regression tree
#[derive(Debug, Clone)]
pub struct DecisionTree {
    config: TreeConfig,
    root: Option<Node>,
    n_features: usize,
    feature_importances: Vec<f64>,
}

impl Default for DecisionTree {
    fn default() -> Self {
        Self::new(TreeConfig::default())
    }
}

impl DecisionTree {
    /// Create an unfitted tree.
    pub const fn new(config: TreeConfig) -> Self {
        Self {
            config,
            root: None,
            n_features: 0,
            feature_importances: Vec::new(),
        }
    }

    /// The active configuration.
    pub const fn config(&self) -> &TreeConfig {
        &self.config
    }

    /// Depth of the fitted tree (0 before fitting).
    pub fn depth(&self) -> usize {
        self.root.as_ref().map_or(0, Node::depth)
    }

    /// Leaf count of the fitted tree (0 before fitting).
    pub fn n_leaves(&self) -> usize {
        self.root.as_ref().map_or(0, Node::n_leaves)
    }

    /// Normalised impurity decrease per feature.
    pub fn importances(&self) -> &[f64] {
        &self.feature_importances
    }

    /// Fit on the rows of `x` listed in `rows` (repeats allowed).
    pub(crate) fn fit_rows(&mut self, x: &Array2<f64>, y: &Array1<f64>, rows: &[usize]) -> Result<()> {
        self.config.validate()?;
        if rows.is_empty() {
            return Err(ModelError::EmptyInput);
        }

        self.n_features = x.ncols();
        self.feature_importances = vec![0.0; x.ncols()];
        let mut rng = ChaCha8Rng::seed_from_u64(self.config.seed);

        let root = self.build(x, y, rows, 0, &mut rng);
        self.root = Some(root);

        let total: f64 = self.feature_importances.iter().sum();
        if total > 0.0 {
            for importance in &mut self.feature_importances {
                *importance /= total;
            }
        }
        Ok(())
    }

    fn build(
        &mut self,
        x: &Array2<f64>,
        y: &Array1<f64>,
        rows: &[usize],
        depth: usize,
        rng: &mut ChaCha8Rng,
    ) -> Node {
        let value = mean(y, rows);
        if depth >= self.config.max_depth
            || rows.len() < self.config.min_samples_split
            || sse(y, rows) < 1e-12
        {
            return Node::Leaf { value };
        }

        match self.best_split(x, y, rows, rng) {
            Some(split) => {
                self.feature_importances[split.feature] += split.gain;
                let left = self.build(x, y, &split.left, depth + 1, rng);
                let right = self.build(x, y, &split.right, depth + 1, rng);
                Node::Split {
                    feature: split.feature,
                    threshold: split.threshold,
                    left: Box::new(left),
                    right: Box::new(right),
                }
            }
            None => Node::Leaf { value },
        }
    }

    fn best_split(
        &self,
        x: &Array2<f64>,
        y: &Array1<f64>,
        rows: &[usize],
        rng: &mut ChaCha8Rng,
    ) -> Option<BestSplit> {
        let n_features = x.ncols();
        let mut features: Vec<usize> = (0..n_features).collect();
        features.shuffle(rng);
        features.truncate(self.config.max_features.unwrap_or(n_features).min(n_features));

        let min_leaf = self.config.min_samples_leaf;
        let n = rows.len();
        let total_sum: f64 = rows.iter().map(|&i| y[i]).sum();
        let total_sq: f64 = rows.iter().map(|&i| y[i] * y[i]).sum();
        let parent_sse = total_sq - total_sum * total_sum / n as f64;

        let mut best: Option<(usize, f64, f64)> = None;
        for feature in features {
            let mut sorted = rows.to_vec();
            sorted.sort_by(|&a, &b| x[[a, feature]].total_cmp(&x[[b, feature]]));

            let mut left_sum = 0.0;
            let mut left_sq = 0.0;
            for k in 0..n - 1 {
                let yi = y[sorted[k]];
                left_sum += yi;
                left_sq += yi * yi;

                let here = x[[sorted[k], feature]];
                let next = x[[sorted[k + 1], feature]];
                let n_left = k + 1;
                let n_right = n - n_left;
                if here == next || n_left < min_leaf || n_right < min_leaf {
                    continue;
                }

                let right_sum = total_sum - left_sum;
                let right_sq = total_sq - left_sq;
                let child_sse = (left_sq - left_sum * left_sum / n_left as f64)
                    + (right_sq - right_sum * right_sum / n_right as f64);
                let gain = parent_sse - child_sse;

                if gain > best.map_or(1e-12, |(_, _, g)| g) {
                    best = Some((feature, (here + next) / 2.0, gain));
                }
            }
        }

        let (feature, threshold, gain) = best?;
        let (left, right): (Vec<usize>, Vec<usize>) =
            rows.iter().partition(|&&i| x[[i, feature]] <= threshold);
        Some(BestSplit {
            feature,
            threshold,
            left,
            right,
            gain,
        })
    }
}

impl Regressor for DecisionTree {
    fn name(&self) -> &str {
        "tree"
    }

    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        check_training(x, y)?;
        let rows: Vec<usize> = (0..x.nrows()).collect();
        self.fit_rows(x, y, &rows)?;
        tracing::debug!(depth = self.depth(), leaves = self.n_leaves(), "fitted decision tree");
        Ok(())
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let root = self.root.as_ref().ok_or(ModelError::NotFitted)?;
        check_features(x, self.n_features)?;
        Ok(x.rows().into_iter().map(|row| root.predict(row)).collect())
    }

    fn feature_importances(&self) -> Option<Vec<f64>> {
        self.root.as_ref().map(|_| self.feature_importances.clone())
    }
}

fn mean(y: &Array1<f64>, rows: &[usize]) -> f64 {
    rows.iter().map(|&i| y[i]).sum::<f64>() / rows.len() as f64
}

fn sse(y: &Array1<f64>, rows: &[usize]) -> f64 {
    let m = mean(y, rows);
    rows.iter().map(|&i| (y[i] - m).powi(2)).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;

    fn step() -> (Array2<f64>, Array1<f64>) {
        // y jumps from 1 to 5 at x = 5; the second column is noise
        let x = Array2::from_shape_fn((10, 2), |(i, j)| {
            if j == 0 { i as f64 } else { ((i * 7) % 3) as f64 }
        });
        let y = Array1::from_shape_fn(10, |i| if i < 5 { 1.0 } else { 5.0 });
        (x, y)
    }

    #[test]
    fn test_learns_step_function() {
        let (x, y) = step();
        let mut tree = DecisionTree::default();
        tree.fit(&x, &y).unwrap();

        assert_eq!(tree.depth(), 2);
        assert_eq!(tree.n_leaves(), 2);
        let pred = tree.predict(&array![[2.0, 0.0], [4.6, 1.0], [8.0, 2.0]]).unwrap();
        assert_eq!(pred.to_vec(), vec![1.0, 5.0, 5.0]);
        assert_relative_eq!(tree.importances()[0], 1.0);
        assert_eq!(tree.feature_importances(), Some(vec![1.0, 0.0]));
    }

    #[test]
    fn test_depth_limit() {
        let x = Array2::from_shape_fn((32, 1), |(i, _)| i as f64);
        let y = Array1::from_shape_fn(32, |i| (i * i) as f64);
        let mut tree = DecisionTree::new(TreeConfig {
            max_depth: 2,
            min_samples_split: 2,
            min_samples_leaf: 1,
            ..Default::default()
        });
        tree.fit(&x, &y).unwrap();
        assert!(tree.depth() <= 3);
        assert!(tree.n_leaves() <= 4);
    }

    #[test]
    fn test_min_samples_leaf_respected() {
        // A single outlier cannot be isolated with min_samples_leaf = 3
        let x = Array2::from_shape_fn((6, 1), |(i, _)| i as f64);
        let y = array![0.0, 0.0, 0.0, 0.0, 0.0, 10.0];
        let mut tree = DecisionTree::new(TreeConfig {
            min_samples_split: 2,
            min_samples_leaf: 3,
            ..Default::default()
        });
        tree.fit(&x, &y).unwrap();
        let pred = tree.predict(&array![[5.0]]).unwrap();
        assert_relative_eq!(pred[0], 10.0 / 3.0, epsilon = 1e-12);
    }

    #[test]
    fn test_constant_target_is_single_leaf() {
        let x = Array2::from_shape_fn((8, 2), |(i, j)| (i + j) as f64);
        let y = Array1::from_elem(8, 0.5);
        let mut tree = DecisionTree::default();
        tree.fit(&x, &y).unwrap();
        assert_eq!(tree.n_leaves(), 1);
        assert_relative_eq!(tree.score(&x, &y).unwrap(), 0.0);
    }

    #[test]
    fn test_invalid_config() {
        let (x, y) = step();
        let mut tree = DecisionTree::new(TreeConfig {
            min_samples_leaf: 0,
            ..Default::default()
        });
        assert!(matches!(tree.fit(&x, &y), Err(ModelError::InvalidConfig(_))));
    }
}
