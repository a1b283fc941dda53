//! The regression interface shared by every model.

use crate::error::{ModelError, Result};
use crate::metrics::RegressionMetrics;
use ndarray::{Array1, Array2};
use std::fmt::Debug;

/// A supervised regression model
pub trait Regressor: Debug + Send + Sync {
    /// Short model name for reports
    fn name(&self) -> &str;

    /// Learn from a feature matrix (one row per sample) and its targets
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()>;

    /// Predict one value per row of `x`
    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>>;

    /// Coefficient of determination of `predict(x)` against `y`
    fn score(&self, x: &Array2<f64>, y: &Array1<f64>) -> Result<f64> {
        let predictions = self.predict(x)?;
        if predictions.len() != y.len() {
            return Err(ModelError::DimensionMismatch {
                expected: predictions.len(),
                got: y.len(),
            });
        }
        Ok(RegressionMetrics::r_squared(y, &predictions))
    }

    /// Normalised importance per feature, for models that measure it
    fn feature_importances(&self) -> Option<Vec<f64>> {
        None
    }
}

/// Validate a training pair: non-empty, matching rows, all values finite.
pub(crate) fn check_training(x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
    if x.nrows() == 0 || x.ncols() == 0 {
        return Err(ModelError::EmptyInput);
    }
    if x.nrows() != y.len() {
        return Err(ModelError::DimensionMismatch {
            expected: x.nrows(),
            got: y.len(),
        });
    }
    check_finite(x)?;
    if let Some(row) = y.iter().position(|v| !v.is_finite()) {
        return Err(ModelError::NonFiniteInput { row });
    }
    Ok(())
}

/// Validate a prediction matrix against the fitted width.
pub(crate) fn check_features(x: &Array2<f64>, n_features: usize) -> Result<()> {
    if x.ncols() != n_features {
        return Err(ModelError::DimensionMismatch {
            expected: n_features,
            got: x.ncols(),
        });
    }
    check_finite(x)
}

fn check_finite(x: &Array2<f64>) -> Result<()> {
    for (row, values) in x.rows().into_iter().enumerate() {
        if values.iter().any(|v| !v.is_finite()) {
            return Err(ModelError::NonFiniteInput { row });
        }
    }
    Ok(())
}
