//! Ordinary least squares.
//!
//! Solves the normal equations `(X'X) β = X'y` with a Cholesky
//! factorisation. When an intercept is fitted the columns and target are
//! centred first, which keeps `X'X` well conditioned, and the intercept is
//! recovered as `ȳ - x̄·β`.

use crate::error::{ModelError, Result};
use crate::traits::{Regressor, check_features, check_training};
use ndarray::{Array1, Array2, Axis};

/// Diagonal jitter added before factorising `X'X`.
const RIDGE_JITTER: f64 = 1e-10;

/// Linear regression fitted by least squares
#[derive(Debug, Clone)]
pub struct LinearRegression {
    fit_intercept: bool,
    coefficients: Option<Array1<f64>>,
    intercept: f64,
}

impl Default for LinearRegression {
    fn default() -> Self {
        Self::new(true)
    }
}

impl LinearRegression {
    /// Create an unfitted model.
    pub const fn new(fit_intercept: bool) -> Self {
        Self {
            fit_intercept,
            coefficients: None,
            intercept: 0.0,
        }
    }

    /// Fitted slope per feature, if fitted.
    pub const fn coefficients(&self) -> Option<&Array1<f64>> {
        self.coefficients.as_ref()
    }

    /// Fitted intercept (0.0 without an intercept or before fitting).
    pub const fn intercept(&self) -> f64 {
        self.intercept
    }
}

impl Regressor for LinearRegression {
    fn name(&self) -> &str {
        "linear"
    }

    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        check_training(x, y)?;

        let (x_mean, y_mean) = if self.fit_intercept {
            let x_mean = x.mean_axis(Axis(0)).ok_or(ModelError::EmptyInput)?;
            let y_mean = y.mean().ok_or(ModelError::EmptyInput)?;
            (x_mean, y_mean)
        } else {
            (Array1::zeros(x.ncols()), 0.0)
        };

        let xc = x - &x_mean;
        let yc = y - y_mean;

        let mut xtx = xc.t().dot(&xc);
        let xty = xc.t().dot(&yc);
        for i in 0..xtx.nrows() {
            xtx[[i, i]] += RIDGE_JITTER;
        }

        let beta = cholesky_solve(&xtx, &xty)?;
        self.intercept = y_mean - x_mean.dot(&beta);
        self.coefficients = Some(beta);

        tracing::debug!(
            samples = x.nrows(),
            features = x.ncols(),
            intercept = self.intercept,
            "fitted linear regression"
        );
        Ok(())
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let beta = self.coefficients.as_ref().ok_or(ModelError::NotFitted)?;
        check_features(x, beta.len())?;
        Ok(x.dot(beta) + self.intercept)
    }
}

/// Solve `A x = b` for symmetric positive definite `A`.
fn cholesky_solve(a: &Array2<f64>, b: &Array1<f64>) -> Result<Array1<f64>> {
    let n = a.nrows();
    let mut l = Array2::<f64>::zeros((n, n));

    // A = L L'
    for i in 0..n {
        for j in 0..=i {
            let sum: f64 = (0..j).map(|k| l[[i, k]] * l[[j, k]]).sum();
            if i == j {
                let diag = a[[i, i]] - sum;
                if diag <= 0.0 || !diag.is_finite() {
                    return Err(ModelError::SingularMatrix);
                }
                l[[i, j]] = diag.sqrt();
            } else {
                l[[i, j]] = (a[[i, j]] - sum) / l[[j, j]];
            }
        }
    }

    // L z = b
    let mut z = Array1::<f64>::zeros(n);
    for i in 0..n {
        let sum: f64 = (0..i).map(|j| l[[i, j]] * z[j]).sum();
        z[i] = (b[i] - sum) / l[[i, i]];
    }

    // L' x = z
    let mut x = Array1::<f64>::zeros(n);
    for i in (0..n).rev() {
        let sum: f64 = ((i + 1)..n).map(|j| l[[j, i]] * x[j]).sum();
        x[i] = (z[i] - sum) / l[[i, i]];
    }

    Ok(x)
}
