//! Regression metrics for evaluating predictions.
//!
//! Besides the usual error measures this reports the information
//! coefficient (correlation between predictions and realised outcomes),
//! which matters more than R² when predictions are used to rank stocks.

use crate::error::{ModelError, Result};
use ndarray::Array1;
use serde::{Deserialize, Serialize};

/// Collection of regression metrics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegressionMetrics {
    /// Mean squared error
    pub mse: f64,
    /// Root mean squared error
    pub rmse: f64,
    /// Mean absolute error
    pub mae: f64,
    /// Coefficient of determination
    pub r2: f64,
    /// Pearson correlation of predictions and targets
    pub ic: f64,
    /// Spearman rank correlation of predictions and targets
    pub rank_ic: f64,
    /// Share of rows where prediction and target have the same sign
    pub hit_rate: f64,
    /// Number of samples
    pub n_samples: usize,
}

impl RegressionMetrics {
    /// Calculate all metrics.
    pub fn calculate(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> Result<Self> {
        if y_true.is_empty() {
            return Err(ModelError::EmptyInput);
        }
        if y_true.len() != y_pred.len() {
            return Err(ModelError::DimensionMismatch {
                expected: y_true.len(),
                got: y_pred.len(),
            });
        }

        let mse = Self::mean_squared_error(y_true, y_pred);
        Ok(Self {
            mse,
            rmse: mse.sqrt(),
            mae: Self::mean_absolute_error(y_true, y_pred),
            r2: Self::r_squared(y_true, y_pred),
            ic: Self::information_coefficient(y_true, y_pred),
            rank_ic: Self::rank_information_coefficient(y_true, y_pred),
            hit_rate: Self::hit_rate(y_true, y_pred),
            n_samples: y_true.len(),
        })
    }

    /// Mean squared error: `(1/n) Σ (y - ŷ)²`
    pub fn mean_squared_error(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> f64 {
        let n = y_true.len() as f64;
        y_true
            .iter()
            .zip(y_pred.iter())
            .map(|(&t, &p)| (t - p).powi(2))
            .sum::<f64>()
            / n
    }

    /// Mean absolute error: `(1/n) Σ |y - ŷ|`
    pub fn mean_absolute_error(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> f64 {
        let n = y_true.len() as f64;
        y_true
            .iter()
            .zip(y_pred.iter())
            .map(|(&t, &p)| (t - p).abs())
            .sum::<f64>()
            / n
    }

    /// R² = 1 - SS_res / SS_tot, or 0.0 for a constant target
    pub fn r_squared(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> f64 {
        let y_mean = y_true.mean().unwrap_or(0.0);

        let ss_res: f64 = y_true
            .iter()
            .zip(y_pred.iter())
            .map(|(&t, &p)| (t - p).powi(2))
            .sum();
        let ss_tot: f64 = y_true.iter().map(|&t| (t - y_mean).powi(2)).sum();

        if ss_tot < 1e-10 {
            return 0.0;
        }
        1.0 - ss_res / ss_tot
    }

    /// Pearson correlation, or 0.0 when either side is constant
    pub fn information_coefficient(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> f64 {
        pearson(&y_true.to_vec(), &y_pred.to_vec())
    }

    /// Spearman correlation (Pearson on average ranks)
    pub fn rank_information_coefficient(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> f64 {
        let t = ranks(&y_true.to_vec());
        let p = ranks(&y_pred.to_vec());
        pearson(&t, &p)
    }

    /// Share of rows whose prediction has the sign of the target
    pub fn hit_rate(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> f64 {
        let hits = y_true
            .iter()
            .zip(y_pred.iter())
            .filter(|&(&t, &p)| (t > 0.0) == (p > 0.0))
            .count();
        hits as f64 / y_true.len() as f64
    }
}

fn pearson(a: &[f64], b: &[f64]) -> f64 {
    let n = a.len() as f64;
    if n < 2.0 {
        return 0.0;
    }
    let mean_a = a.iter().sum::<f64>() / n;
    let mean_b = b.iter().sum::<f64>() / n;

    let mut cov = 0.0;
    let mut var_a = 0.0;
    let mut var_b = 0.0;
    for (&x, &y) in a.iter().zip(b) {
        cov += (x - mean_a) * (y - mean_b);
        var_a += (x - mean_a).powi(2);
        var_b += (y - mean_b).powi(2);
    }

    let denom = (var_a * var_b).sqrt();
    if denom < 1e-15 { 0.0 } else { cov / denom }
}

/// Average ranks starting at 1, ties sharing the mean of their positions.
fn ranks(values: &[f64]) -> Vec<f64> {
    let mut order: Vec<usize> = (0..values.len()).collect();
    order.sort_by(|&a, &b| values[a].total_cmp(&values[b]));

    let mut ranks = vec![0.0; values.len()];
    let mut start = 0;
    while start < order.len() {
        let mut end = start;
        while end + 1 < order.len() && values[order[end + 1]] == values[order[start]] {
            end += 1;
        }
        let rank = (start + end) as f64 / 2.0 + 1.0;
        for &i in &order[start..=end] {
            ranks[i] = rank;
        }
        start = end + 1;
    }
    ranks
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;
    use rstest::rstest;

    #[test]
    fn test_perfect_predictions() {
        let y = array![0.01, -0.02, 0.03, 0.0];
        let m = RegressionMetrics::calculate(&y, &y).unwrap();
        assert_relative_eq!(m.mse, 0.0);
        assert_relative_eq!(m.r2, 1.0);
        assert_relative_eq!(m.ic, 1.0, epsilon = 1e-12);
        assert_relative_eq!(m.rank_ic, 1.0, epsilon = 1e-12);
        assert_relative_eq!(m.hit_rate, 1.0);
        assert_eq!(m.n_samples, 4);
    }

    #[test]
    fn test_error_measures() {
        let y = array![1.0, 2.0, 3.0];
        let p = array![2.0, 2.0, 1.0];
        let m = RegressionMetrics::calculate(&y, &p).unwrap();
        assert_relative_eq!(m.mse, 5.0 / 3.0, epsilon = 1e-12);
        assert_relative_eq!(m.rmse, (5.0_f64 / 3.0).sqrt(), epsilon = 1e-12);
        assert_relative_eq!(m.mae, 1.0, epsilon = 1e-12);
        // SS_tot = 2, SS_res = 5
        assert_relative_eq!(m.r2, -1.5, epsilon = 1e-12);
    }

    #[rstest]
    #[case(vec![3.0, 1.0, 2.0], vec![3.0, 1.0, 2.0])]
    #[case(vec![1.0, 1.0, 5.0, 2.0], vec![1.5, 1.5, 4.0, 3.0])]
    #[case(vec![-1.0, 0.0, 1.0], vec![1.0, 2.0, 3.0])]
    fn test_ranks(#[case] values: Vec<f64>, #[case] expected: Vec<f64>) {
        assert_eq!(ranks(&values), expected);
    }

    #[test]
    fn test_rank_ic_ignores_scale() {
        let y = array![1.0, 2.0, 3.0, 4.0];
        let p = array![0.1, 10.0, 100.0, 1000.0];
        let m = RegressionMetrics::calculate(&y, &p).unwrap();
        assert_relative_eq!(m.rank_ic, 1.0, epsilon = 1e-12);
        assert!(m.ic < 1.0);
    }

    #[test]
    fn test_constant_prediction_has_zero_ic() {
        let y = array![1.0, 2.0, 3.0];
        let p = array![2.0, 2.0, 2.0];
        assert_relative_eq!(RegressionMetrics::information_coefficient(&y, &p), 0.0);
    }

    #[test]
    fn test_length_mismatch() {
        assert!(matches!(
            RegressionMetrics::calculate(&array![1.0], &array![1.0, 2.0]),
            Err(ModelError::DimensionMismatch { .. })
        ));
        assert!(matches!(
            RegressionMetrics::calculate(&array![], &array![]),
            Err(ModelError::EmptyInput)
        ));
    }
}
