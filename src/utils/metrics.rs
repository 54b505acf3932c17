//! In-sample accuracy metrics for fitted models.

use crate::error::{ForecastError, Result};
use serde::Serialize;

/// Accuracy of fitted values against the observed history.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AccuracyMetrics {
    /// Mean Absolute Error
    pub mae: f64,
    /// Root Mean Squared Error
    pub rmse: f64,
    /// Mean Absolute Percentage Error (None if zeros in actual)
    pub mape: Option<f64>,
    /// Symmetric Mean Absolute Percentage Error
    pub smape: f64,
    /// R-squared (coefficient of determination)
    pub r_squared: f64,
}

/// Calculate accuracy metrics between actual and predicted values.
///
/// # Example
/// ```
/// use trendcast::utils::calculate_metrics;
///
/// let metrics = calculate_metrics(&[1.0, 2.0, 3.0], &[1.5, 2.5, 3.5]).unwrap();
/// assert!((metrics.mae - 0.5).abs() < 1e-12);
/// ```
pub fn calculate_metrics(actual: &[f64], predicted: &[f64]) -> Result<AccuracyMetrics> {
    if actual.is_empty() || predicted.is_empty() {
        return Err(ForecastError::InvalidParameter(
            "metrics need at least one observation".to_string(),
        ));
    }

    if actual.len() != predicted.len() {
        return Err(ForecastError::InvalidParameter(format!(
            "metrics need aligned inputs, got {} actual and {} predicted",
            actual.len(),
            predicted.len()
        )));
    }

    let n = actual.len() as f64;
    let pairs = || actual.iter().zip(predicted.iter());

    let mae = pairs().map(|(a, p)| (a - p).abs()).sum::<f64>() / n;
    let mse = pairs().map(|(a, p)| (a - p).powi(2)).sum::<f64>() / n;

    // MAPE (only if no zeros in actual)
    let mape = if actual.contains(&0.0) {
        None
    } else {
        let sum: f64 = pairs().map(|(a, p)| ((a - p) / a).abs()).sum();
        Some(100.0 * sum / n)
    };

    let smape = pairs()
        .map(|(a, p)| {
            let denom = a.abs() + p.abs();
            if denom == 0.0 {
                0.0
            } else {
                2.0 * (a - p).abs() / denom
            }
        })
        .sum::<f64>()
        * 100.0
        / n;

    let mean_actual = actual.iter().sum::<f64>() / n;
    let ss_tot: f64 = actual.iter().map(|a| (a - mean_actual).powi(2)).sum();
    let r_squared = if ss_tot == 0.0 {
        1.0
    } else {
        1.0 - mse * n / ss_tot
    };

    Ok(AccuracyMetrics {
        mae,
        rmse: mse.sqrt(),
        mape,
        smape,
        r_squared,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn calculate_metrics_perfect_prediction() {
        let actual = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        let metrics = calculate_metrics(&actual, &actual).unwrap();

        assert_relative_eq!(metrics.mae, 0.0, epsilon = 1e-10);
        assert_relative_eq!(metrics.rmse, 0.0, epsilon = 1e-10);
        assert_relative_eq!(metrics.smape, 0.0, epsilon = 1e-10);
        assert_relative_eq!(metrics.r_squared, 1.0, epsilon = 1e-10);
        assert_eq!(metrics.mape, Some(0.0));
    }

    #[test]
    fn calculate_metrics_known_values() {
        let actual = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        let predicted = vec![1.5, 2.5, 2.5, 4.5, 4.5];

        let metrics = calculate_metrics(&actual, &predicted).unwrap();

        assert_relative_eq!(metrics.mae, 0.5, epsilon = 1e-10);
        assert_relative_eq!(metrics.rmse, 0.5, epsilon = 1e-10);
    }

    #[test]
    fn mape_undefined_with_zero_volume() {
        let metrics = calculate_metrics(&[0.0, 1.0, 2.0], &[0.1, 1.1, 2.1]).unwrap();
        assert!(metrics.mape.is_none());
        assert!(metrics.smape.is_finite());
    }

    #[test]
    fn rejects_empty_or_misaligned_input() {
        assert!(calculate_metrics(&[], &[]).is_err());
        assert!(calculate_metrics(&[1.0, 2.0], &[1.0]).is_err());
    }

    #[test]
    fn r_squared_negative_for_poor_model() {
        let actual = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        let predicted = vec![5.0, 4.0, 3.0, 2.0, 1.0];
        let metrics = calculate_metrics(&actual, &predicted).unwrap();
        assert!(metrics.r_squared < 0.0);
    }
}
