//! Statistical utility functions.

use statrs::distribution::{ContinuousCDF, Normal};

/// Two-sided z-score for a central interval of the given width.
///
/// `interval_z(0.8)` is the z such that 80% of a standard normal lies in
/// `[-z, z]`. Widths outside `(0, 1)` give 0.
pub fn interval_z(width: f64) -> f64 {
    if !(width > 0.0 && width < 1.0) {
        return 0.0;
    }
    match Normal::new(0.0, 1.0) {
        Ok(normal) => normal.inverse_cdf(0.5 + width / 2.0),
        Err(_) => 0.0,
    }
}

/// Calculate the mean of a slice.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Mean absolute value, or 0 for an empty slice.
pub fn mean_abs(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().map(|v| v.abs()).sum::<f64>() / values.len() as f64
}

/// Largest absolute value, or 0 for an empty slice.
pub fn max_abs(values: &[f64]) -> f64 {
    values.iter().fold(0.0_f64, |acc, v| acc.max(v.abs()))
}

/// Median of a slice, or NaN when empty.
pub fn median(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

/// Median absolute deviation from the median.
pub fn mad(values: &[f64]) -> f64 {
    let center = median(values);
    let deviations: Vec<f64> = values.iter().map(|v| (v - center).abs()).collect();
    median(&deviations)
}
