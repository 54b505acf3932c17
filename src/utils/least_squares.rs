//! Penalized least squares used by the decomposition model.
//!
//! Design matrices are column-major: `columns[j][i]` is regressor `j` at
//! observation `i`.

use crate::error::{ForecastError, Result};

/// Ridge regression: minimize `½‖y − Xβ‖² + ½ Σ λⱼ βⱼ²`.
///
/// Solves the normal equations `(XᵀX + Λ) β = Xᵀy` by Cholesky
/// decomposition. A tiny jitter is added to the diagonal so that unpenalized
/// collinear columns still factorize.
///
/// # Example
/// ```
/// use trendcast::utils::ridge_fit;
///
/// // y = 3x, no penalty
/// let x = vec![1.0, 2.0, 3.0, 4.0];
/// let y = vec![3.0, 6.0, 9.0, 12.0];
/// let beta = ridge_fit(&[x], &y, &[0.0]).unwrap();
/// assert!((beta[0] - 3.0).abs() < 1e-6);
/// ```
pub fn ridge_fit(columns: &[Vec<f64>], y: &[f64], penalties: &[f64]) -> Result<Vec<f64>> {
    let k = columns.len();
    check_design(columns, y, penalties)?;
    if k == 0 {
        return Ok(vec![]);
    }

    let mut xtx = vec![vec![0.0; k]; k];
    let mut xty = vec![0.0; k];

    for i in 0..k {
        xty[i] = dot(&columns[i], y);
        for j in 0..=i {
            let v = dot(&columns[i], &columns[j]);
            xtx[i][j] = v;
            xtx[j][i] = v;
        }
        xtx[i][i] += penalties[i] + 1e-10;
    }

    solve_symmetric(&xtx, &xty).ok_or_else(|| {
        ForecastError::Computation("ridge system is not positive definite".to_string())
    })
}

fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

fn check_design(columns: &[Vec<f64>], y: &[f64], penalties: &[f64]) -> Result<()> {
    if penalties.len() != columns.len() {
        return Err(ForecastError::InvalidParameter(format!(
            "expected {} penalties, got {}",
            columns.len(),
            penalties.len()
        )));
    }
    if let Some(col) = columns.iter().find(|c| c.len() != y.len()) {
        return Err(ForecastError::InvalidParameter(format!(
            "design column has {} rows, target has {}",
            col.len(),
            y.len()
        )));
    }
    Ok(())
}

/// Solve symmetric positive definite system using Cholesky decomposition.
///
/// Solves A @ x = b where A is symmetric positive definite.
fn solve_symmetric(a: &[Vec<f64>], b: &[f64]) -> Option<Vec<f64>> {
    let n = b.len();
    if n == 0 || a.len() != n {
        return None;
    }

    // Cholesky decomposition A = L @ L'
    let mut l = vec![vec![0.0; n]; n];

    for i in 0..n {
        for j in 0..=i {
            let mut sum = a[i][j];
            for k in 0..j {
                sum -= l[i][k] * l[j][k];
            }

            if i == j {
                if sum <= 0.0 || !sum.is_finite() {
                    return None;
                }
                l[i][j] = sum.sqrt();
            } else {
                l[i][j] = sum / l[j][j];
            }
        }
    }

    // Forward substitution: L @ y = b
    let mut y = vec![0.0; n];
    for i in 0..n {
        let mut sum = b[i];
        for j in 0..i {
            sum -= l[i][j] * y[j];
        }
        y[i] = sum / l[i][i];
    }

    // Backward substitution: L' @ x = y
    let mut x = vec![0.0; n];
    for i in (0..n).rev() {
        let mut sum = y[i];
        for j in (i + 1)..n {
            sum -= l[j][i] * x[j];
        }
        x[i] = sum / l[i][i];
    }

    Some(x)
}
