//! Penalized maximum a posteriori fit of trend and seasonal coefficients.
//!
//! The objective on the scaled series is
//!
//! ```text
//! J = ½‖y − ŷ‖² + (σ²/τ) Σ √(δⱼ² + ε²) + ½ (σ²/25)(k² + m²) + ½ Σ (σ²/sⱼ²) βⱼ²
//! ```
//!
//! where `ŷ = g·(1 + s)` (multiplicative) or `ŷ = g + s` (additive), `g` is the
//! piecewise-linear trend with parameters `θ = [m, k, δ…]` and `s = Xβ` the
//! stacked Fourier seasonality. The Laplace prior on `δ` is smoothed by `ε` so
//! that every iteration is a weighted ridge problem: one Gauss–Newton step on
//! the joint parameters, with the L1 term replaced by its local quadratic
//! majorizer, followed by a halving line search on `J`.

use super::config::SeasonalityMode;
use super::features::combine;
use crate::error::{ForecastError, Result};
use crate::utils::ridge_fit;
use tracing::debug;

/// Prior variance of offset and base growth, in scaled units.
const TREND_PRIOR_VAR: f64 = 25.0;
/// Smoothing of the absolute value in the changepoint prior.
const L1_SMOOTHING: f64 = 1e-4;
/// Smallest line-search step tried before giving up on a direction.
const MIN_STEP: f64 = 1e-4;

/// One fitting problem over a scaled history.
pub struct Problem<'a> {
    pub ys: &'a [f64],
    /// Trend design `[1, t, hinges…]`.
    pub trend: &'a [Vec<f64>],
    /// Stacked Fourier design.
    pub seasonal: &'a [Vec<f64>],
    /// Prior scale of each seasonal column.
    pub prior_scales: &'a [f64],
    pub mode: SeasonalityMode,
    /// Observation noise variance used to weigh the priors.
    pub noise_var: f64,
    pub changepoint_prior_scale: f64,
}

/// Converged parameters.
#[derive(Debug, Clone)]
pub struct Solution {
    pub theta: Vec<f64>,
    pub beta: Vec<f64>,
    pub iterations: usize,
    pub objective: f64,
}

impl<'a> Problem<'a> {
    fn n(&self) -> usize {
        self.ys.len()
    }

    /// Trend, seasonal term and fitted values at the given parameters.
    pub fn evaluate(&self, theta: &[f64], beta: &[f64]) -> (Vec<f64>, Vec<f64>, Vec<f64>) {
        let trend = combine(self.trend, theta, self.n());
        let seasonal = combine(self.seasonal, beta, self.n());
        let fitted = trend
            .iter()
            .zip(&seasonal)
            .map(|(g, s)| match self.mode {
                SeasonalityMode::Multiplicative => g * (1.0 + s),
                SeasonalityMode::Additive => g + s,
            })
            .collect();
        (trend, seasonal, fitted)
    }

    /// Residual sum of squares.
    pub fn rss(&self, theta: &[f64], beta: &[f64]) -> f64 {
        let (_, _, fitted) = self.evaluate(theta, beta);
        self.ys
            .iter()
            .zip(&fitted)
            .map(|(y, f)| (y - f).powi(2))
            .sum()
    }

    pub fn objective(&self, theta: &[f64], beta: &[f64]) -> f64 {
        let nv = self.noise_var;
        let l1 = nv / self.changepoint_prior_scale;

        let base = 0.5 * nv / TREND_PRIOR_VAR * (theta[0].powi(2) + theta[1].powi(2));
        let changes: f64 = theta[2..]
            .iter()
            .map(|d| (d * d + L1_SMOOTHING * L1_SMOOTHING).sqrt())
            .sum();
        let seasonal: f64 = beta
            .iter()
            .zip(self.prior_scales)
            .map(|(b, s)| 0.5 * nv / (s * s) * b * b)
            .sum();

        0.5 * self.rss(theta, beta) + l1 * changes + base + seasonal
    }

    /// Ridge weights of the linearized step at `theta`.
    fn penalties(&self, theta: &[f64]) -> Vec<f64> {
        let nv = self.noise_var;
        let l1 = nv / self.changepoint_prior_scale;

        let mut penalties = Vec::with_capacity(theta.len() + self.prior_scales.len());
        penalties.push(nv / TREND_PRIOR_VAR);
        penalties.push(nv / TREND_PRIOR_VAR);
        penalties.extend(
            theta[2..]
                .iter()
                .map(|d| l1 / (d * d + L1_SMOOTHING * L1_SMOOTHING).sqrt()),
        );
        penalties.extend(self.prior_scales.iter().map(|s| nv / (s * s)));
        penalties
    }

    /// Design and target of the Gauss–Newton step around `(theta, beta)`.
    fn linearize(&self, theta: &[f64], beta: &[f64]) -> (Vec<Vec<f64>>, Vec<f64>) {
        match self.mode {
            SeasonalityMode::Additive => {
                let columns: Vec<Vec<f64>> =
                    self.trend.iter().chain(self.seasonal).cloned().collect();
                (columns, self.ys.to_vec())
            }
            SeasonalityMode::Multiplicative => {
                let (trend, seasonal, _) = self.evaluate(theta, beta);
                let mut columns: Vec<Vec<f64>> =
                    Vec::with_capacity(self.trend.len() + self.seasonal.len());
                for col in self.trend {
                    columns.push(
                        col.iter()
                            .zip(&seasonal)
                            .map(|(x, s)| x * (1.0 + s))
                            .collect(),
                    );
                }
                for col in self.seasonal {
                    columns.push(col.iter().zip(&trend).map(|(x, g)| x * g).collect());
                }
                let target: Vec<f64> = self
                    .ys
                    .iter()
                    .zip(trend.iter().zip(&seasonal))
                    .map(|(y, (g, s))| y + g * s)
                    .collect();
                (columns, target)
            }
        }
    }

    /// Iterate from `theta` (with zero seasonality) until the relative
    /// decrease of the objective drops below `tolerance`.
    ///
    /// A line search that cannot decrease the objective at all means the
    /// current point is already a minimum and ends the fit successfully.
    pub fn solve(
        &self,
        theta: Vec<f64>,
        max_iterations: usize,
        tolerance: f64,
    ) -> Result<Solution> {
        let beta = vec![0.0; self.seasonal.len()];
        self.solve_from(theta, beta, max_iterations, tolerance)
    }

    /// Same as [`solve`](Self::solve), warm-started at `(theta, beta)`.
    pub fn solve_from(
        &self,
        theta: Vec<f64>,
        beta: Vec<f64>,
        max_iterations: usize,
        tolerance: f64,
    ) -> Result<Solution> {
        let p = theta.len();
        let mut theta = theta;
        let mut beta = beta;
        let mut prev = self.objective(&theta, &beta);

        if !prev.is_finite() {
            return Err(ForecastError::NonConvergence { iterations: 0 });
        }

        for iteration in 1..=max_iterations {
            let (columns, target) = self.linearize(&theta, &beta);
            let penalties = self.penalties(&theta);
            let proposal = ridge_fit(&columns, &target, &penalties)
                .map_err(|_| ForecastError::NonConvergence { iterations: iteration })?;
            let (next_theta, next_beta) = proposal.split_at(p);

            let mut step = 1.0;
            let (cand_theta, cand_beta, cur) = loop {
                let cand_theta = interpolate(&theta, next_theta, step);
                let cand_beta = interpolate(&beta, next_beta, step);
                let cur = self.objective(&cand_theta, &cand_beta);
                if cur <= prev || step < MIN_STEP {
                    break (cand_theta, cand_beta, cur);
                }
                step *= 0.5;
            };

            if !cur.is_finite() {
                return Err(ForecastError::NonConvergence { iterations: iteration });
            }

            if cur > prev {
                debug!(iteration, objective = prev, "line search stalled");
                return Ok(Solution {
                    theta,
                    beta,
                    iterations: iteration,
                    objective: prev,
                });
            }

            theta = cand_theta;
            beta = cand_beta;

            if prev - cur <= tolerance * prev.max(f64::EPSILON) {
                debug!(iteration, objective = cur, "fit converged");
                return Ok(Solution {
                    theta,
                    beta,
                    iterations: iteration,
                    objective: cur,
                });
            }
            prev = cur;
        }

        Err(ForecastError::NonConvergence {
            iterations: max_iterations,
        })
    }
}

fn interpolate(from: &[f64], to: &[f64], step: f64) -> Vec<f64> {
    from.iter().zip(to).map(|(a, b)| a + step * (b - a)).collect()
}
