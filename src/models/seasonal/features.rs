//! Design matrices for the piecewise-linear trend and Fourier seasonalities.

use super::config::Seasonality;
use std::f64::consts::PI;
use std::ops::Range;

/// Fourier columns `[sin(2πkt/p), cos(2πkt/p)]` for every harmonic `k`.
///
/// `days` is an absolute clock (days since epoch) so that the phase of a
/// calendar date does not depend on where the history starts.
pub fn fourier_columns(days: &[f64], period: f64, harmonics: &[usize]) -> Vec<Vec<f64>> {
    let mut columns = Vec::with_capacity(2 * harmonics.len());
    for &k in harmonics {
        let omega = 2.0 * PI * k as f64 / period;
        columns.push(days.iter().map(|t| (omega * t).sin()).collect());
        columns.push(days.iter().map(|t| (omega * t).cos()).collect());
    }
    columns
}

/// Harmonics of `period` that the sampling interval can resolve.
///
/// A harmonic whose period is shorter than two sampling intervals aliases
/// onto slower terms (and onto the trend), so it is left out of the design.
pub fn resolvable_harmonics(period: f64, order: usize, sampling_days: f64) -> Vec<usize> {
    (1..=order)
        .filter(|&k| period / k as f64 >= 2.0 * sampling_days)
        .collect()
}

/// Location of one seasonality inside the stacked Fourier design.
#[derive(Debug, Clone, PartialEq)]
pub struct SeasonalBlock {
    pub name: String,
    pub period_days: f64,
    pub harmonics: Vec<usize>,
    pub prior_scale: f64,
    pub columns: Range<usize>,
}

impl SeasonalBlock {
    /// Lay out blocks back to back, dropping unresolvable harmonics.
    pub fn layout(
        seasonalities: &[Seasonality],
        default_prior: f64,
        sampling_days: f64,
    ) -> Vec<Self> {
        let mut offset = 0;
        seasonalities
            .iter()
            .map(|s| {
                let harmonics =
                    resolvable_harmonics(s.period_days, s.fourier_order, sampling_days);
                let width = 2 * harmonics.len();
                let block = SeasonalBlock {
                    name: s.name.clone(),
                    period_days: s.period_days,
                    harmonics,
                    prior_scale: s.prior_scale.unwrap_or(default_prior),
                    columns: offset..offset + width,
                };
                offset += width;
                block
            })
            .collect()
    }
}

/// Stack the Fourier columns of every block into one design.
pub fn seasonal_design(days: &[f64], blocks: &[SeasonalBlock]) -> Vec<Vec<f64>> {
    blocks
        .iter()
        .flat_map(|b| fourier_columns(days, b.period_days, &b.harmonics))
        .collect()
}

/// Indices of potential changepoints within the history.
///
/// Changepoints are spread evenly over the first `range` share of the
/// history. The first observation is never a changepoint, and the count is
/// reduced when the history is too short to hold `requested` of them.
pub fn changepoint_indices(n: usize, requested: usize, range: f64) -> Vec<usize> {
    let hist_size = (n as f64 * range).floor() as usize;
    if hist_size < 2 {
        return vec![];
    }
    let count = requested.min(hist_size - 1);
    if count == 0 {
        return vec![];
    }

    let last = (hist_size - 1) as f64;
    (1..=count)
        .map(|i| (last * i as f64 / count as f64).round() as usize)
        .collect()
}

/// Hinge `max(t − c, 0)`.
pub fn hinge(t: f64, c: f64) -> f64 {
    if t > c {
        t - c
    } else {
        0.0
    }
}

/// Trend design `[1, t, (t − c₁)₊, …, (t − c_S)₊]` over scaled time.
pub fn trend_design(t: &[f64], changepoints: &[f64]) -> Vec<Vec<f64>> {
    let mut columns = Vec::with_capacity(changepoints.len() + 2);
    columns.push(vec![1.0; t.len()]);
    columns.push(t.to_vec());
    for &c in changepoints {
        columns.push(t.iter().map(|&ti| hinge(ti, c)).collect());
    }
    columns
}

/// Evaluate `Σⱼ columns[j][i] · coef[j]` for every row.
pub fn combine(columns: &[Vec<f64>], coef: &[f64], rows: usize) -> Vec<f64> {
    let mut out = vec![0.0; rows];
    for (col, c) in columns.iter().zip(coef) {
        if *c == 0.0 {
            continue;
        }
        for (o, x) in out.iter_mut().zip(col) {
            *o += x * c;
        }
    }
    out
}
