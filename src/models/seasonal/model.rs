//! Seasonal trend forecaster: piecewise-linear trend with Fourier seasonality.

use super::config::{SeasonalConfig, SeasonalityMode};
use super::features::{
    changepoint_indices, combine, seasonal_design, trend_design, SeasonalBlock,
};
use super::fit::Problem;
use crate::core::{days_since_epoch, Cadence, ForecastResult, SeriesView, TimePoint};
use crate::error::{ForecastError, Result};
use crate::models::Forecaster;
use crate::utils::calculate_metrics;
use crate::utils::stats::{interval_z, mad, max_abs, mean_abs, median};
use tracing::debug;

/// Lower bound on the noise scale, relative to the series maximum.
const NOISE_FLOOR: f64 = 1e-3;
/// Consistency constant turning a MAD into a normal standard deviation.
const MAD_TO_SIGMA: f64 = 1.4826;
/// Maximum number of fits while the noise scale is re-estimated.
const NOISE_ROUNDS: usize = 10;
/// Relative change of the noise scale that ends re-estimation.
const NOISE_TOLERANCE: f64 = 0.1;

/// Trend plus multiplicative (or additive) Fourier seasonality.
///
/// The trend is piecewise linear with potential slope changes spread over
/// the early part of the history; a Laplace prior controlled by
/// `changepoint_prior_scale` keeps most of them at zero. Each seasonality is
/// a truncated Fourier series on the calendar clock, so the same date gets
/// the same seasonal phase regardless of where the history starts.
///
/// # Example
/// ```
/// use trendcast::core::{SeriesView, TimePoint};
/// use trendcast::models::{Forecaster, SeasonalForecaster};
///
/// let timestamps: Vec<TimePoint> = (0..36)
///     .map(|i| TimePoint::from_ymd_opt(2021 + i / 12, (i % 12) as u32 + 1, 1).unwrap())
///     .collect();
/// let values: Vec<f64> = (0..36).map(|i| 100.0 + 2.0 * i as f64).collect();
/// let series = SeriesView::new("linear", &timestamps, &values).unwrap();
///
/// let forecast = SeasonalForecaster::default().forecast(series, 6).unwrap();
/// assert_eq!(forecast.len(), 42);
/// assert_eq!(forecast.trend().len(), 42);
/// ```
#[derive(Debug, Clone, Default)]
pub struct SeasonalForecaster {
    config: SeasonalConfig,
}

impl SeasonalForecaster {
    /// Create a forecaster after checking the configuration.
    pub fn new(config: SeasonalConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &SeasonalConfig {
        &self.config
    }

    /// Fit the model on the full history of `series`.
    pub fn fit(&self, series: SeriesView<'_>) -> Result<SeasonalFit> {
        let config = &self.config;
        let n = series.len();
        if n < config.min_history {
            return Err(ForecastError::InsufficientHistory {
                needed: config.min_history,
                got: n,
            });
        }

        let timestamps = series.timestamps();
        let values = series.values();
        if values.iter().any(|v| !v.is_finite()) {
            return Err(ForecastError::Schema(format!(
                "series '{}' contains non-finite values",
                series.name()
            )));
        }
        let cadence = Cadence::infer(timestamps).ok_or(ForecastError::InsufficientHistory {
            needed: 2,
            got: n,
        })?;

        let days: Vec<f64> = timestamps.iter().map(|&tp| days_since_epoch(tp)).collect();
        let start_day = days[0];
        let span_days = days[n - 1] - start_day;
        let t: Vec<f64> = days.iter().map(|d| (d - start_day) / span_days).collect();

        let y_scale = match max_abs(values) {
            m if m > 0.0 => m,
            _ => 1.0,
        };
        let ys: Vec<f64> = values.iter().map(|v| v / y_scale).collect();

        let gaps: Vec<f64> = days.windows(2).map(|w| w[1] - w[0]).collect();
        let blocks = SeasonalBlock::layout(
            &config.active_seasonalities(),
            config.seasonality_prior_scale,
            median(&gaps),
        );
        let seasonal = seasonal_design(&days, &blocks);
        let prior_scales: Vec<f64> = blocks
            .iter()
            .flat_map(|b| std::iter::repeat(b.prior_scale).take(b.columns.len()))
            .collect();

        let cp_index = changepoint_indices(n, config.n_changepoints, config.changepoint_range);
        let changepoints: Vec<f64> = cp_index.iter().map(|&i| t[i]).collect();
        let changepoint_dates: Vec<TimePoint> = cp_index.iter().map(|&i| timestamps[i]).collect();
        let trend = trend_design(&t, &changepoints);

        // Start from a robust scale of the first differences, then follow the
        // residuals so that outliers stiffen the priors instead of the trend.
        let diffs: Vec<f64> = ys.windows(2).map(|w| w[1] - w[0]).collect();
        let mut noise_sd =
            (MAD_TO_SIGMA * mad(&diffs) / std::f64::consts::SQRT_2).max(NOISE_FLOOR);

        let mut problem = Problem {
            ys: &ys,
            trend: &trend,
            seasonal: &seasonal,
            prior_scales: &prior_scales,
            mode: config.mode,
            noise_var: noise_sd * noise_sd,
            changepoint_prior_scale: config.changepoint_prior_scale,
        };

        let mut initial = vec![0.0; trend.len()];
        initial[0] = ys[0];
        initial[1] = ys[n - 1] - ys[0];

        let mut solution = problem.solve(initial, config.max_iterations, config.tolerance)?;
        let mut iterations = solution.iterations;
        for _ in 1..NOISE_ROUNDS {
            let rms = (problem.rss(&solution.theta, &solution.beta) / n as f64).sqrt();
            let next_sd = rms.max(NOISE_FLOOR);
            if (next_sd - noise_sd).abs() <= NOISE_TOLERANCE * noise_sd {
                break;
            }
            noise_sd = next_sd;
            problem.noise_var = noise_sd * noise_sd;
            solution = problem.solve_from(
                solution.theta,
                solution.beta,
                config.max_iterations,
                config.tolerance,
            )?;
            iterations += solution.iterations;
        }
        let residual_sd = (problem.rss(&solution.theta, &solution.beta) / n as f64).sqrt();

        debug!(
            series = series.name(),
            observations = n,
            changepoints = changepoints.len(),
            seasonal_terms = seasonal.len(),
            iterations,
            noise_sd,
            objective = solution.objective,
            "fitted seasonal model"
        );

        Ok(SeasonalFit {
            series: series.name().to_string(),
            timestamps: timestamps.to_vec(),
            observed: values.to_vec(),
            cadence,
            mode: config.mode,
            blocks,
            changepoints,
            changepoint_dates,
            theta: solution.theta,
            beta: solution.beta,
            y_scale,
            start_day,
            span_days,
            residual_sd,
            noise_sd,
            z: interval_z(config.interval_width),
            iterations,
        })
    }
}

impl Forecaster for SeasonalForecaster {
    fn forecast(&self, series: SeriesView<'_>, horizon: usize) -> Result<ForecastResult> {
        self.fit(series)?.predict(horizon)
    }

    fn name(&self) -> &str {
        "SeasonalTrend"
    }
}

/// A fitted model, ready to extrapolate.
#[derive(Debug, Clone)]
pub struct SeasonalFit {
    series: String,
    timestamps: Vec<TimePoint>,
    observed: Vec<f64>,
    cadence: Cadence,
    mode: SeasonalityMode,
    blocks: Vec<SeasonalBlock>,
    /// Changepoint locations on the scaled clock.
    changepoints: Vec<f64>,
    changepoint_dates: Vec<TimePoint>,
    /// `[offset, slope, slope changes…]` on the scaled series.
    theta: Vec<f64>,
    beta: Vec<f64>,
    y_scale: f64,
    start_day: f64,
    span_days: f64,
    residual_sd: f64,
    /// Noise scale that weighed the priors in the final fit.
    noise_sd: f64,
    z: f64,
    iterations: usize,
}

impl SeasonalFit {
    pub fn series(&self) -> &str {
        &self.series
    }

    /// Number of solver iterations used.
    pub fn iterations(&self) -> usize {
        self.iterations
    }

    pub fn cadence(&self) -> Cadence {
        self.cadence
    }

    /// Noise standard deviation estimated from the residuals, in series units.
    pub fn noise_scale(&self) -> f64 {
        self.noise_sd * self.y_scale
    }

    /// Dates at which the trend was allowed to change slope.
    pub fn changepoint_dates(&self) -> &[TimePoint] {
        &self.changepoint_dates
    }

    /// Slope changes in the units of the series per unit of scaled time.
    pub fn slope_changes(&self) -> Vec<f64> {
        self.theta[2..].iter().map(|d| d * self.y_scale).collect()
    }

    /// Fitted values over the history followed by `horizon` future periods.
    pub fn predict(&self, horizon: usize) -> Result<ForecastResult> {
        let n = self.timestamps.len();
        let last = self.timestamps[n - 1];

        let mut timestamps = self.timestamps.clone();
        timestamps.extend(self.cadence.extend(last, horizon)?);
        let rows = timestamps.len();

        let days: Vec<f64> = timestamps.iter().map(|&tp| days_since_epoch(tp)).collect();
        let t: Vec<f64> = days
            .iter()
            .map(|d| (d - self.start_day) / self.span_days)
            .collect();

        let trend = combine(&trend_design(&t, &self.changepoints), &self.theta, rows);
        let design = seasonal_design(&days, &self.blocks);

        let mut seasonal = vec![0.0; rows];
        let mut components = Vec::with_capacity(self.blocks.len());
        for block in &self.blocks {
            let range = block.columns.clone();
            let values = combine(&design[range.clone()], &self.beta[range], rows);
            for (s, v) in seasonal.iter_mut().zip(&values) {
                *s += v;
            }
            components.push((block.name.clone(), values));
        }

        let predicted: Vec<f64> = trend
            .iter()
            .zip(&seasonal)
            .map(|(g, s)| match self.mode {
                SeasonalityMode::Multiplicative => g * (1.0 + s),
                SeasonalityMode::Additive => g + s,
            })
            .collect();

        // Future slope changes are drawn at the historical rate and size.
        let rate = self.changepoints.len() as f64;
        let change_scale = mean_abs(&self.theta[2..]) + 1e-8;
        let (lower, upper): (Vec<f64>, Vec<f64>) = t
            .iter()
            .zip(predicted.iter().zip(&seasonal))
            .map(|(&ti, (&p, &s))| {
                let ahead = (ti - 1.0).max(0.0);
                let trend_var = rate * 2.0 * change_scale.powi(2) * ahead.powi(3) / 3.0;
                let weight = match self.mode {
                    SeasonalityMode::Multiplicative => 1.0 + s,
                    SeasonalityMode::Additive => 1.0,
                };
                let half = self.z * (self.residual_sd.powi(2) + trend_var * weight * weight).sqrt();
                ((p - half) * self.y_scale, (p + half) * self.y_scale)
            })
            .unzip();

        let predicted: Vec<f64> = predicted.iter().map(|p| p * self.y_scale).collect();
        let trend: Vec<f64> = trend.iter().map(|g| g * self.y_scale).collect();
        let metrics = calculate_metrics(&self.observed, &predicted[..n])?;

        let component_scale = match self.mode {
            SeasonalityMode::Multiplicative => 1.0,
            SeasonalityMode::Additive => self.y_scale,
        };
        let mut builder = ForecastResult::builder(self.series.clone())
            .observed(self.timestamps.clone(), self.observed.clone())
            .timestamps(timestamps)
            .predicted(predicted)
            .intervals(lower, upper)
            .trend(trend)
            .changepoints(self.changepoint_dates.clone())
            .metrics(metrics);
        for (name, values) in components {
            builder = builder.component(name, values.iter().map(|v| v * component_scale).collect());
        }
        builder.build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{add_months, end_of_month};
    use crate::models::seasonal::Seasonality;
    use approx::assert_relative_eq;
    use std::f64::consts::PI;

    fn monthly(count: usize) -> Vec<TimePoint> {
        (0..count)
            .map(|i| {
                TimePoint::from_ymd_opt(2021 + (i / 12) as i32, (i % 12) as u32 + 1, 1).unwrap()
            })
            .collect()
    }

    fn seasonal_values(count: usize) -> Vec<f64> {
        (0..count)
            .map(|i| (100.0 + i as f64) * (1.0 + 0.3 * (2.0 * PI * i as f64 / 12.0).sin()))
            .collect()
    }

    #[test]
    fn forecast_extends_history_by_horizon() {
        let ts = monthly(36);
        let values = seasonal_values(36);
        let series = SeriesView::new("kw", &ts, &values).unwrap();

        let result = SeasonalForecaster::default().forecast(series, 6).unwrap();

        assert_eq!(result.len(), 42);
        assert_eq!(result.history_len(), 36);
        assert_eq!(result.horizon(), 6);
        assert_eq!(result.trend().len(), 42);
        assert_eq!(result.lower().len(), 42);
        assert_eq!(result.timestamps()[36], TimePoint::from_ymd_opt(2024, 1, 1).unwrap());
        assert_eq!(result.timestamps()[41], TimePoint::from_ymd_opt(2024, 6, 1).unwrap());
        assert!(result.predicted().iter().all(|p| p.is_finite()));
    }

    #[test]
    fn multiplicative_fit_tracks_seasonal_series() {
        let ts = monthly(36);
        let values = seasonal_values(36);
        let series = SeriesView::new("kw", &ts, &values).unwrap();

        let result = SeasonalForecaster::default().forecast(series, 6).unwrap();
        let metrics = result.metrics().unwrap();
        assert!(metrics.mae < 2.0, "mae = {}", metrics.mae);

        // Trend follows 100 + i without the seasonal swing.
        let trend = result.trend();
        assert_relative_eq!(trend[35], 135.0, epsilon = 3.0);
        assert!(trend.windows(2).all(|w| (w[1] - w[0]).abs() < 5.0));
    }

    #[test]
    fn components_are_reported_per_seasonality() {
        let ts = monthly(36);
        let values = seasonal_values(36);
        let series = SeriesView::new("kw", &ts, &values).unwrap();

        let result = SeasonalForecaster::default().forecast(series, 3).unwrap();
        let yearly = result.component("yearly").unwrap();
        let monthly_component = result.component("monthly").unwrap();

        assert_eq!(yearly.len(), 39);
        // Relative amplitude of the yearly swing.
        let peak = yearly.iter().fold(0.0_f64, |a, v| a.max(v.abs()));
        assert!((peak - 0.3).abs() < 0.1, "peak = {peak}");
        // A 30.5-day cycle cannot be seen in monthly data.
        assert!(monthly_component.iter().all(|v| *v == 0.0));
    }

    #[test]
    fn intervals_bracket_predictions_and_widen_ahead() {
        let ts = monthly(36);
        let values = seasonal_values(36);
        let series = SeriesView::new("kw", &ts, &values).unwrap();

        let result = SeasonalForecaster::default().forecast(series, 6).unwrap();
        for i in 0..result.len() {
            assert!(result.lower()[i] <= result.predicted()[i]);
            assert!(result.upper()[i] >= result.predicted()[i]);
        }
        let width = |i: usize| result.upper()[i] - result.lower()[i];
        assert!(width(41) >= width(35));
    }

    #[test]
    fn additive_mode_fits_linear_series() {
        let ts = monthly(24);
        let values: Vec<f64> = (0..24).map(|i| 50.0 + 3.0 * i as f64).collect();
        let series = SeriesView::new("line", &ts, &values).unwrap();

        let config = SeasonalConfig::default().with_mode(SeasonalityMode::Additive);
        let result = SeasonalForecaster::new(config)
            .unwrap()
            .forecast(series, 2)
            .unwrap();

        assert!(result.metrics().unwrap().mae < 1.0);
        assert!(result.predicted()[25] > result.predicted()[23]);
    }

    #[test]
    fn changepoints_lie_in_leading_share_of_history() {
        let ts = monthly(36);
        let values = seasonal_values(36);
        let series = SeriesView::new("kw", &ts, &values).unwrap();

        let fit = SeasonalForecaster::default().fit(series).unwrap();
        assert_eq!(fit.changepoint_dates().len(), 25);
        assert!(fit.changepoint_dates().iter().all(|d| *d <= ts[27]));
        assert_eq!(fit.slope_changes().len(), 25);
        assert_eq!(fit.cadence(), Cadence::Months(1));
    }

    #[test]
    fn noise_scale_follows_residual_outliers() {
        let ts = monthly(48);
        let values: Vec<f64> = seasonal_values(48)
            .into_iter()
            .enumerate()
            .map(|(i, v)| if i % 9 == 4 { 3.0 * v } else { v })
            .collect();
        let series = SeriesView::new("spiky", &ts, &values).unwrap();

        let fit = SeasonalForecaster::default().fit(series).unwrap();
        // Differences alone put the noise near 17; spikes push it far higher.
        assert!(fit.noise_scale() > 40.0, "noise = {}", fit.noise_scale());

        let result = fit.predict(0).unwrap();
        let trend = result.trend();
        assert!(
            trend.windows(2).all(|w| (w[1] - w[0]).abs() < 10.0),
            "trend bends at the spikes"
        );
    }

    #[test]
    fn future_periods_follow_day_spacing() {
        let start = TimePoint::from_ymd_opt(2023, 1, 1).unwrap();
        let ts: Vec<TimePoint> = (0..40)
            .map(|i| start.checked_add_days(chrono::Days::new(20 * i)).unwrap())
            .collect();
        let values: Vec<f64> = (0..40)
            .map(|i| {
                let day = 20.0 * i as f64;
                (100.0 + i as f64) * (1.0 + 0.3 * (2.0 * PI * day / 365.25).sin())
            })
            .collect();
        let series = SeriesView::new("fast", &ts, &values).unwrap();

        let fit = SeasonalForecaster::default().fit(series).unwrap();
        assert_eq!(fit.cadence(), Cadence::Days(20));
        let result = fit.predict(3).unwrap();
        assert_eq!(
            &result.timestamps()[40..],
            &[
                TimePoint::from_ymd_opt(2025, 3, 11).unwrap(),
                TimePoint::from_ymd_opt(2025, 3, 31).unwrap(),
                TimePoint::from_ymd_opt(2025, 4, 20).unwrap(),
            ]
        );
    }

    #[test]
    fn month_end_history_extends_on_month_ends() {
        // Jan 2023 .. Feb 2024, labeled by the last day of each month
        let start = TimePoint::from_ymd_opt(2023, 1, 1).unwrap();
        let ts: Vec<TimePoint> = (0..14)
            .map(|i| end_of_month(add_months(start, i).unwrap()).unwrap())
            .collect();
        let values = seasonal_values(14);
        let series = SeriesView::new("eom", &ts, &values).unwrap();

        let result = SeasonalForecaster::default().forecast(series, 3).unwrap();
        assert_eq!(
            &result.timestamps()[14..],
            &[
                TimePoint::from_ymd_opt(2024, 3, 31).unwrap(),
                TimePoint::from_ymd_opt(2024, 4, 30).unwrap(),
                TimePoint::from_ymd_opt(2024, 5, 31).unwrap(),
            ]
        );
    }

    #[test]
    fn short_history_is_rejected() {
        let ts = monthly(6);
        let values = vec![10.0; 6];
        let series = SeriesView::new("short", &ts, &values).unwrap();

        let err = SeasonalForecaster::default().forecast(series, 6).unwrap_err();
        assert_eq!(err, ForecastError::InsufficientHistory { needed: 12, got: 6 });
    }

    #[test]
    fn flat_zero_series_forecasts_zero() {
        let ts = monthly(24);
        let values = vec![0.0; 24];
        let series = SeriesView::new("silent", &ts, &values).unwrap();

        let result = SeasonalForecaster::default().forecast(series, 3).unwrap();
        assert!(result.predicted().iter().all(|p| p.abs() < 1e-6));
    }

    #[test]
    fn iteration_cap_surfaces_non_convergence() {
        let ts = monthly(36);
        let values = seasonal_values(36);
        let series = SeriesView::new("kw", &ts, &values).unwrap();

        let config = SeasonalConfig::default().with_max_iterations(1);
        let err = SeasonalForecaster::new(config)
            .unwrap()
            .forecast(series, 6)
            .unwrap_err();
        assert_eq!(err, ForecastError::NonConvergence { iterations: 1 });
    }

    #[test]
    fn custom_seasonality_is_honored() {
        let ts = monthly(36);
        let values = seasonal_values(36);
        let series = SeriesView::new("kw", &ts, &values).unwrap();

        let config = SeasonalConfig::default()
            .with_seasonalities(vec![])
            .add_seasonality(Seasonality::new("quarterly", 91.3125, 1));
        let result = SeasonalForecaster::new(config)
            .unwrap()
            .forecast(series, 0)
            .unwrap();
        assert!(result.component("quarterly").is_some());
        assert!(result.component("monthly").is_none());
        assert_eq!(result.len(), 36);
    }
}
