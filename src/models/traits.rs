//! Forecaster trait defining the common interface for all models.

use crate::core::{ForecastResult, SeriesView};
use crate::error::Result;

/// Common interface for per-series forecasting models.
///
/// A forecaster is a pure function of its configuration and the series it
/// is given: every call fits afresh and owns its result, so one instance can
/// serve several threads at once.
///
/// This trait is object-safe and can be used with `Box<dyn Forecaster>`.
pub trait Forecaster: Send + Sync {
    /// Fit on the full history of `series` and extend it by `horizon`
    /// periods at the series' own cadence.
    fn forecast(&self, series: SeriesView<'_>, horizon: usize) -> Result<ForecastResult>;

    /// Get the model name.
    fn name(&self) -> &str;
}

/// Type alias for boxed forecaster trait objects.
///
/// # Example
///
/// ```
/// use trendcast::models::{BoxedForecaster, Forecaster, SeasonalForecaster};
///
/// let model: BoxedForecaster = Box::new(SeasonalForecaster::default());
/// assert_eq!(model.name(), "SeasonalTrend");
/// ```
pub type BoxedForecaster = Box<dyn Forecaster>;
