//! Forecasting models.

mod batch;
mod traits;

pub mod seasonal;

pub use batch::forecast_many;
pub use seasonal::{SeasonalConfig, SeasonalFit, SeasonalForecaster, Seasonality, SeasonalityMode};
pub use traits::{BoxedForecaster, Forecaster};
