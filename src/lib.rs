//! # trendcast
//!
//! Growth ranking and seasonal trend forecasting for sets of monthly series.
//!
//! A [`SeriesStore`](core::SeriesStore) holds rectangular data loaded once
//! from CSV. [`GrowthRanker`](ranking::GrowthRanker) picks the series whose
//! recent average grew most over the preceding window, and
//! [`SeasonalForecaster`](models::SeasonalForecaster) fits a piecewise-linear
//! trend with yearly and custom Fourier seasonalities to extrapolate any one
//! of them. [`TrendEngine`](engine::TrendEngine) ties the pieces together.

#![allow(clippy::needless_range_loop)]

pub mod config;
pub mod core;
pub mod engine;
pub mod error;
pub mod io;
pub mod models;
pub mod ranking;
pub mod report;
pub mod utils;

pub use error::{ForecastError, Result};

pub mod prelude {
    pub use crate::config::EngineConfig;
    pub use crate::core::{ForecastResult, ForecastView, SeriesStore, SeriesView, TimePoint};
    pub use crate::engine::{ForecastOutcome, TrendEngine};
    pub use crate::error::{ForecastError, Result};
    pub use crate::models::{Forecaster, SeasonalConfig, SeasonalForecaster, SeasonalityMode};
    pub use crate::ranking::{GrowthRanker, RankedSelection, RankerConfig};
    pub use crate::utils::{calculate_metrics, AccuracyMetrics};
}
