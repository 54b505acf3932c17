//! Decomposable trend + seasonality forecaster.
//!
//! `y(t) = g(t) · (1 + s(t))` in multiplicative mode and `g(t) + s(t)` in
//! additive mode, with `g` a piecewise-linear trend and `s` a sum of Fourier
//! seasonalities. See [`SeasonalForecaster`].

mod config;
mod features;
mod fit;
mod model;

pub use config::{SeasonalConfig, Seasonality, SeasonalityMode};
pub use model::{SeasonalFit, SeasonalForecaster};
