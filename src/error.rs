//! Error types for the trendcast library.

use thiserror::Error;

/// Result type alias for ranking and forecasting operations.
pub type Result<T> = std::result::Result<T, ForecastError>;

/// Errors that can occur while loading, ranking or forecasting series.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ForecastError {
    /// Input table is malformed or misaligned. Always fatal for loading.
    #[error("schema error: {0}")]
    Schema(String),

    /// Not enough periods for the requested ranking windows or seasonal fit.
    #[error("insufficient history: need at least {needed} periods, got {got}")]
    InsufficientHistory { needed: usize, got: usize },

    /// The model fit did not settle within its iteration budget.
    #[error("model fit did not converge after {iterations} iterations")]
    NonConvergence { iterations: usize },

    /// Series name is not present in the store.
    #[error("unknown series: {0}")]
    UnknownSeries(String),

    /// Invalid parameter value.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// Input file could not be read.
    #[error("io error: {0}")]
    Io(String),

    /// Numerical breakdown (e.g. a singular system).
    #[error("computation error: {0}")]
    Computation(String),
}

impl ForecastError {
    /// Whether the error is scoped to a single series.
    ///
    /// Scoped errors disable the affected operation for that series only;
    /// everything else aborts the run.
    pub fn is_series_scoped(&self) -> bool {
        matches!(
            self,
            ForecastError::InsufficientHistory { .. }
                | ForecastError::NonConvergence { .. }
                | ForecastError::Computation(_)
        )
    }
}

impl From<std::io::Error> for ForecastError {
    fn from(err: std::io::Error) -> Self {
        ForecastError::Io(err.to_string())
    }
}

impl From<csv::Error> for ForecastError {
    fn from(err: csv::Error) -> Self {
        if err.is_io_error() {
            ForecastError::Io(err.to_string())
        } else {
            ForecastError::Schema(err.to_string())
        }
    }
}
