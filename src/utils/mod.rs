//! Numeric helpers shared by the models.

mod least_squares;
mod metrics;
pub mod stats;

pub use least_squares::ridge_fit;
pub use metrics::{calculate_metrics, AccuracyMetrics};
