//! Selection of the fastest growing series.

mod growth;

pub use growth::{growth_rate, GrowthRanker, GrowthScore, RankedSelection, RankerConfig};
