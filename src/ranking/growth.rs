//! Relative growth between two adjacent trailing windows.

use crate::core::{SeriesStore, SeriesView};
use crate::error::{ForecastError, Result};
use crate::utils::stats::mean;
use serde::{Deserialize, Serialize};
use tracing::info;

/// Window sizes and selection size of the ranking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RankerConfig {
    /// Periods in the most recent window.
    pub recent_window: usize,
    /// Periods in the window immediately before it.
    pub prior_window: usize,
    /// Number of series to keep.
    pub top_k: usize,
}

impl Default for RankerConfig {
    fn default() -> Self {
        Self {
            recent_window: 3,
            prior_window: 3,
            top_k: 5,
        }
    }
}

impl RankerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_recent_window(mut self, periods: usize) -> Self {
        self.recent_window = periods;
        self
    }

    pub fn with_prior_window(mut self, periods: usize) -> Self {
        self.prior_window = periods;
        self
    }

    pub fn with_top_k(mut self, k: usize) -> Self {
        self.top_k = k;
        self
    }

    /// Observations needed to fill both windows.
    pub fn required_history(&self) -> usize {
        self.recent_window + self.prior_window
    }

    pub fn validate(&self) -> Result<()> {
        if self.recent_window == 0 || self.prior_window == 0 {
            return Err(ForecastError::InvalidParameter(format!(
                "ranking windows must be positive, got recent={} prior={}",
                self.recent_window, self.prior_window
            )));
        }
        Ok(())
    }
}

/// Growth of one series, in percent.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GrowthScore {
    pub series: String,
    pub growth: f64,
}

/// Top series by descending growth.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RankedSelection {
    scores: Vec<GrowthScore>,
}

impl RankedSelection {
    /// Ranked series names, best first.
    pub fn names(&self) -> Vec<&str> {
        self.scores.iter().map(|s| s.series.as_str()).collect()
    }

    pub fn scores(&self) -> &[GrowthScore] {
        &self.scores
    }

    pub fn len(&self) -> usize {
        self.scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.scores.iter().any(|s| s.series == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &GrowthScore> {
        self.scores.iter()
    }
}

/// Percentage change from `prior` to `recent`.
///
/// A non-positive prior average gives 0: a series with no prior volume has
/// no defined relative growth and is ranked as flat.
///
/// # Example
/// ```
/// use trendcast::ranking::growth_rate;
///
/// assert_eq!(growth_rate(150.0, 100.0), 50.0);
/// assert_eq!(growth_rate(20.0, 0.0), 0.0);
/// ```
pub fn growth_rate(recent: f64, prior: f64) -> f64 {
    if prior > 0.0 {
        (recent - prior) / prior * 100.0
    } else {
        0.0
    }
}

/// Ranks series by the growth of their recent average over the prior one.
#[derive(Debug, Clone, Default)]
pub struct GrowthRanker {
    config: RankerConfig,
}

impl GrowthRanker {
    pub fn new(config: RankerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &RankerConfig {
        &self.config
    }

    /// Growth of a single series.
    ///
    /// The recent window is the last `recent_window` observations; the prior
    /// window is the `prior_window` observations just before it.
    pub fn score(&self, series: SeriesView<'_>) -> Result<GrowthScore> {
        let needed = self.config.required_history();
        let values = series.values();
        if values.len() < needed {
            return Err(ForecastError::InsufficientHistory {
                needed,
                got: values.len(),
            });
        }

        let recent_start = values.len() - self.config.recent_window;
        let prior_start = recent_start - self.config.prior_window;
        let recent = mean(&values[recent_start..]);
        let prior = mean(&values[prior_start..recent_start]);

        Ok(GrowthScore {
            series: series.name().to_string(),
            growth: growth_rate(recent, prior),
        })
    }

    /// Score every series of the store, in column order.
    pub fn score_all(&self, store: &SeriesStore) -> Result<Vec<GrowthScore>> {
        store.iter().map(|series| self.score(series)).collect()
    }

    /// The `top_k` series by descending growth.
    ///
    /// The sort is stable, so equal scores keep the column order of the
    /// store. Asking for more series than exist returns all of them.
    pub fn rank(&self, store: &SeriesStore) -> Result<RankedSelection> {
        let mut scores = self.score_all(store)?;
        scores.sort_by(|a, b| b.growth.total_cmp(&a.growth));
        scores.truncate(self.config.top_k.min(store.series_count()));

        info!(
            series = store.series_count(),
            selected = scores.len(),
            top = ?scores.first().map(|s| s.series.as_str()),
            "ranked series by growth"
        );

        Ok(RankedSelection { scores })
    }
}
