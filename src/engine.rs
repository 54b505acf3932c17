//! Ranking and forecasting over one immutable store.
//!
//! The engine ranks every series once when it is built and answers forecast
//! requests for single series afterwards. Failures that concern one series
//! only are reported as [`ForecastOutcome::Unavailable`] instead of errors.

use crate::config::EngineConfig;
use crate::core::{ForecastResult, LongRecord, SeriesStore, TimePoint};
use crate::error::{ForecastError, Result};
use crate::io::load_csv_path;
use crate::models::{forecast_many, Forecaster, SeasonalForecaster};
use crate::ranking::{GrowthRanker, RankedSelection};
use std::path::Path;
use tracing::{info, warn};

/// Result of a forecast request for one series.
#[derive(Debug, Clone, PartialEq)]
pub enum ForecastOutcome {
    Available(ForecastResult),
    /// The series exists but cannot be forecast.
    Unavailable {
        series: String,
        reason: ForecastError,
    },
}

impl ForecastOutcome {
    fn from_result(series: &str, result: Result<ForecastResult>) -> Result<Self> {
        match result {
            Ok(forecast) => Ok(ForecastOutcome::Available(forecast)),
            Err(reason) if reason.is_series_scoped() => {
                warn!(series, %reason, "forecast unavailable");
                Ok(ForecastOutcome::Unavailable {
                    series: series.to_string(),
                    reason,
                })
            }
            Err(err) => Err(err),
        }
    }

    pub fn series(&self) -> &str {
        match self {
            ForecastOutcome::Available(result) => result.series(),
            ForecastOutcome::Unavailable { series, .. } => series,
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, ForecastOutcome::Available(_))
    }

    pub fn result(&self) -> Option<&ForecastResult> {
        match self {
            ForecastOutcome::Available(result) => Some(result),
            ForecastOutcome::Unavailable { .. } => None,
        }
    }
}

/// Owns the data, the startup ranking and the forecaster.
#[derive(Debug, Clone)]
pub struct TrendEngine {
    store: SeriesStore,
    config: EngineConfig,
    forecaster: SeasonalForecaster,
    ranked: RankedSelection,
}

impl TrendEngine {
    /// Validate `config` and rank the store.
    ///
    /// A store too short for the ranking windows yields an empty selection;
    /// every series can still be forecast by name.
    pub fn new(store: SeriesStore, config: EngineConfig) -> Result<Self> {
        config.validate()?;
        let ranker = GrowthRanker::new(config.ranking)?;
        let forecaster = SeasonalForecaster::new(config.forecast.clone())?;

        let ranked = match ranker.rank(&store) {
            Ok(ranked) => ranked,
            Err(err) if err.is_series_scoped() => {
                warn!(%err, "ranking skipped");
                RankedSelection::default()
            }
            Err(err) => return Err(err),
        };

        info!(
            series = store.series_count(),
            periods = store.len(),
            ranked = ?ranked.names(),
            "engine ready"
        );

        Ok(Self {
            store,
            config,
            forecaster,
            ranked,
        })
    }

    /// Load a CSV file and build the engine on it.
    pub fn from_csv_path(path: impl AsRef<Path>, config: EngineConfig) -> Result<Self> {
        Self::new(load_csv_path(path)?, config)
    }

    pub fn store(&self) -> &SeriesStore {
        &self.store
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Series selected at startup, fastest growing first.
    pub fn ranked(&self) -> &RankedSelection {
        &self.ranked
    }

    /// Forecast one series over the configured horizon.
    ///
    /// Unknown names are an error; a series that cannot be modeled comes
    /// back as [`ForecastOutcome::Unavailable`].
    pub fn forecast(&self, name: &str) -> Result<ForecastOutcome> {
        let series = self.store.values_of(name)?;
        let result = self.forecaster.forecast(series, self.config.horizon);
        ForecastOutcome::from_result(name, result)
    }

    /// Forecast every ranked series in parallel, in ranking order.
    pub fn forecast_ranked(&self) -> Result<Vec<ForecastOutcome>> {
        let names = self.ranked.names();
        forecast_many(&self.forecaster, &self.store, &names, self.config.horizon)
            .into_iter()
            .map(|(name, result)| ForecastOutcome::from_result(&name, result))
            .collect()
    }

    /// Display cutoff for a forecast: the configured number of months
    /// before its last timestamp.
    pub fn display_cutoff(&self, forecast: &ForecastResult) -> Option<TimePoint> {
        forecast.display_cutoff(self.config.display_months)
    }

    /// Long-form observations of the ranked series at or after `since`.
    pub fn comparison(&self, since: Option<TimePoint>) -> Vec<LongRecord<'_>> {
        self.store.reshape_long_for(&self.ranked.names(), since)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ranking::RankerConfig;
    use std::f64::consts::PI;

    fn months(n: usize) -> Vec<TimePoint> {
        (0..n)
            .map(|i| {
                TimePoint::from_ymd_opt(2021 + (i / 12) as i32, (i % 12) as u32 + 1, 1).unwrap()
            })
            .collect()
    }

    fn store(n: usize) -> SeriesStore {
        let seasonal: Vec<f64> = (0..n)
            .map(|i| (50.0 + i as f64) * (1.0 + 0.2 * (2.0 * PI * i as f64 / 12.0).cos()))
            .collect();
        let surging: Vec<f64> = (0..n)
            .map(|i| if i + 3 >= n { 40.0 } else { 10.0 })
            .collect();
        SeriesStore::builder()
            .timestamps(months(n))
            .series("seasonal", seasonal)
            .series("surging", surging)
            .series("flat", vec![7.0; n])
            .build()
            .unwrap()
    }

    #[test]
    fn ranks_at_startup() {
        let engine = TrendEngine::new(store(36), EngineConfig::default()).unwrap();
        assert_eq!(engine.ranked().len(), 3);
        assert_eq!(engine.ranked().names()[0], "surging");
    }

    #[test]
    fn forecast_of_ranked_series() {
        let engine = TrendEngine::new(store(36), EngineConfig::default()).unwrap();
        let outcome = engine.forecast("seasonal").unwrap();
        let result = outcome.result().unwrap();
        assert_eq!(result.len(), 42);
        assert_eq!(outcome.series(), "seasonal");

        let cutoff = engine.display_cutoff(result).unwrap();
        assert_eq!(cutoff, TimePoint::from_ymd_opt(2023, 6, 1).unwrap());
        assert_eq!(result.filter_since(cutoff).len(), 13);
    }

    #[test]
    fn short_series_are_unavailable_not_fatal() {
        let engine = TrendEngine::new(store(8), EngineConfig::default()).unwrap();
        assert_eq!(engine.ranked().len(), 3);

        let outcome = engine.forecast("flat").unwrap();
        assert!(!outcome.is_available());
        assert_eq!(
            outcome,
            ForecastOutcome::Unavailable {
                series: "flat".to_string(),
                reason: ForecastError::InsufficientHistory { needed: 12, got: 8 },
            }
        );
    }

    #[test]
    fn unknown_series_is_an_error() {
        let engine = TrendEngine::new(store(24), EngineConfig::default()).unwrap();
        assert_eq!(
            engine.forecast("missing").unwrap_err(),
            ForecastError::UnknownSeries("missing".to_string())
        );
    }

    #[test]
    fn too_short_for_ranking_leaves_selection_empty() {
        let engine = TrendEngine::new(store(4), EngineConfig::default()).unwrap();
        assert!(engine.ranked().is_empty());
        assert!(engine.comparison(None).is_empty());
    }

    #[test]
    fn comparison_covers_ranked_series_since_cutoff() {
        let config = EngineConfig::default().with_ranking(RankerConfig::new().with_top_k(2));
        let engine = TrendEngine::new(store(24), config).unwrap();
        let cutoff = TimePoint::from_ymd_opt(2022, 7, 1).unwrap();

        let records = engine.comparison(Some(cutoff));
        assert_eq!(records.len(), 12);
        assert!(records.iter().all(|r| r.timestamp >= cutoff));
        assert!(records.iter().all(|r| engine.ranked().contains(r.series)));
    }

    #[test]
    fn forecasts_all_ranked_series() {
        let engine = TrendEngine::new(store(30), EngineConfig::default()).unwrap();
        let outcomes = engine.forecast_ranked().unwrap();
        assert_eq!(outcomes.len(), 3);
        assert_eq!(outcomes[0].series(), "surging");
        assert!(outcomes.iter().all(ForecastOutcome::is_available));
    }
}
