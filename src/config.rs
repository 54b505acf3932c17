//! Engine configuration, loadable from JSON.

use crate::error::{ForecastError, Result};
use crate::models::SeasonalConfig;
use crate::ranking::RankerConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Everything the engine needs besides the data.
///
/// Missing fields fall back to their defaults, so a config file only has to
/// mention what it changes:
///
/// ```
/// use trendcast::config::EngineConfig;
///
/// let config = EngineConfig::from_json(r#"{"horizon": 12, "ranking": {"top_k": 3}}"#).unwrap();
/// assert_eq!(config.horizon, 12);
/// assert_eq!(config.ranking.top_k, 3);
/// assert_eq!(config.ranking.recent_window, 3);
/// assert_eq!(config.display_months, 12);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub ranking: RankerConfig,
    pub forecast: SeasonalConfig,
    /// Future periods appended to every forecast.
    pub horizon: usize,
    /// Months shown before the end of the forecast range.
    pub display_months: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            ranking: RankerConfig::default(),
            forecast: SeasonalConfig::default(),
            horizon: 6,
            display_months: 12,
        }
    }
}

impl EngineConfig {
    pub fn from_json(text: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(text)
            .map_err(|e| ForecastError::InvalidParameter(format!("bad config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Read and validate a JSON config file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| ForecastError::Io(format!("{}: {e}", path.display())))?;
        Self::from_json(&text)
    }

    pub fn with_ranking(mut self, ranking: RankerConfig) -> Self {
        self.ranking = ranking;
        self
    }

    pub fn with_forecast(mut self, forecast: SeasonalConfig) -> Self {
        self.forecast = forecast;
        self
    }

    pub fn with_horizon(mut self, horizon: usize) -> Self {
        self.horizon = horizon;
        self
    }

    pub fn with_display_months(mut self, months: u32) -> Self {
        self.display_months = months;
        self
    }

    pub fn validate(&self) -> Result<()> {
        self.ranking.validate()?;
        self.forecast.validate()?;
        if self.display_months == 0 {
            return Err(ForecastError::InvalidParameter(
                "display_months must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_dashboard() {
        let config = EngineConfig::default();
        assert_eq!(config.horizon, 6);
        assert_eq!(config.display_months, 12);
        assert_eq!(config.ranking.top_k, 5);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn nested_model_settings_are_read() {
        let config = EngineConfig::from_json(
            r#"{"forecast": {"mode": "additive", "yearly_fourier_order": 4}}"#,
        )
        .unwrap();
        assert_eq!(config.forecast.yearly_fourier_order, Some(4));
        assert_eq!(config.forecast.changepoint_prior_scale, 0.5);
    }

    #[test]
    fn invalid_values_are_rejected() {
        assert!(EngineConfig::from_json(r#"{"ranking": {"prior_window": 0}}"#).is_err());
        assert!(EngineConfig::from_json(r#"{"display_months": 0}"#).is_err());
        assert!(EngineConfig::from_json("not json").is_err());
    }

    #[test]
    fn round_trips_through_json() {
        let config = EngineConfig::default().with_horizon(9);
        let text = serde_json::to_string(&config).unwrap();
        assert_eq!(EngineConfig::from_json(&text).unwrap(), config);
    }
}
