//! Configuration for the seasonal trend forecaster.

use crate::error::{ForecastError, Result};
use serde::{Deserialize, Serialize};

/// How seasonal components combine with the trend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeasonalityMode {
    /// `y = trend + seasonal`
    Additive,
    /// `y = trend * (1 + seasonal)`
    #[default]
    Multiplicative,
}

/// A periodic component modeled with Fourier terms.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Seasonality {
    /// Component name, reported alongside its values.
    pub name: String,
    /// Period in days.
    pub period_days: f64,
    /// Number of sine/cosine pairs.
    pub fourier_order: usize,
    /// Prior scale override; falls back to the config-wide value.
    #[serde(default)]
    pub prior_scale: Option<f64>,
}

impl Seasonality {
    pub fn new(name: impl Into<String>, period_days: f64, fourier_order: usize) -> Self {
        Self {
            name: name.into(),
            period_days,
            fourier_order,
            prior_scale: None,
        }
    }

    pub fn with_prior_scale(mut self, scale: f64) -> Self {
        self.prior_scale = Some(scale);
        self
    }

    /// Yearly seasonality: 365.25 days.
    pub fn yearly(fourier_order: usize) -> Self {
        Self::new("yearly", 365.25, fourier_order)
    }

    /// Monthly seasonality: 30.5 days.
    ///
    /// Needs observations less than about 15 days apart; on monthly data all
    /// of its harmonics alias and the reported component is all zeros.
    pub fn monthly(fourier_order: usize) -> Self {
        Self::new("monthly", 30.5, fourier_order)
    }
}

/// Tunable knobs of [`SeasonalForecaster`](super::SeasonalForecaster).
///
/// Defaults suit monthly search volumes: multiplicative yearly
/// seasonality (10 harmonics), a monthly 30.5-day component (5 harmonics)
/// and a flexible trend (`changepoint_prior_scale = 0.5`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SeasonalConfig {
    pub mode: SeasonalityMode,
    /// Fourier order of the yearly component; `None` disables it.
    pub yearly_fourier_order: Option<usize>,
    /// Additional seasonalities fitted next to the yearly one.
    pub seasonalities: Vec<Seasonality>,
    /// Scale of the Laplace prior on trend slope changes. Higher bends more.
    pub changepoint_prior_scale: f64,
    /// Maximum number of potential changepoints.
    pub n_changepoints: usize,
    /// Share of history in which changepoints may be placed.
    pub changepoint_range: f64,
    /// Scale of the Gaussian prior on Fourier coefficients.
    pub seasonality_prior_scale: f64,
    /// Width of the uncertainty interval, e.g. 0.8 for 80%.
    pub interval_width: f64,
    /// Iteration cap for the Gauss–Newton fit.
    pub max_iterations: usize,
    /// Relative objective change that counts as converged.
    pub tolerance: f64,
    /// Minimum observations required to fit.
    pub min_history: usize,
}

impl Default for SeasonalConfig {
    fn default() -> Self {
        Self {
            mode: SeasonalityMode::Multiplicative,
            yearly_fourier_order: Some(10),
            seasonalities: vec![Seasonality::monthly(5)],
            changepoint_prior_scale: 0.5,
            n_changepoints: 25,
            changepoint_range: 0.8,
            seasonality_prior_scale: 10.0,
            interval_width: 0.8,
            max_iterations: 1000,
            tolerance: 1e-6,
            min_history: 12,
        }
    }
}

impl SeasonalConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_mode(mut self, mode: SeasonalityMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_yearly_order(mut self, order: Option<usize>) -> Self {
        self.yearly_fourier_order = order;
        self
    }

    /// Replace the additional seasonalities.
    pub fn with_seasonalities(mut self, seasonalities: Vec<Seasonality>) -> Self {
        self.seasonalities = seasonalities;
        self
    }

    /// Add one more seasonality.
    pub fn add_seasonality(mut self, seasonality: Seasonality) -> Self {
        self.seasonalities.push(seasonality);
        self
    }

    pub fn with_changepoint_prior_scale(mut self, scale: f64) -> Self {
        self.changepoint_prior_scale = scale;
        self
    }

    pub fn with_n_changepoints(mut self, n: usize) -> Self {
        self.n_changepoints = n;
        self
    }

    pub fn with_changepoint_range(mut self, range: f64) -> Self {
        self.changepoint_range = range;
        self
    }

    pub fn with_seasonality_prior_scale(mut self, scale: f64) -> Self {
        self.seasonality_prior_scale = scale;
        self
    }

    pub fn with_interval_width(mut self, width: f64) -> Self {
        self.interval_width = width;
        self
    }

    pub fn with_max_iterations(mut self, iterations: usize) -> Self {
        self.max_iterations = iterations;
        self
    }

    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    pub fn with_min_history(mut self, periods: usize) -> Self {
        self.min_history = periods;
        self
    }

    /// All active seasonalities, yearly first.
    pub fn active_seasonalities(&self) -> Vec<Seasonality> {
        let mut all = Vec::with_capacity(self.seasonalities.len() + 1);
        if let Some(order) = self.yearly_fourier_order {
            all.push(Seasonality::yearly(order));
        }
        all.extend(self.seasonalities.iter().cloned());
        all
    }

    /// Check parameter ranges.
    pub fn validate(&self) -> Result<()> {
        let positive = |name: &str, v: f64| {
            if v > 0.0 && v.is_finite() {
                Ok(())
            } else {
                Err(ForecastError::InvalidParameter(format!(
                    "{name} must be positive, got {v}"
                )))
            }
        };

        positive("changepoint_prior_scale", self.changepoint_prior_scale)?;
        positive("seasonality_prior_scale", self.seasonality_prior_scale)?;
        positive("tolerance", self.tolerance)?;

        if !(self.changepoint_range > 0.0 && self.changepoint_range <= 1.0) {
            return Err(ForecastError::InvalidParameter(format!(
                "changepoint_range must be in (0, 1], got {}",
                self.changepoint_range
            )));
        }
        if !(0.0..1.0).contains(&self.interval_width) {
            return Err(ForecastError::InvalidParameter(format!(
                "interval_width must be in [0, 1), got {}",
                self.interval_width
            )));
        }
        if self.max_iterations == 0 {
            return Err(ForecastError::InvalidParameter(
                "max_iterations must be at least 1".to_string(),
            ));
        }
        if self.min_history < 2 {
            return Err(ForecastError::InvalidParameter(format!(
                "min_history must be at least 2, got {}",
                self.min_history
            )));
        }
        if self.yearly_fourier_order == Some(0) {
            return Err(ForecastError::InvalidParameter(
                "yearly fourier order must be positive".to_string(),
            ));
        }

        for s in &self.seasonalities {
            positive(&format!("period of '{}'", s.name), s.period_days)?;
            if s.fourier_order == 0 {
                return Err(ForecastError::InvalidParameter(format!(
                    "fourier order of '{}' must be positive",
                    s.name
                )));
            }
            if let Some(scale) = s.prior_scale {
                positive(&format!("prior scale of '{}'", s.name), scale)?;
            }
            if s.name == "yearly" && self.yearly_fourier_order.is_some() {
                return Err(ForecastError::InvalidParameter(
                    "seasonality name 'yearly' is reserved".to_string(),
                ));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_suit_monthly_volumes() {
        let config = SeasonalConfig::default();
        assert_eq!(config.mode, SeasonalityMode::Multiplicative);
        assert_eq!(config.changepoint_prior_scale, 0.5);
        assert_eq!(config.min_history, 12);

        let active = config.active_seasonalities();
        assert_eq!(active.len(), 2);
        assert_eq!(active[0].name, "yearly");
        assert_eq!(active[0].fourier_order, 10);
        assert_eq!(active[1].name, "monthly");
        assert_eq!(active[1].period_days, 30.5);
        assert_eq!(active[1].fourier_order, 5);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn builder_overrides_values() {
        let config = SeasonalConfig::new()
            .with_mode(SeasonalityMode::Additive)
            .with_yearly_order(None)
            .with_seasonalities(vec![])
            .add_seasonality(Seasonality::new("quarterly", 91.3, 2).with_prior_scale(1.0))
            .with_changepoint_prior_scale(0.05);

        assert_eq!(config.mode, SeasonalityMode::Additive);
        assert_eq!(config.active_seasonalities().len(), 1);
        assert_eq!(config.seasonalities[0].prior_scale, Some(1.0));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn validate_rejects_bad_ranges() {
        assert!(SeasonalConfig::new()
            .with_changepoint_prior_scale(0.0)
            .validate()
            .is_err());
        assert!(SeasonalConfig::new()
            .with_changepoint_range(1.5)
            .validate()
            .is_err());
        assert!(SeasonalConfig::new()
            .with_interval_width(1.0)
            .validate()
            .is_err());
        assert!(SeasonalConfig::new().with_max_iterations(0).validate().is_err());
        assert!(SeasonalConfig::new()
            .add_seasonality(Seasonality::new("bad", 7.0, 0))
            .validate()
            .is_err());
        assert!(SeasonalConfig::new()
            .add_seasonality(Seasonality::yearly(3))
            .validate()
            .is_err());
    }

    #[test]
    fn config_deserializes_with_defaults() {
        let config: SeasonalConfig =
            serde_json::from_str(r#"{"mode": "additive", "changepoint_prior_scale": 0.1}"#)
                .unwrap();
        assert_eq!(config.mode, SeasonalityMode::Additive);
        assert_eq!(config.changepoint_prior_scale, 0.1);
        assert_eq!(config.n_changepoints, 25);
        assert_eq!(config.seasonalities.len(), 1);
    }
}
