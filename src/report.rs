//! Dashboard report: ranking, the selected forecast and comparison data.

use crate::core::{sub_months, ForecastRow, SeasonalComponent, TimePoint};
use crate::engine::{ForecastOutcome, TrendEngine};
use crate::error::{ForecastError, Result};
use crate::ranking::GrowthScore;
use crate::utils::AccuracyMetrics;
use serde::Serialize;
use std::fmt;

/// Forecast of the selected series, trimmed to the display window.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastPanel {
    pub series: String,
    pub rows: Vec<ForecastRow>,
    pub components: Vec<SeasonalComponent>,
    pub changepoints: Vec<TimePoint>,
    pub metrics: Option<AccuracyMetrics>,
}

/// One point of the comparison chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonPoint {
    pub timestamp: TimePoint,
    pub series: String,
    pub value: f64,
}

/// Everything the presentation layer shows for one selection.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardReport {
    pub ranked: Vec<GrowthScore>,
    pub selected: Option<String>,
    pub display_months: u32,
    pub cutoff: Option<TimePoint>,
    pub forecast: Option<ForecastPanel>,
    /// Why the selected series has no forecast.
    pub unavailable: Option<String>,
    pub comparison: Vec<ComparisonPoint>,
}

impl DashboardReport {
    /// Build the report for `selection`, or for the top ranked series.
    pub fn build(
        engine: &TrendEngine,
        selection: Option<&str>,
        display_months: u32,
    ) -> Result<Self> {
        let selected = selection
            .map(String::from)
            .or_else(|| engine.ranked().names().first().map(|s| s.to_string()));

        let mut forecast = None;
        let mut unavailable = None;
        let mut cutoff = engine
            .store()
            .timestamps()
            .last()
            .and_then(|&last| sub_months(last, display_months));

        if let Some(name) = &selected {
            match engine.forecast(name)? {
                ForecastOutcome::Available(result) => {
                    cutoff = result.display_cutoff(display_months);
                    let view = match cutoff {
                        Some(c) => result.filter_since(c),
                        None => result.full_view(),
                    };
                    let components = result
                        .components()
                        .iter()
                        .filter_map(|c| {
                            view.component(&c.name).map(|values| SeasonalComponent {
                                name: c.name.clone(),
                                values: values.to_vec(),
                            })
                        })
                        .collect();
                    forecast = Some(ForecastPanel {
                        series: name.clone(),
                        rows: view.rows(),
                        components,
                        changepoints: result.changepoints().to_vec(),
                        metrics: result.metrics().cloned(),
                    });
                }
                ForecastOutcome::Unavailable { reason, .. } => {
                    unavailable = Some(reason.to_string());
                }
            }
        }

        let comparison = engine
            .comparison(cutoff)
            .into_iter()
            .map(|r| ComparisonPoint {
                timestamp: r.timestamp,
                series: r.series.to_string(),
                value: r.value,
            })
            .collect();

        Ok(Self {
            ranked: engine.ranked().scores().to_vec(),
            selected,
            display_months,
            cutoff,
            forecast,
            unavailable,
            comparison,
        })
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| ForecastError::Computation(format!("cannot serialize report: {e}")))
    }
}

impl fmt::Display for DashboardReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Top series by growth")?;
        if self.ranked.is_empty() {
            writeln!(f, "  (not enough history to rank)")?;
        }
        for (i, score) in self.ranked.iter().enumerate() {
            writeln!(f, "  {}. {:<24} {:>+9.1}%", i + 1, score.series, score.growth)?;
        }

        if let Some(name) = &self.selected {
            writeln!(f)?;
            writeln!(f, "Forecast: {name} (last {} months)", self.display_months)?;
        }
        if let Some(reason) = &self.unavailable {
            writeln!(f, "  forecast unavailable: {reason}")?;
        }
        if let Some(panel) = &self.forecast {
            writeln!(
                f,
                "  {:<10} {:>10} {:>10} {:>10} {:>10} {:>10}",
                "period", "observed", "predicted", "lower", "upper", "trend"
            )?;
            for row in &panel.rows {
                let observed = row
                    .observed
                    .map(|v| format!("{v:.1}"))
                    .unwrap_or_else(|| "-".to_string());
                writeln!(
                    f,
                    "  {:<10} {:>10} {:>10.1} {:>10.1} {:>10.1} {:>10.1}",
                    row.timestamp.format("%Y-%m").to_string(),
                    observed,
                    row.predicted,
                    row.lower,
                    row.upper,
                    row.trend
                )?;
            }
            if let Some(m) = &panel.metrics {
                writeln!(f, "  in-sample MAE {:.2}, RMSE {:.2}", m.mae, m.rmse)?;
            }
        }

        if !self.comparison.is_empty() {
            writeln!(f)?;
            writeln!(f, "Comparison")?;
            let mut current: Option<&str> = None;
            for point in &self.comparison {
                if current != Some(point.series.as_str()) {
                    writeln!(f, "  {}", point.series)?;
                    current = Some(point.series.as_str());
                }
                writeln!(f, "    {} {:.1}", point.timestamp.format("%Y-%m"), point.value)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::core::SeriesStore;

    fn engine(n: usize) -> TrendEngine {
        let ts: Vec<TimePoint> = (0..n)
            .map(|i| {
                TimePoint::from_ymd_opt(2022 + (i / 12) as i32, (i % 12) as u32 + 1, 1).unwrap()
            })
            .collect();
        let store = SeriesStore::builder()
            .timestamps(ts)
            .series("rising", (0..n).map(|i| 20.0 + 2.0 * i as f64).collect())
            .series("flat", vec![9.0; n])
            .build()
            .unwrap();
        TrendEngine::new(store, EngineConfig::default()).unwrap()
    }

    #[test]
    fn defaults_to_top_ranked_series() {
        let report = DashboardReport::build(&engine(24), None, 6).unwrap();
        assert_eq!(report.selected.as_deref(), Some("rising"));

        let panel = report.forecast.as_ref().unwrap();
        // 24 history + 6 ahead; 6 months back from the last gives 7 rows
        assert_eq!(panel.rows.len(), 7);
        assert!(panel.rows[0].observed.is_some());
        assert!(panel.rows[6].observed.is_none());
        assert_eq!(panel.components.len(), 2);
        assert_eq!(panel.components[0].values.len(), 7);
        assert!(report.unavailable.is_none());
        assert!(report.comparison.iter().all(|p| Some(p.timestamp) >= report.cutoff));
    }

    #[test]
    fn unavailable_forecast_is_reported() {
        let report = DashboardReport::build(&engine(8), Some("flat"), 6).unwrap();
        assert!(report.forecast.is_none());
        assert!(report.unavailable.as_deref().unwrap().contains("insufficient history"));
        assert!(report.to_string().contains("forecast unavailable"));
    }

    #[test]
    fn renders_text_and_json() {
        let report = DashboardReport::build(&engine(24), Some("flat"), 12).unwrap();
        let text = report.to_string();
        assert!(text.contains("Top series by growth"));
        assert!(text.contains("Forecast: flat"));

        let json: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();
        assert_eq!(json["selected"], "flat");
        assert_eq!(json["ranked"][0]["series"], "rising");
    }
}
