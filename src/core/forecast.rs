//! Forecast result structure and windowed views over it.

use crate::core::calendar::{sub_months, TimePoint};
use crate::error::{ForecastError, Result};
use crate::utils::AccuracyMetrics;
use serde::Serialize;

/// One named seasonal component evaluated over the forecast range.
///
/// In multiplicative mode values are relative factors (0.1 = +10% of trend);
/// in additive mode they are in the units of the series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeasonalComponent {
    pub name: String,
    pub values: Vec<f64>,
}

/// Fitted values and extrapolation for one series.
///
/// `timestamps`, `predicted`, `lower`, `upper`, `trend` and every seasonal
/// component are aligned over history followed by the horizon. `observed`
/// covers the history only.
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastResult {
    series: String,
    observed_timestamps: Vec<TimePoint>,
    observed: Vec<f64>,
    timestamps: Vec<TimePoint>,
    predicted: Vec<f64>,
    lower: Vec<f64>,
    upper: Vec<f64>,
    trend: Vec<f64>,
    components: Vec<SeasonalComponent>,
    changepoints: Vec<TimePoint>,
    metrics: Option<AccuracyMetrics>,
}

/// Builder used by models to assemble a [`ForecastResult`].
#[derive(Debug, Clone, Default)]
pub struct ForecastResultBuilder {
    series: String,
    observed_timestamps: Vec<TimePoint>,
    observed: Vec<f64>,
    timestamps: Vec<TimePoint>,
    predicted: Vec<f64>,
    lower: Vec<f64>,
    upper: Vec<f64>,
    trend: Vec<f64>,
    components: Vec<SeasonalComponent>,
    changepoints: Vec<TimePoint>,
    metrics: Option<AccuracyMetrics>,
}

impl ForecastResultBuilder {
    pub fn new(series: impl Into<String>) -> Self {
        Self {
            series: series.into(),
            ..Self::default()
        }
    }

    pub fn observed(mut self, timestamps: Vec<TimePoint>, values: Vec<f64>) -> Self {
        self.observed_timestamps = timestamps;
        self.observed = values;
        self
    }

    pub fn timestamps(mut self, timestamps: Vec<TimePoint>) -> Self {
        self.timestamps = timestamps;
        self
    }

    pub fn predicted(mut self, predicted: Vec<f64>) -> Self {
        self.predicted = predicted;
        self
    }

    pub fn intervals(mut self, lower: Vec<f64>, upper: Vec<f64>) -> Self {
        self.lower = lower;
        self.upper = upper;
        self
    }

    pub fn trend(mut self, trend: Vec<f64>) -> Self {
        self.trend = trend;
        self
    }

    pub fn component(mut self, name: impl Into<String>, values: Vec<f64>) -> Self {
        self.components.push(SeasonalComponent {
            name: name.into(),
            values,
        });
        self
    }

    pub fn changepoints(mut self, changepoints: Vec<TimePoint>) -> Self {
        self.changepoints = changepoints;
        self
    }

    pub fn metrics(mut self, metrics: AccuracyMetrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Validate alignment and build the result.
    pub fn build(self) -> Result<ForecastResult> {
        let n = self.timestamps.len();
        if self.observed.len() != self.observed_timestamps.len() {
            return Err(ForecastError::Computation(format!(
                "observed series has {} timestamps but {} values",
                self.observed_timestamps.len(),
                self.observed.len()
            )));
        }
        let aligned = [
            ("predicted", self.predicted.len()),
            ("lower", self.lower.len()),
            ("upper", self.upper.len()),
            ("trend", self.trend.len()),
        ];
        for (label, len) in aligned
            .into_iter()
            .chain(self.components.iter().map(|c| (c.name.as_str(), c.values.len())))
        {
            if len != n {
                return Err(ForecastError::Computation(format!(
                    "{label} has {len} points, expected {n}"
                )));
            }
        }
        if self.observed.len() > n {
            return Err(ForecastError::Computation(
                "observed history is longer than the forecast range".to_string(),
            ));
        }

        Ok(ForecastResult {
            series: self.series,
            observed_timestamps: self.observed_timestamps,
            observed: self.observed,
            timestamps: self.timestamps,
            predicted: self.predicted,
            lower: self.lower,
            upper: self.upper,
            trend: self.trend,
            components: self.components,
            changepoints: self.changepoints,
            metrics: self.metrics,
        })
    }
}

impl ForecastResult {
    pub fn builder(series: impl Into<String>) -> ForecastResultBuilder {
        ForecastResultBuilder::new(series)
    }

    pub fn series(&self) -> &str {
        &self.series
    }

    /// Number of points in the full range (history + horizon).
    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    /// Number of in-sample points.
    pub fn history_len(&self) -> usize {
        self.observed.len()
    }

    /// Number of out-of-sample points.
    pub fn horizon(&self) -> usize {
        self.len() - self.history_len()
    }

    pub fn observed_timestamps(&self) -> &[TimePoint] {
        &self.observed_timestamps
    }

    pub fn observed(&self) -> &[f64] {
        &self.observed
    }

    pub fn timestamps(&self) -> &[TimePoint] {
        &self.timestamps
    }

    pub fn predicted(&self) -> &[f64] {
        &self.predicted
    }

    pub fn lower(&self) -> &[f64] {
        &self.lower
    }

    pub fn upper(&self) -> &[f64] {
        &self.upper
    }

    /// Trend curve with seasonal effects removed.
    pub fn trend(&self) -> &[f64] {
        &self.trend
    }

    pub fn components(&self) -> &[SeasonalComponent] {
        &self.components
    }

    pub fn component(&self, name: &str) -> Option<&[f64]> {
        self.components
            .iter()
            .find(|c| c.name == name)
            .map(|c| c.values.as_slice())
    }

    /// Dates at which the trend was allowed to change slope.
    pub fn changepoints(&self) -> &[TimePoint] {
        &self.changepoints
    }

    /// In-sample accuracy of the fitted values.
    pub fn metrics(&self) -> Option<&AccuracyMetrics> {
        self.metrics.as_ref()
    }

    /// Last predicted timestamp.
    pub fn last_timestamp(&self) -> Option<TimePoint> {
        self.timestamps.last().copied()
    }

    /// Cutoff that keeps the most recent `months` months of the range,
    /// measured back from the last predicted timestamp.
    pub fn display_cutoff(&self, months: u32) -> Option<TimePoint> {
        self.last_timestamp().and_then(|last| sub_months(last, months))
    }

    /// View trimmed to timestamps at or after `cutoff`.
    pub fn filter_since(&self, cutoff: TimePoint) -> ForecastView<'_> {
        ForecastView {
            result: self,
            observed_start: self.observed_timestamps.partition_point(|t| *t < cutoff),
            range_start: self.timestamps.partition_point(|t| *t < cutoff),
        }
    }

    /// View over the most recent `months` months of the range.
    pub fn recent(&self, months: u32) -> ForecastView<'_> {
        match self.display_cutoff(months) {
            Some(cutoff) => self.filter_since(cutoff),
            None => self.full_view(),
        }
    }

    /// Untrimmed view.
    pub fn full_view(&self) -> ForecastView<'_> {
        ForecastView {
            result: self,
            observed_start: 0,
            range_start: 0,
        }
    }
}

/// Read-only window over a [`ForecastResult`].
///
/// Views share the underlying result; creating one never copies or mutates.
#[derive(Debug, Clone, Copy)]
pub struct ForecastView<'a> {
    result: &'a ForecastResult,
    observed_start: usize,
    range_start: usize,
}

/// One row of a forecast view, for serialization.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastRow {
    pub timestamp: TimePoint,
    pub observed: Option<f64>,
    pub predicted: f64,
    pub lower: f64,
    pub upper: f64,
    pub trend: f64,
}

impl<'a> ForecastView<'a> {
    pub fn result(&self) -> &'a ForecastResult {
        self.result
    }

    pub fn series(&self) -> &'a str {
        &self.result.series
    }

    pub fn len(&self) -> usize {
        self.result.timestamps.len() - self.range_start
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn observed_timestamps(&self) -> &'a [TimePoint] {
        &self.result.observed_timestamps[self.observed_start..]
    }

    pub fn observed(&self) -> &'a [f64] {
        &self.result.observed[self.observed_start..]
    }

    pub fn timestamps(&self) -> &'a [TimePoint] {
        &self.result.timestamps[self.range_start..]
    }

    pub fn predicted(&self) -> &'a [f64] {
        &self.result.predicted[self.range_start..]
    }

    pub fn lower(&self) -> &'a [f64] {
        &self.result.lower[self.range_start..]
    }

    pub fn upper(&self) -> &'a [f64] {
        &self.result.upper[self.range_start..]
    }

    pub fn trend(&self) -> &'a [f64] {
        &self.result.trend[self.range_start..]
    }

    pub fn component(&self, name: &str) -> Option<&'a [f64]> {
        self.result
            .component(name)
            .map(|values| &values[self.range_start..])
    }

    /// Rows joining observed values onto the forecast range by timestamp.
    pub fn rows(&self) -> Vec<ForecastRow> {
        let observed_ts = self.observed_timestamps();
        let observed = self.observed();
        let mut next_observed = 0;

        self.timestamps()
            .iter()
            .enumerate()
            .map(|(i, ts)| {
                while next_observed < observed_ts.len() && observed_ts[next_observed] < *ts {
                    next_observed += 1;
                }
                let actual = (next_observed < observed_ts.len()
                    && observed_ts[next_observed] == *ts)
                    .then(|| observed[next_observed]);
                ForecastRow {
                    timestamp: *ts,
                    observed: actual,
                    predicted: self.predicted()[i],
                    lower: self.lower()[i],
                    upper: self.upper()[i],
                    trend: self.trend()[i],
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::calendar::add_months;
    use chrono::NaiveDate;

    fn months(n: usize) -> Vec<TimePoint> {
        let start = NaiveDate::from_ymd_opt(2023, 1, 1).unwrap();
        (0..n).map(|i| add_months(start, i as u32).unwrap()).collect()
    }

    fn sample_result() -> ForecastResult {
        let range = months(6);
        let history = range[..4].to_vec();
        ForecastResult::builder("rust")
            .observed(history, vec![1.0, 2.0, 3.0, 4.0])
            .timestamps(range)
            .predicted(vec![1.1, 2.1, 3.1, 4.1, 5.1, 6.1])
            .intervals(vec![0.0; 6], vec![10.0; 6])
            .trend(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0])
            .component("yearly", vec![0.1; 6])
            .build()
            .unwrap()
    }

    #[test]
    fn result_reports_history_and_horizon() {
        let result = sample_result();
        assert_eq!(result.series(), "rust");
        assert_eq!(result.len(), 6);
        assert_eq!(result.history_len(), 4);
        assert_eq!(result.horizon(), 2);
        assert_eq!(result.component("yearly").unwrap().len(), 6);
        assert!(result.component("weekly").is_none());
    }

    #[test]
    fn filter_since_trims_both_series() {
        let result = sample_result();
        let cutoff = months(6)[3];
        let view = result.filter_since(cutoff);

        assert_eq!(view.len(), 3);
        assert_eq!(view.observed(), &[4.0]);
        assert_eq!(view.predicted(), &[4.1, 5.1, 6.1]);
        assert_eq!(view.trend(), &[4.0, 5.0, 6.0]);
        assert!(view.timestamps().iter().all(|t| *t >= cutoff));
        assert_eq!(view.component("yearly").unwrap().len(), 3);
    }

    #[test]
    fn views_are_independent() {
        let result = sample_result();
        let wide = result.filter_since(months(6)[1]);
        let narrow = result.filter_since(months(6)[5]);

        assert_eq!(wide.len(), 5);
        assert_eq!(narrow.len(), 1);
        assert!(narrow.observed().is_empty());
        assert_eq!(result.len(), 6);
        assert_eq!(wide.predicted()[0], 2.1);
    }

    #[test]
    fn cutoff_after_range_yields_empty_view() {
        let result = sample_result();
        let view = result.filter_since(NaiveDate::from_ymd_opt(2030, 1, 1).unwrap());
        assert!(view.is_empty());
        assert!(view.rows().is_empty());
    }

    #[test]
    fn recent_counts_back_from_last_prediction() {
        let result = sample_result();
        assert_eq!(result.display_cutoff(2), Some(months(6)[3]));
        assert_eq!(result.recent(2).len(), 3);
        assert_eq!(result.recent(24).len(), 6);
    }

    #[test]
    fn rows_join_observed_values() {
        let result = sample_result();
        let rows = result.full_view().rows();
        assert_eq!(rows.len(), 6);
        assert_eq!(rows[0].observed, Some(1.0));
        assert_eq!(rows[3].observed, Some(4.0));
        assert_eq!(rows[4].observed, None);
        assert_eq!(rows[5].predicted, 6.1);
    }

    #[test]
    fn builder_rejects_misaligned_outputs() {
        let range = months(3);
        let err = ForecastResult::builder("x")
            .observed(range.clone(), vec![1.0, 2.0, 3.0])
            .timestamps(range)
            .predicted(vec![1.0, 2.0])
            .intervals(vec![0.0; 3], vec![0.0; 3])
            .trend(vec![0.0; 3])
            .build();
        assert!(matches!(err, Err(ForecastError::Computation(_))));
    }
}
