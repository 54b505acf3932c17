//! Rectangular store of named series sharing one time index.

use crate::core::calendar::{Cadence, TimePoint};
use crate::error::{ForecastError, Result};
use serde::Serialize;
use std::collections::HashMap;

/// One row of the long (melted) representation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LongRecord<'a> {
    pub timestamp: TimePoint,
    pub series: &'a str,
    pub value: f64,
}

/// Borrowed view of a single named series.
#[derive(Debug, Clone, Copy)]
pub struct SeriesView<'a> {
    name: &'a str,
    timestamps: &'a [TimePoint],
    values: &'a [f64],
}

impl<'a> SeriesView<'a> {
    /// Build a view from parallel slices.
    ///
    /// Used for ad-hoc series that do not live in a store; the caller is
    /// responsible for ordering.
    pub fn new(name: &'a str, timestamps: &'a [TimePoint], values: &'a [f64]) -> Result<Self> {
        if timestamps.len() != values.len() {
            return Err(ForecastError::Schema(format!(
                "series '{name}' has {} timestamps but {} values",
                timestamps.len(),
                values.len()
            )));
        }
        validate_timestamps(timestamps)?;
        Ok(Self {
            name,
            timestamps,
            values,
        })
    }

    pub fn name(&self) -> &'a str {
        self.name
    }

    pub fn timestamps(&self) -> &'a [TimePoint] {
        self.timestamps
    }

    pub fn values(&self) -> &'a [f64] {
        self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Ordered `(timestamp, value)` pairs.
    pub fn points(&self) -> impl Iterator<Item = (TimePoint, f64)> + 'a {
        self.timestamps
            .iter()
            .copied()
            .zip(self.values.iter().copied())
    }
}

/// Immutable, time-aligned collection of named non-negative series.
///
/// Every series shares the same strictly increasing timestamps. Construction
/// validates the whole table; a store that exists is always well formed.
#[derive(Debug, Clone)]
pub struct SeriesStore {
    timestamps: Vec<TimePoint>,
    names: Vec<String>,
    /// Column-major values: values[series][observation]
    values: Vec<Vec<f64>>,
    index: HashMap<String, usize>,
}

/// Builder for constructing a [`SeriesStore`] column by column.
#[derive(Debug, Clone, Default)]
pub struct SeriesStoreBuilder {
    timestamps: Vec<TimePoint>,
    columns: Vec<(String, Vec<f64>)>,
}

impl SeriesStoreBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn timestamps(mut self, timestamps: Vec<TimePoint>) -> Self {
        self.timestamps = timestamps;
        self
    }

    /// Append a named series.
    pub fn series(mut self, name: impl Into<String>, values: Vec<f64>) -> Self {
        self.columns.push((name.into(), values));
        self
    }

    pub fn build(self) -> Result<SeriesStore> {
        SeriesStore::new(self.timestamps, self.columns)
    }
}

impl SeriesStore {
    /// Create a store from a time index and named columns.
    ///
    /// Fails with [`ForecastError::Schema`] when timestamps are not strictly
    /// increasing, a column length differs from the index, names repeat, or a
    /// value is negative or not finite.
    pub fn new(timestamps: Vec<TimePoint>, columns: Vec<(String, Vec<f64>)>) -> Result<Self> {
        validate_timestamps(&timestamps)?;

        if columns.is_empty() {
            return Err(ForecastError::Schema("no series columns".to_string()));
        }

        let mut names = Vec::with_capacity(columns.len());
        let mut values = Vec::with_capacity(columns.len());
        let mut index = HashMap::with_capacity(columns.len());

        for (name, series) in columns {
            if name.trim().is_empty() {
                return Err(ForecastError::Schema(format!(
                    "series column {} has an empty name",
                    names.len() + 1
                )));
            }
            if index.contains_key(&name) {
                return Err(ForecastError::Schema(format!(
                    "duplicate series name '{name}'"
                )));
            }
            if series.len() != timestamps.len() {
                return Err(ForecastError::Schema(format!(
                    "series '{name}' has {} values, expected {}",
                    series.len(),
                    timestamps.len()
                )));
            }
            if let Some((i, v)) = series
                .iter()
                .enumerate()
                .find(|(_, v)| !v.is_finite() || **v < 0.0)
            {
                return Err(ForecastError::Schema(format!(
                    "series '{name}' has invalid value {v} at {}",
                    timestamps[i]
                )));
            }

            index.insert(name.clone(), names.len());
            names.push(name);
            values.push(series);
        }

        Ok(Self {
            timestamps,
            names,
            values,
            index,
        })
    }

    pub fn builder() -> SeriesStoreBuilder {
        SeriesStoreBuilder::new()
    }

    /// Number of periods.
    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    /// Number of series.
    pub fn series_count(&self) -> usize {
        self.names.len()
    }

    pub fn timestamps(&self) -> &[TimePoint] {
        &self.timestamps
    }

    /// Series names in column order.
    pub fn series_names(&self) -> &[String] {
        &self.names
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Spacing of the time index, if at least two periods exist.
    pub fn cadence(&self) -> Option<Cadence> {
        Cadence::infer(&self.timestamps)
    }

    /// Borrow one series by name.
    pub fn values_of(&self, name: &str) -> Result<SeriesView<'_>> {
        let idx = *self
            .index
            .get(name)
            .ok_or_else(|| ForecastError::UnknownSeries(name.to_string()))?;
        Ok(self.view_at(idx))
    }

    /// Iterate over all series in column order.
    pub fn iter(&self) -> impl Iterator<Item = SeriesView<'_>> {
        (0..self.names.len()).map(move |idx| self.view_at(idx))
    }

    /// All series as `(timestamp, series, value)` records.
    ///
    /// Series-major: every period of the first column, then the second, and
    /// so on.
    pub fn reshape_long(&self) -> Vec<LongRecord<'_>> {
        self.iter()
            .flat_map(|view| {
                view.points().map(move |(timestamp, value)| LongRecord {
                    timestamp,
                    series: view.name(),
                    value,
                })
            })
            .collect()
    }

    /// Long records restricted to `names` and timestamps at or after `since`.
    ///
    /// Unknown names are skipped. Output follows the order of `names`.
    pub fn reshape_long_for<S: AsRef<str>>(
        &self,
        names: &[S],
        since: Option<TimePoint>,
    ) -> Vec<LongRecord<'_>> {
        let start = since
            .map(|cutoff| self.timestamps.partition_point(|t| *t < cutoff))
            .unwrap_or(0);

        names
            .iter()
            .filter_map(|name| self.index.get(name.as_ref()).copied())
            .flat_map(|idx| {
                let series = self.names[idx].as_str();
                self.timestamps[start..]
                    .iter()
                    .zip(&self.values[idx][start..])
                    .map(move |(timestamp, value)| LongRecord {
                        timestamp: *timestamp,
                        series,
                        value: *value,
                    })
            })
            .collect()
    }

    fn view_at(&self, idx: usize) -> SeriesView<'_> {
        SeriesView {
            name: &self.names[idx],
            timestamps: &self.timestamps,
            values: &self.values[idx],
        }
    }
}

fn validate_timestamps(timestamps: &[TimePoint]) -> Result<()> {
    for w in timestamps.windows(2) {
        if w[1] <= w[0] {
            return Err(ForecastError::Schema(format!(
                "timestamps must be strictly increasing ({} follows {})",
                w[1], w[0]
            )));
        }
    }
    Ok(())
}
