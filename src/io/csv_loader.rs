//! Wide CSV input: one period column followed by one column per series.

use crate::core::{parse_time_point, SeriesStore, TimePoint};
use crate::error::{ForecastError, Result};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use tracing::info;

/// Load a store from a CSV file on disk.
pub fn load_csv_path(path: impl AsRef<Path>) -> Result<SeriesStore> {
    let path = path.as_ref();
    let file = File::open(path)
        .map_err(|e| ForecastError::Io(format!("{}: {e}", path.display())))?;
    let store = load_csv(BufReader::new(file))?;
    info!(
        path = %path.display(),
        periods = store.len(),
        series = store.series_count(),
        "loaded series store"
    );
    Ok(store)
}

/// Load a store from CSV text.
///
/// The header names the series; its first cell (the period column label) is
/// ignored. Every data row must carry a parseable period label and one
/// numeric value per series. Any malformed cell aborts the whole load.
///
/// # Example
/// ```
/// use trendcast::io::load_csv;
///
/// let data = "month,alpha,beta\n2024-01,10,3\n2024-02,12,4\n";
/// let store = load_csv(data.as_bytes()).unwrap();
/// assert_eq!(store.series_names(), &["alpha", "beta"]);
/// assert_eq!(store.len(), 2);
/// ```
pub fn load_csv<R: Read>(reader: R) -> Result<SeriesStore> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = reader.headers()?.clone();
    if headers.len() < 2 {
        return Err(ForecastError::Schema(
            "expected a period column followed by at least one series column".to_string(),
        ));
    }
    let names: Vec<String> = headers.iter().skip(1).map(String::from).collect();

    let mut timestamps: Vec<TimePoint> = Vec::new();
    let mut columns: Vec<Vec<f64>> = vec![Vec::new(); names.len()];

    for (row, record) in reader.records().enumerate() {
        let record = record?;
        // header is line 1
        let line = row + 2;
        let label = record.get(0).unwrap_or_default();
        let tp = parse_time_point(label).map_err(|_| {
            ForecastError::Schema(format!("line {line}: cannot parse period label '{label}'"))
        })?;
        timestamps.push(tp);

        for (j, name) in names.iter().enumerate() {
            let field = record.get(j + 1).unwrap_or_default();
            let value = parse_value(field).ok_or_else(|| {
                ForecastError::Schema(format!(
                    "line {line}: column '{name}' has non-numeric value '{field}'"
                ))
            })?;
            columns[j].push(value);
        }
    }

    SeriesStore::new(timestamps, names.into_iter().zip(columns).collect())
}

fn parse_value(field: &str) -> Option<f64> {
    if field.is_empty() {
        return None;
    }
    field.replace(',', "").parse::<f64>().ok()
}
