//! Independent forecasts of many series in parallel.

use crate::core::{ForecastResult, SeriesStore};
use crate::error::Result;
use crate::models::Forecaster;
use rayon::prelude::*;

/// Forecast every named series of `store` on the rayon pool.
///
/// Results come back in the order of `names`, each with its own outcome:
/// an unknown name or a failed fit never affects the other entries.
pub fn forecast_many<F, S>(
    model: &F,
    store: &SeriesStore,
    names: &[S],
    horizon: usize,
) -> Vec<(String, Result<ForecastResult>)>
where
    F: Forecaster + ?Sized,
    S: AsRef<str> + Sync,
{
    names
        .par_iter()
        .map(|name| {
            let name = name.as_ref();
            let result = store
                .values_of(name)
                .and_then(|series| model.forecast(series, horizon));
            (name.to_string(), result)
        })
        .collect()
}
