//! Core data structures: calendar, series store and forecast results.

mod calendar;
mod forecast;
mod series_store;

pub use calendar::{
    add_months, days_since_epoch, end_of_month, is_month_end, month_index, parse_time_point,
    sub_months, Cadence, TimePoint,
};
pub use forecast::{
    ForecastResult, ForecastResultBuilder, ForecastRow, ForecastView, SeasonalComponent,
};
pub use series_store::{LongRecord, SeriesStore, SeriesStoreBuilder, SeriesView};
