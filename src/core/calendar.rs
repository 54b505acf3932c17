//! Calendar helpers for period labels and month arithmetic.

use crate::error::{ForecastError, Result};
use chrono::{Datelike, Days, Months, NaiveDate};
use serde::{Deserialize, Serialize};

/// A single calendar period. Monthly data uses the first of the month.
pub type TimePoint = NaiveDate;

/// Full-date label formats, tried in order.
const DATE_FORMATS: [&str; 4] = ["%Y-%m-%d", "%Y/%m/%d", "%Y.%m.%d", "%Y%m%d"];

/// Separators accepted for month-only labels such as `2023-07`.
const MONTH_SEPARATORS: [char; 3] = ['-', '/', '.'];

/// Parse a period label into a [`TimePoint`].
///
/// Accepts full dates (`2023-07-15`, `2023/07/15`, `2023.07.15`, `20230715`)
/// and month-only labels (`2023-07`, `2023/07`, `2023.07`), which map to the
/// first day of the month. A single trailing `.` is ignored.
///
/// # Example
/// ```
/// use trendcast::core::parse_time_point;
/// use chrono::NaiveDate;
///
/// let tp = parse_time_point("2023-07").unwrap();
/// assert_eq!(tp, NaiveDate::from_ymd_opt(2023, 7, 1).unwrap());
/// ```
pub fn parse_time_point(label: &str) -> Result<TimePoint> {
    let label = label.trim();
    let label = label.strip_suffix('.').unwrap_or(label);

    for fmt in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(label, fmt) {
            return Ok(date);
        }
    }

    for sep in MONTH_SEPARATORS {
        let padded = format!("{label}{sep}01");
        let fmt = format!("%Y{sep}%m{sep}%d");
        if let Ok(date) = NaiveDate::parse_from_str(&padded, &fmt) {
            return Ok(date);
        }
    }

    Err(ForecastError::Schema(format!(
        "cannot parse period label '{label}' as a date"
    )))
}

/// Add calendar months, clamping the day to the end of the target month.
pub fn add_months(tp: TimePoint, months: u32) -> Option<TimePoint> {
    tp.checked_add_months(Months::new(months))
}

/// Subtract calendar months, clamping the day to the end of the target month.
pub fn sub_months(tp: TimePoint, months: u32) -> Option<TimePoint> {
    tp.checked_sub_months(Months::new(months))
}

/// Last day of the month containing `tp`.
pub fn end_of_month(tp: TimePoint) -> Option<TimePoint> {
    tp.with_day(1)?
        .checked_add_months(Months::new(1))?
        .pred_opt()
}

/// Whether `tp` is the last day of its month.
pub fn is_month_end(tp: TimePoint) -> bool {
    tp.succ_opt().map_or(true, |next| next.month() != tp.month())
}

/// Absolute month number (`year * 12 + month0`).
pub fn month_index(tp: TimePoint) -> i64 {
    tp.year() as i64 * 12 + tp.month0() as i64
}

/// Days since 1970-01-01, used as the clock for seasonal features.
pub fn days_since_epoch(tp: TimePoint) -> f64 {
    let epoch = NaiveDate::from_ymd_opt(1970, 1, 1).unwrap_or(NaiveDate::MIN);
    (tp - epoch).num_days() as f64
}

/// Spacing between consecutive observations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Cadence {
    /// Whole calendar months (1 = monthly, 3 = quarterly).
    Months(u32),
    /// Whole calendar months, every period labeled by its last day.
    MonthEnds(u32),
    /// Fixed number of days, for sub-monthly data.
    Days(u64),
}

/// Shortest month, in days.
const MIN_MONTH_DAYS: i64 = 28;

impl Cadence {
    /// Infer the cadence from strictly increasing timestamps.
    ///
    /// Uses the median gap so that a single irregular step does not change the
    /// result. A step of `m` calendar months must also span at least `28 * m`
    /// days; closer points (semi-monthly, every 20 days) advance by days.
    /// Returns `None` when fewer than two timestamps are available.
    pub fn infer(timestamps: &[TimePoint]) -> Option<Self> {
        if timestamps.len() < 2 {
            return None;
        }

        let mut month_gaps: Vec<i64> = timestamps
            .windows(2)
            .map(|w| month_index(w[1]) - month_index(w[0]))
            .collect();
        let mut day_gaps: Vec<i64> = timestamps
            .windows(2)
            .map(|w| (w[1] - w[0]).num_days())
            .collect();
        let mid = month_gaps.len() / 2;
        let month_gap = *month_gaps.select_nth_unstable(mid).1;
        let day_gap = *day_gaps.select_nth_unstable(mid).1;

        if month_gap > 0 && day_gap >= MIN_MONTH_DAYS * month_gap {
            let months = month_gap as u32;
            if timestamps.iter().all(|&tp| is_month_end(tp)) {
                return Some(Cadence::MonthEnds(months));
            }
            return Some(Cadence::Months(months));
        }

        Some(Cadence::Days(day_gap.max(1) as u64))
    }

    /// Advance `tp` by `steps` periods.
    pub fn advance(&self, tp: TimePoint, steps: u32) -> Option<TimePoint> {
        match *self {
            Cadence::Months(m) => add_months(tp, m.checked_mul(steps)?),
            Cadence::MonthEnds(m) => end_of_month(add_months(tp, m.checked_mul(steps)?)?),
            Cadence::Days(d) => tp.checked_add_days(Days::new(d.checked_mul(steps as u64)?)),
        }
    }

    /// Generate `count` future periods following `last`.
    pub fn extend(&self, last: TimePoint, count: usize) -> Result<Vec<TimePoint>> {
        (1..=count)
            .map(|step| {
                self.advance(last, step as u32).ok_or_else(|| {
                    ForecastError::InvalidParameter(format!(
                        "horizon step {step} overflows the calendar"
                    ))
                })
            })
            .collect()
    }
}
