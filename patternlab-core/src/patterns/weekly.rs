//! Daily → weekly resampling.
//!
//! Each daily bar is labelled with the first `week_end` weekday on or after
//! its date; consecutive bars sharing a label form one weekly bar. Weeks with
//! no sessions produce no bar.

use chrono::{Datelike, Duration, NaiveDate, Weekday};

use crate::domain::Bar;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeeklyBar {
    /// Label of the week: the closing weekday's date.
    pub week_ending: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
    /// Daily sessions aggregated into this bar.
    pub sessions: usize,
}

/// Date of the first `week_end` on or after `date`.
pub fn week_ending(date: NaiveDate, week_end: Weekday) -> NaiveDate {
    let target = week_end.num_days_from_monday() as i64;
    let current = date.weekday().num_days_from_monday() as i64;
    date + Duration::days((target - current).rem_euclid(7))
}

/// Aggregate chronologically ordered daily bars into weekly bars.
///
/// open = first, high = max, low = min, close = last, volume = sum.
pub fn resample_weekly<'a, I>(bars: I, week_end: Weekday) -> Vec<WeeklyBar>
where
    I: IntoIterator<Item = &'a Bar>,
{
    let mut weeks: Vec<WeeklyBar> = Vec::new();
    for bar in bars {
        let label = week_ending(bar.date, week_end);
        match weeks.last_mut() {
            Some(week) if week.week_ending == label => {
                week.high = week.high.max(bar.high);
                week.low = week.low.min(bar.low);
                week.close = bar.close;
                week.volume = week.volume.saturating_add(bar.volume);
                week.sessions += 1;
            }
            _ => weeks.push(WeeklyBar {
                week_ending: label,
                open: bar.open,
                high: bar.high,
                low: bar.low,
                close: bar.close,
                volume: bar.volume,
                sessions: 1,
            }),
        }
    }
    weeks
}
