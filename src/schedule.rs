//! Calendar rules deciding whether a recurring template fires on a date.
//!
//! A template fires on `date` when all of these hold:
//!
//! 1. the day matches its frequency ([`fires_on`]): every day for daily, the
//!    ISO weekday for weekly, the *effective day* for the monthly family;
//! 2. for interval frequencies, `date` falls in an eligible month counted from
//!    the template's anchor ([`in_interval`]);
//! 3. `date` lies within the optional start/end bounds ([`within_period`]).
//!
//! The effective day is `min(moment, last day of the month)`, so a template
//! set for the 31st still fires once in April and in February.

use chrono::{Datelike, NaiveDate};

use crate::models::Frequency;

/// The host's local calendar date. Template creation dates and pass dates
/// both come from here so interval anchors and target dates share one zone.
pub fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

/// Last calendar day of the month containing `date`.
pub fn last_day_of_month(date: NaiveDate) -> u32 {
    let (year, month) = if date.month() == 12 {
        (date.year() + 1, 1)
    } else {
        (date.year(), date.month() + 1)
    };
    NaiveDate::from_ymd_opt(year, month, 1)
        .and_then(|first| first.pred_opt())
        .map(|last| last.day())
        .unwrap_or(28)
}

/// Day of month on which a monthly-family template fires in `date`'s month.
pub fn effective_day(moment: u32, date: NaiveDate) -> u32 {
    moment.min(last_day_of_month(date))
}

/// Day-level match for a frequency and moment.
pub fn fires_on(frequency: Frequency, moment: u32, date: NaiveDate) -> bool {
    match frequency {
        Frequency::Daily => true,
        Frequency::Weekly => date.weekday().number_from_monday() == moment,
        _ => date.day() == effective_day(moment, date),
    }
}

/// Signed number of calendar months from `from`'s month to `to`'s month.
pub fn months_between(from: NaiveDate, to: NaiveDate) -> i64 {
    (to.year() as i64 - from.year() as i64) * 12 + (to.month() as i64 - from.month() as i64)
}

/// Month-level gate for interval frequencies. Always true for daily, weekly and
/// monthly; otherwise `date` must be a whole number of intervals after `anchor`.
pub fn in_interval(frequency: Frequency, anchor: NaiveDate, date: NaiveDate) -> bool {
    match frequency.interval_months() {
        None | Some(1) => true,
        Some(step) => {
            let elapsed = months_between(anchor, date);
            elapsed >= 0 && elapsed % step as i64 == 0
        }
    }
}

pub fn within_period(start: Option<NaiveDate>, end: Option<NaiveDate>, date: NaiveDate) -> bool {
    if start.is_some_and(|s| date < s) {
        return false;
    }
    if end.is_some_and(|e| date > e) {
        return false;
    }
    true
}
