//! Conversions between calendar values and the epoch-millisecond integers
//! stored in the database. Day-granular records are keyed by local midnight.

use std::sync::Arc;

use chrono::{DateTime, Local, NaiveDate, NaiveTime, TimeZone, Utc};
use mockable::Clock;

pub type SharedClock = Arc<dyn Clock + Send + Sync>;

/// The local calendar day according to `clock`.
#[must_use]
pub fn today(clock: &dyn Clock) -> NaiveDate {
    clock.local().date_naive()
}

/// Local midnight at the start of `date`.
///
/// When midnight falls in a DST gap the wall-clock time is read as UTC
/// rather than failing.
#[must_use]
pub fn start_of_day(date: NaiveDate) -> DateTime<Local> {
    let midnight = date.and_time(NaiveTime::MIN);
    Local
        .from_local_datetime(&midnight)
        .earliest()
        .unwrap_or_else(|| Local.from_utc_datetime(&midnight))
}

/// Epoch milliseconds of local midnight for `date`.
#[must_use]
pub fn day_millis(date: NaiveDate) -> i64 {
    start_of_day(date).timestamp_millis()
}

#[must_use]
pub fn date_from_millis(millis: i64) -> Option<NaiveDate> {
    DateTime::from_timestamp_millis(millis).map(|utc| utc.with_timezone(&Local).date_naive())
}

#[must_use]
pub fn instant_from_millis(millis: i64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp_millis(millis)
}

/// Truncate an instant to the local midnight of its calendar day.
#[must_use]
pub fn normalize_millis(millis: i64) -> Option<i64> {
    date_from_millis(millis).map(day_millis)
}

/// First and last day of a calendar month.
#[must_use]
pub fn month_bounds(year: i32, month: u32) -> Option<(NaiveDate, NaiveDate)> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)?
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)?
    };
    Some((first, next.pred_opt()?))
}

/// Instant range covering whole local days `start..=end`.
#[must_use]
pub fn day_span(start: NaiveDate, end: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
    let from = start_of_day(start).with_timezone(&Utc);
    let until = end
        .succ_opt()
        .map_or_else(|| from, |next| start_of_day(next).with_timezone(&Utc))
        - chrono::Duration::milliseconds(1);
    (from, until)
}
