//! Calendar-day logic in an explicit timezone.
//!
//! This module provides the local-day helpers used for day slicing and period
//! buckets. Intervals are stored in UTC; "calendar day" always means a day in
//! the timezone passed in, never an ambient one.

use chrono::{DateTime, Days, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;

use super::Interval;

/// Longest stretch of non-existent local time we search across after a DST
/// gap swallows midnight.
const MAX_GAP_MINUTES: i64 = 24 * 60;

/// Returns the local calendar day of `instant` in `timezone`.
pub fn local_date(timezone: Tz, instant: DateTime<Utc>) -> NaiveDate {
    instant.with_timezone(&timezone).date_naive()
}

/// Returns the UTC instant at which local day `date` starts in `timezone`.
///
/// When midnight falls inside a DST gap, the first valid local instant after
/// it is used. When midnight is ambiguous, the earlier instant is used.
///
/// # Example
///
/// ```
/// use work_entry_engine::interval::local_day_start;
/// use chrono::{NaiveDate, TimeZone, Utc};
/// use chrono_tz::America::New_York;
///
/// let date = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
/// assert_eq!(
///     local_day_start(New_York, date),
///     Utc.with_ymd_and_hms(2024, 1, 15, 5, 0, 0).unwrap()
/// );
/// ```
pub fn local_day_start(timezone: Tz, date: NaiveDate) -> DateTime<Utc> {
    let midnight = date.and_time(NaiveTime::MIN);
    (0..=MAX_GAP_MINUTES)
        .find_map(|minutes| {
            timezone
                .from_local_datetime(&(midnight + Duration::minutes(minutes)))
                .earliest()
        })
        .map(|local| local.with_timezone(&Utc))
        .unwrap_or_else(|| Utc.from_utc_datetime(&midnight))
}

/// Returns the first local midnight strictly after `instant`.
pub fn next_local_midnight(timezone: Tz, instant: DateTime<Utc>) -> DateTime<Utc> {
    let today = local_date(timezone, instant);
    match today.checked_add_days(Days::new(1)) {
        Some(tomorrow) => local_day_start(timezone, tomorrow),
        None => DateTime::<Utc>::MAX_UTC,
    }
}

/// Splits an interval at every local midnight it crosses.
///
/// Returns `(local date, fragment)` pairs in chronological order. The
/// fragments partition the input interval exactly, so their durations sum
/// to the input's.
///
/// # Example
///
/// ```
/// use work_entry_engine::interval::{split_by_local_day, Interval};
/// use work_entry_engine::models::PayloadRef;
/// use chrono::{NaiveDate, TimeZone, Utc};
///
/// let interval = Interval::new(
///     Utc.with_ymd_and_hms(2024, 1, 1, 22, 0, 0).unwrap(),
///     Utc.with_ymd_and_hms(2024, 1, 2, 2, 0, 0).unwrap(),
///     PayloadRef::Attendance { punch_id: 1 },
/// )
/// .unwrap();
///
/// let days = split_by_local_day(&interval, chrono_tz::UTC);
/// assert_eq!(days.len(), 2);
/// assert_eq!(days[0].0, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
/// assert_eq!(days[0].1.duration().num_hours(), 2);
/// assert_eq!(days[1].0, NaiveDate::from_ymd_opt(2024, 1, 2).unwrap());
/// assert_eq!(days[1].1.duration().num_hours(), 2);
/// ```
pub fn split_by_local_day(interval: &Interval, timezone: Tz) -> Vec<(NaiveDate, Interval)> {
    let mut fragments = Vec::new();
    let mut cursor = interval.start();

    while cursor < interval.end() {
        let fragment_end = next_local_midnight(timezone, cursor).min(interval.end());
        fragments.push((
            local_date(timezone, cursor),
            interval.with_bounds(cursor, fragment_end),
        ));
        cursor = fragment_end;
    }

    fragments
}
