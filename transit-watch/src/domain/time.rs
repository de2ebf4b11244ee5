//! Time helpers.
//!
//! All timestamps in the domain are `DateTime<Utc>`. Conversions to local
//! time only happen at the edges: when checking which day it is for a
//! route, and when formatting a time for people to read.

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;

/// Whole minutes in a duration, rounded toward negative infinity.
///
/// A 30-second shortfall counts as -1 minute rather than 0, so that
/// "negative minutes" always means "negative duration".
///
/// # Examples
///
/// ```
/// use transit_watch::domain::whole_minutes;
/// use chrono::Duration;
///
/// assert_eq!(whole_minutes(Duration::seconds(119)), 1);
/// assert_eq!(whole_minutes(Duration::seconds(-30)), -1);
/// assert_eq!(whole_minutes(Duration::zero()), 0);
/// ```
pub fn whole_minutes(duration: Duration) -> i64 {
    duration.num_seconds().div_euclid(60)
}

/// Format a timestamp as `HH:MM` in the given time zone.
pub fn format_hhmm(at: DateTime<Utc>, tz: Tz) -> String {
    at.with_timezone(&tz).format("%H:%M").to_string()
}

/// Returns the local calendar date of `at` in `tz`.
pub fn local_date(at: DateTime<Utc>, tz: Tz) -> NaiveDate {
    at.with_timezone(&tz).date_naive()
}

/// Next occurrence of a local wall-clock time, at or after `now`.
///
/// Used to turn a route's "usual departure time" into a query hint. If the
/// time has already passed today the hint moves to tomorrow. Returns `None`
/// only if the local time does not exist on either day (DST gap).
pub fn next_occurrence(time: NaiveTime, now: DateTime<Utc>, tz: Tz) -> Option<DateTime<Utc>> {
    let today = local_date(now, tz);

    let candidate = tz
        .from_local_datetime(&today.and_time(time))
        .earliest()
        .map(|dt| dt.with_timezone(&Utc));

    match candidate {
        Some(at) if at >= now => Some(at),
        _ => {
            let tomorrow = today.succ_opt()?;
            tz.from_local_datetime(&tomorrow.and_time(time))
                .earliest()
                .map(|dt| dt.with_timezone(&Utc))
        }
    }
}
