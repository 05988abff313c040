//! Zoned instant construction from calendar dates and "HH:MM" strings.
//!
//! Events are stored as UTC instants but always entered as a wall-clock time
//! at a venue. These helpers resolve that wall-clock time in the location's
//! IANA timezone so the configured zone is honored regardless of server
//! locale. All functions are pure and never suspend.

use std::str::FromStr;

use chrono::{DateTime, Duration, LocalResult, NaiveDate, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;

use crate::error::{Result, SchedulingError};

/// Parse an "HH:MM" time-of-day string.
pub fn parse_hhmm(hhmm: &str) -> Result<NaiveTime> {
    NaiveTime::parse_from_str(hhmm, "%H:%M")
        .map_err(|_| SchedulingError::InvalidTime(format!("expected HH:MM, got {:?}", hhmm)).into())
}

/// Resolve a wall-clock time on a date in an IANA timezone to a UTC instant.
///
/// DST transitions never fail: an ambiguous local time resolves to its
/// earliest interpretation, and a time inside a spring-forward gap is moved
/// past the gap.
pub fn local_instant(date: NaiveDate, hhmm: &str, timezone: &str) -> Result<DateTime<Utc>> {
    let tz = Tz::from_str(timezone)
        .map_err(|_| SchedulingError::UnknownTimezone(timezone.to_string()))?;
    let time = parse_hhmm(hhmm)?;
    let naive = date.and_time(time);

    match tz.from_local_datetime(&naive) {
        LocalResult::Single(dt) => Ok(dt.with_timezone(&Utc)),
        LocalResult::Ambiguous(earliest, _) => Ok(earliest.with_timezone(&Utc)),
        LocalResult::None => {
            // The wall clock skipped over this time; take the hour after the gap.
            let shifted = naive + Duration::hours(1);
            tz.from_local_datetime(&shifted)
                .earliest()
                .map(|dt| dt.with_timezone(&Utc))
                .ok_or_else(|| {
                    SchedulingError::InvalidTime(format!(
                        "{} {} does not exist in {}",
                        date, hhmm, timezone
                    ))
                    .into()
                })
        }
    }
}

/// Add minutes to an "HH:MM" string, returning a new "HH:MM" string.
///
/// Wraps past midnight; callers that cannot span days must validate the
/// resulting window ordering themselves.
pub fn offset_hhmm(hhmm: &str, minutes: u32) -> Result<String> {
    let time = parse_hhmm(hhmm)?;
    let shifted = time + Duration::minutes(i64::from(minutes));
    Ok(shifted.format("%H:%M").to_string())
}
