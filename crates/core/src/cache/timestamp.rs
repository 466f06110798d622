//! Timestamp policy for cache rows.
//!
//! Timestamps are stored as fixed-width RFC 3339 UTC text with millisecond
//! precision, the same shape SQLite's `strftime('%Y-%m-%dT%H:%M:%fZ')`
//! produces, so text comparison in SQL orders them chronologically.

use chrono::{DateTime, SecondsFormat, SubsecRound, TimeDelta, Utc};

use crate::Error;

/// Current time truncated to the stored precision.
pub fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(3)
}

/// Format a timestamp for storage.
pub fn format(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// The instant `days` days before `now`.
///
/// Saturates at the earliest representable time instead of overflowing,
/// so an oversized day count selects every stored row.
pub fn days_before(now: DateTime<Utc>, days: u32) -> DateTime<Utc> {
    TimeDelta::try_days(i64::from(days))
        .and_then(|delta| now.checked_sub_signed(delta))
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

/// Parse a stored timestamp.
pub fn parse(raw: &str) -> Result<DateTime<Utc>, Error> {
    Ok(DateTime::parse_from_rfc3339(raw)?.with_timezone(&Utc))
}
