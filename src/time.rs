//! # Timestamp helpers
//!
//! Thin conversions between the textual / numeric timestamps found in study tables and
//! [`hifitime::Epoch`], which is the only time representation used inside the crate.
//!
//! All epochs are built on the **UTC** scale. Unix seconds follow the POSIX convention
//! (no leap seconds), which is what tabular exports usually carry.
use hifitime::{Duration, Epoch};
use std::str::FromStr;

use crate::constants::SECONDS_PER_DAY;
use crate::covday_errors::CovdayError;

/// Parse a table timestamp into an [`Epoch`] (UTC).
///
/// Accepted forms
/// -----------------
/// * Unix seconds, integer or fractional (`"1612137600"`, `"1612137600.5"`).
/// * ISO-8601 date-time, with either `T` or a single space between date and time
///   (`"2021-02-01T00:00:00"`, `"2021-02-01 00:00:00"`).
///
/// Return
/// ----------
/// * The parsed epoch, or [`CovdayError::InvalidTimestamp`] carrying the offending input.
pub fn parse_timestamp(raw: &str) -> Result<Epoch, CovdayError> {
    let raw = raw.trim();
    if let Ok(unix) = f64::from_str(raw) {
        return Ok(unix_to_epoch(unix));
    }

    let iso = match raw.split_once(' ') {
        Some((date, time)) if !raw.contains('T') => format!("{date}T{}", time.trim()),
        _ => raw.to_string(),
    };

    Epoch::from_str(&iso).map_err(|e| CovdayError::InvalidTimestamp(format!("{raw} ({e})")))
}

/// Unix seconds (UTC, POSIX) to [`Epoch`]
pub fn unix_to_epoch(unix_seconds: f64) -> Epoch {
    Epoch::from_unix_seconds(unix_seconds)
}

/// [`Epoch`] to unix seconds (UTC, POSIX)
pub fn epoch_to_unix(epoch: Epoch) -> f64 {
    epoch.to_unix_seconds()
}

/// Calendar fields `(year, month, day, hour, minute, second)` of an epoch on the UTC scale.
pub fn gregorian_fields(epoch: Epoch) -> (i32, u8, u8, u8, u8, u8) {
    let (year, month, day, hour, minute, second, _nanos) = epoch.to_gregorian_utc();
    (year, month, day, hour, minute, second)
}

/// Duration of `n` civil days (86400 s each)
pub fn days(n: f64) -> Duration {
    Duration::from_seconds(n * SECONDS_PER_DAY)
}

/// Render an epoch as `YYYY-MM-DDTHH:MM:SS` (UTC, second precision).
pub fn fmt_epoch(epoch: Epoch) -> String {
    let (y, mo, d, h, mi, s) = gregorian_fields(epoch);
    format!("{y:04}-{mo:02}-{d:02}T{h:02}:{mi:02}:{s:02}")
}

#[cfg(test)]
mod time_test {
    use super::*;

    #[test]
    fn test_parse_timestamp_iso() {
        let epoch = parse_timestamp("2021-02-01T08:00:00").unwrap();
        assert_eq!(gregorian_fields(epoch), (2021, 2, 1, 8, 0, 0));

        let epoch = parse_timestamp("2021-02-01 16:30:05").unwrap();
        assert_eq!(gregorian_fields(epoch), (2021, 2, 1, 16, 30, 5));
    }

    #[test]
    fn test_parse_timestamp_unix() {
        // 2021-02-01T00:00:00 UTC
        let epoch = parse_timestamp("1612137600").unwrap();
        assert_eq!(gregorian_fields(epoch), (2021, 2, 1, 0, 0, 0));
        assert_eq!(epoch_to_unix(epoch), 1_612_137_600.0);
    }

    #[test]
    fn test_parse_timestamp_invalid() {
        let err = parse_timestamp("not a date").unwrap_err();
        assert!(matches!(err, CovdayError::InvalidTimestamp(_)));
    }

    #[test]
    fn test_days_and_fmt() {
        let epoch = parse_timestamp("2021-12-31T12:00:00").unwrap();
        assert_eq!(fmt_epoch(epoch + days(1.0)), "2022-01-01T12:00:00");
        assert_eq!(days(0.5).to_seconds(), 43_200.0);
    }
}
