// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Timestamp normalization to nanosecond epoch integers.
//!
//! Accepts epoch-seconds floats, calendar-style strings and `chrono` UTC
//! datetimes. String inputs are parsed as UTC; wall-clock text never
//! depends on the host timezone, so the same line is produced on every
//! machine.
//!
//! Integer inputs are deliberately not accepted: there is no `From`
//! conversion for them, so ambiguous "is this seconds or nanoseconds?"
//! call sites do not compile.

use crate::error::{Error, Result};
use chrono::{DateTime, NaiveDateTime, Utc};

/// Timestamp input formats with microsecond and second precision.
const TEXT_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%d %H:%M:%S"];

/// A timestamp input accepted by [`normalize`].
#[derive(Debug, Clone, PartialEq)]
pub enum TimeSpec {
    /// Seconds since the Unix epoch (fractional part kept).
    Seconds(f64),
    /// Calendar-style text, `YYYY-MM-DD HH:MM:SS[.ffffff]`, UTC.
    Text(String),
    /// An absolute UTC datetime.
    DateTime(DateTime<Utc>),
}

impl From<f64> for TimeSpec {
    fn from(secs: f64) -> Self {
        TimeSpec::Seconds(secs)
    }
}

impl From<&str> for TimeSpec {
    fn from(text: &str) -> Self {
        TimeSpec::Text(text.to_string())
    }
}

impl From<String> for TimeSpec {
    fn from(text: String) -> Self {
        TimeSpec::Text(text)
    }
}

impl From<DateTime<Utc>> for TimeSpec {
    fn from(dt: DateTime<Utc>) -> Self {
        TimeSpec::DateTime(dt)
    }
}

/// Normalize a timestamp input to nanoseconds since the Unix epoch.
///
/// - Float inputs are seconds; multiplied by 10^9 and truncated.
/// - Text inputs try `%Y-%m-%d %H:%M:%S%.f`, then `%Y-%m-%d %H:%M:%S`,
///   interpreted as UTC.
/// - Datetime inputs convert directly.
///
/// # Errors
///
/// Returns [`Error::InvalidTimestamp`] when no format matches, the float
/// is not finite, or the instant is outside the representable i64
/// nanosecond range (roughly years 1677..=2262).
pub fn normalize(input: impl Into<TimeSpec>) -> Result<i64> {
    match input.into() {
        TimeSpec::Seconds(secs) => {
            if !secs.is_finite() {
                return Err(Error::InvalidTimestamp(format!("{}", secs)));
            }
            Ok((secs * 1e9) as i64)
        }
        TimeSpec::Text(text) => {
            for format in TEXT_FORMATS {
                if let Ok(naive) = NaiveDateTime::parse_from_str(&text, format) {
                    return naive
                        .and_utc()
                        .timestamp_nanos_opt()
                        .ok_or_else(|| Error::InvalidTimestamp(text.clone()));
                }
            }
            Err(Error::InvalidTimestamp(text))
        }
        TimeSpec::DateTime(dt) => dt
            .timestamp_nanos_opt()
            .ok_or_else(|| Error::InvalidTimestamp(dt.to_rfc3339())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_normalize_float_seconds() {
        assert_eq!(normalize(3.5).expect("normalize"), 3_500_000_000);
    }

    #[test]
    fn test_normalize_float_truncates() {
        assert_eq!(normalize(0.0).expect("normalize"), 0);
        assert_eq!(normalize(1.25).expect("normalize"), 1_250_000_000);
    }

    #[test]
    fn test_normalize_text_with_microseconds() {
        assert_eq!(
            normalize("2022-06-24 16:06:25.126144").expect("normalize"),
            1_656_086_785_126_144_000
        );
    }

    #[test]
    fn test_normalize_text_second_precision_fallback() {
        assert_eq!(
            normalize("2022-06-24 16:06:25").expect("normalize"),
            1_656_086_785_000_000_000
        );
    }

    #[test]
    fn test_normalize_unparseable_text_is_error_not_exit() {
        match normalize("not-a-date") {
            Err(Error::InvalidTimestamp(input)) => assert_eq!(input, "not-a-date"),
            other => panic!("expected InvalidTimestamp, got {:?}", other),
        }
        // Still running: the failure is a value, not a process exit
    }

    #[test]
    fn test_normalize_non_finite_float_is_error() {
        assert!(matches!(
            normalize(f64::NAN),
            Err(Error::InvalidTimestamp(_))
        ));
        assert!(matches!(
            normalize(f64::INFINITY),
            Err(Error::InvalidTimestamp(_))
        ));
    }

    #[test]
    fn test_normalize_datetime_input() {
        let dt = Utc.with_ymd_and_hms(2022, 6, 24, 16, 6, 25).unwrap();
        assert_eq!(normalize(dt).expect("normalize"), 1_656_086_785_000_000_000);
    }

    #[test]
    fn test_normalize_epoch_datetime() {
        let dt = Utc.with_ymd_and_hms(1970, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(normalize(dt).expect("normalize"), 0);
    }
}
