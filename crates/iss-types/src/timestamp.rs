//! Fixed-format UTC timestamps used throughout the OEM dataset.
//!
//! Every epoch in the origin document is stamped as
//! `YYYY-DDDTHH:MM:SS.fffZ`: a four-digit year, a three-digit day of
//! year, a 24-hour time of day with a fractional second, and a literal
//! `Z` marking UTC. Parsing is strict. Any deviation from the layout is
//! an error, never a best-effort recovery.
//!
//! # Precision
//!
//! The fraction may carry 1 to 6 digits (microsecond precision). When
//! formatted, a timestamp uses millisecond precision if its
//! sub-millisecond part is zero and microsecond precision otherwise, so
//! every origin timestamp formats back to its original text.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Datelike, NaiveDate, NaiveTime, Timelike, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Maximum number of fractional-second digits accepted (microseconds).
const MAX_FRACTION_DIGITS: usize = 6;

/// A timestamp string did not match the fixed `YYYY-DDDTHH:MM:SS.fZ` layout.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid timestamp {input:?}: {reason}")]
pub struct TimestampError {
    /// The rejected input text.
    pub input: String,
    /// Which part of the layout was violated.
    pub reason: &'static str,
}

/// A point in time, always UTC, with microsecond precision.
///
/// Ordering follows the underlying instant, so a slice of epochs sorted
/// by [`Timestamp`] is sorted chronologically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Wrap an existing UTC instant.
    pub const fn from_datetime(instant: DateTime<Utc>) -> Self {
        Self(instant)
    }

    /// Return the underlying UTC instant.
    pub const fn as_datetime(&self) -> DateTime<Utc> {
        self.0
    }

    /// Split into year / day-of-year / time-of-day for presentation.
    pub fn parts(&self) -> TimeParts {
        let dt = self.0;
        let millis = dt.nanosecond() / 1_000_000;
        TimeParts {
            year: dt.year(),
            day_of_year: dt.ordinal(),
            time_of_day: format!(
                "{:02}:{:02}:{:02}.{millis:03}",
                dt.hour(),
                dt.minute(),
                dt.second()
            ),
        }
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(instant: DateTime<Utc>) -> Self {
        Self(instant)
    }
}

impl FromStr for Timestamp {
    type Err = TimestampError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = |reason: &'static str| TimestampError {
            input: s.to_owned(),
            reason,
        };

        let body = s
            .strip_suffix('Z')
            .ok_or_else(|| err("missing trailing 'Z'"))?;
        let (date, time) = body
            .split_once('T')
            .ok_or_else(|| err("missing 'T' separator"))?;
        let (year, ordinal) = date
            .split_once('-')
            .ok_or_else(|| err("missing '-' between year and day of year"))?;

        let year: i32 = fixed_digits(year, 4).ok_or_else(|| err("year must be four digits"))?;
        let ordinal: u32 =
            fixed_digits(ordinal, 3).ok_or_else(|| err("day of year must be three digits"))?;

        let (clock, fraction) = time
            .split_once('.')
            .ok_or_else(|| err("missing fractional seconds"))?;
        let mut fields = clock.split(':');
        let (Some(hour), Some(minute), Some(second), None) =
            (fields.next(), fields.next(), fields.next(), fields.next())
        else {
            return Err(err("time of day must be HH:MM:SS"));
        };
        let hour: u32 = fixed_digits(hour, 2).ok_or_else(|| err("hour must be two digits"))?;
        let minute: u32 =
            fixed_digits(minute, 2).ok_or_else(|| err("minute must be two digits"))?;
        let second: u32 =
            fixed_digits(second, 2).ok_or_else(|| err("second must be two digits"))?;

        if fraction.is_empty() || fraction.len() > MAX_FRACTION_DIGITS {
            return Err(err("fraction of a second must be 1 to 6 digits"));
        }
        // Right-pad to six digits so "5" reads as 500000 microseconds.
        let padded = format!("{fraction:0<MAX_FRACTION_DIGITS$}");
        let micros: u32 = fixed_digits(&padded, MAX_FRACTION_DIGITS)
            .ok_or_else(|| err("fraction of a second must be digits"))?;

        let date =
            NaiveDate::from_yo_opt(year, ordinal).ok_or_else(|| err("day of year out of range"))?;
        let time = NaiveTime::from_hms_micro_opt(hour, minute, second, micros)
            .ok_or_else(|| err("time of day out of range"))?;

        Ok(Self(date.and_time(time).and_utc()))
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let dt = self.0;
        let micros = dt.nanosecond() / 1_000;
        write!(
            f,
            "{:04}-{:03}T{:02}:{:02}:{:02}",
            dt.year(),
            dt.ordinal(),
            dt.hour(),
            dt.minute(),
            dt.second()
        )?;
        if micros % 1_000 == 0 {
            write!(f, ".{:03}Z", micros / 1_000)
        } else {
            write!(f, ".{micros:06}Z")
        }
    }
}

impl Serialize for Timestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}

/// Parse `text` as an unsigned decimal of exactly `width` ASCII digits.
fn fixed_digits<T: FromStr>(text: &str, width: usize) -> Option<T> {
    if text.len() == width && text.bytes().all(|b| b.is_ascii_digit()) {
        text.parse().ok()
    } else {
        None
    }
}

/// A timestamp broken into the components shown to users.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeParts {
    /// Calendar year.
    pub year: i32,
    /// Day of year, 1-based.
    pub day_of_year: u32,
    /// `HH:MM:SS.mmm` in UTC.
    pub time_of_day: String,
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::arithmetic_side_effects)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn parses_origin_layout() {
        let ts: Timestamp = "2025-001T00:00:00.001Z".parse().unwrap();
        let expected = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap()
            + chrono::TimeDelta::milliseconds(1);
        assert_eq!(ts.as_datetime(), expected);
    }

    #[test]
    fn day_of_year_maps_to_calendar_date() {
        let ts: Timestamp = "2025-104T12:20:00.000Z".parse().unwrap();
        let expected = Utc.with_ymd_and_hms(2025, 4, 14, 12, 20, 0).unwrap();
        assert_eq!(ts.as_datetime(), expected);
    }

    #[test]
    fn short_fraction_is_right_padded() {
        let ts: Timestamp = "2025-001T00:00:00.5Z".parse().unwrap();
        assert_eq!(ts.as_datetime().nanosecond(), 500_000_000);
    }

    #[test]
    fn microsecond_fraction_is_kept() {
        let ts: Timestamp = "2025-001T00:00:00.000123Z".parse().unwrap();
        assert_eq!(ts.as_datetime().nanosecond(), 123_000);
        assert_eq!(ts.to_string(), "2025-001T00:00:00.000123Z");
    }

    #[test]
    fn display_round_trips_millisecond_text() {
        for text in [
            "2025-104T12:20:00.000Z",
            "2024-366T23:59:59.999Z",
            "0999-010T01:02:03.040Z",
        ] {
            let ts: Timestamp = text.parse().unwrap();
            assert_eq!(ts.to_string(), text);
        }
    }

    #[test]
    fn rejects_deviations_from_layout() {
        for bad in [
            "a_bad_time_format",
            "",
            "2025-001T00:00:00.000",
            "2025-001T00:00:00Z",
            "2025-01T00:00:00.000Z",
            "25-001T00:00:00.000Z",
            "2025-001 00:00:00.000Z",
            "2025-001T0:00:00.000Z",
            "2025-001T00:00:00.0000000Z",
            "2025-001T00:00:00.Z",
            "2025-001T00:00:00:00.000Z",
            "2025-001T00:00:0a.000Z",
            "+025-001T00:00:00.000Z",
            "2025-001T00:00:00.000z",
        ] {
            assert!(bad.parse::<Timestamp>().is_err(), "accepted {bad:?}");
        }
    }

    #[test]
    fn rejects_out_of_range_fields() {
        for bad in [
            "2025-000T00:00:00.000Z",
            "2025-366T00:00:00.000Z",
            "2025-001T24:00:00.000Z",
            "2025-001T00:60:00.000Z",
            "2025-001T00:00:60.000Z",
        ] {
            assert!(bad.parse::<Timestamp>().is_err(), "accepted {bad:?}");
        }
        assert!("2024-366T00:00:00.000Z".parse::<Timestamp>().is_ok());
    }

    #[test]
    fn error_names_the_input() {
        let err = "nope".parse::<Timestamp>().unwrap_err();
        assert_eq!(err.input, "nope");
        assert!(err.to_string().contains("nope"));
    }

    #[test]
    fn serde_uses_text_form() {
        let ts: Timestamp = "2025-104T12:20:00.000Z".parse().unwrap();
        let json = serde_json::to_string(&ts).unwrap();
        assert_eq!(json, "\"2025-104T12:20:00.000Z\"");
        let back: Timestamp = serde_json::from_str(&json).unwrap();
        assert_eq!(back, ts);
        assert!(serde_json::from_str::<Timestamp>("\"2025-04-14\"").is_err());
    }

    #[test]
    fn parts_split_for_presentation() {
        let ts: Timestamp = "2025-104T12:20:00.123Z".parse().unwrap();
        let parts = ts.parts();
        assert_eq!(parts.year, 2025);
        assert_eq!(parts.day_of_year, 104);
        assert_eq!(parts.time_of_day, "12:20:00.123");
    }

    #[test]
    fn ordering_is_chronological() {
        let a: Timestamp = "2024-366T23:59:59.999Z".parse().unwrap();
        let b: Timestamp = "2025-001T00:00:00.000Z".parse().unwrap();
        assert!(a < b);
    }
}
