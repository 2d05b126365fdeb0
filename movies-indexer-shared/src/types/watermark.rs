//! Watermark checkpoint type.
//!
//! The watermark is the modification time up to which the relational catalog
//! has been synchronized into the search index.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

/// Seconds between 0001-01-01T00:00:00Z and the Unix epoch.
const BEGINNING_OF_TIME_SECS: i64 = -62_135_596_800;

/// Checkpoint marking the most recent processed change time.
///
/// Watermarks only ever move forward: [`Watermark::advance_to`] never returns
/// a value older than `self`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Watermark(DateTime<Utc>);

impl Watermark {
    /// Wrap a timestamp.
    pub fn new(timestamp: DateTime<Utc>) -> Self {
        Self(timestamp)
    }

    /// The "beginning of time" sentinel (`0001-01-01T00:00:00Z`).
    ///
    /// A pipeline starting from this watermark performs a full sync. The value
    /// is still representable by PostgreSQL `timestamptz`.
    pub fn beginning() -> Self {
        Self(DateTime::from_timestamp(BEGINNING_OF_TIME_SECS, 0).unwrap_or_default())
    }

    /// A watermark for the current wall-clock time.
    pub fn now() -> Self {
        Self(Utc::now())
    }

    /// The wrapped timestamp.
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.0
    }

    /// Whether this is the [`Watermark::beginning`] sentinel.
    pub fn is_beginning(&self) -> bool {
        *self == Self::beginning()
    }

    /// Move the watermark to `candidate` unless that would move it backwards.
    pub fn advance_to(self, candidate: Watermark) -> Watermark {
        self.max(candidate)
    }
}

impl Default for Watermark {
    fn default() -> Self {
        Self::beginning()
    }
}

impl From<DateTime<Utc>> for Watermark {
    fn from(timestamp: DateTime<Utc>) -> Self {
        Self(timestamp)
    }
}

impl fmt::Display for Watermark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.to_rfc3339())
    }
}

/// Parses RFC 3339 timestamps. Values without an offset, with either `T` or a
/// space between date and time, are taken as UTC.
impl FromStr for Watermark {
    type Err = chrono::ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Ok(timestamp) = DateTime::parse_from_rfc3339(s)
            .or_else(|_| DateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f%:z"))
        {
            return Ok(Self(timestamp.with_timezone(&Utc)));
        }

        NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
            .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f"))
            .map(|naive| Self(naive.and_utc()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Duration, TimeZone};

    #[test]
    fn test_beginning_is_year_one() {
        let beginning = Watermark::beginning();
        assert_eq!(beginning.timestamp().year(), 1);
        assert_eq!(beginning.timestamp().month(), 1);
        assert_eq!(beginning.timestamp().day(), 1);
        assert!(beginning.is_beginning());
        assert_eq!(Watermark::default(), beginning);
    }

    #[test]
    fn test_advance_never_moves_backwards() {
        let t1 = Watermark::new(Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap());
        let t0 = Watermark::new(t1.timestamp() - Duration::hours(1));

        assert_eq!(t1.advance_to(t0), t1);
        assert_eq!(t0.advance_to(t1), t1);
        assert_eq!(t1.advance_to(t1), t1);
    }

    #[test]
    fn test_serializes_as_rfc3339_string() {
        let watermark = Watermark::new(Utc.with_ymd_and_hms(2024, 5, 1, 12, 30, 0).unwrap());
        let json = serde_json::to_string(&watermark).unwrap();
        assert_eq!(json, "\"2024-05-01T12:30:00Z\"");

        let restored: Watermark = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, watermark);
    }

    #[test]
    fn test_parse_accepts_offset_and_naive_timestamps() {
        let expected = Watermark::new(Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap());

        for input in [
            "2024-01-01T12:00:00Z",
            "2024-01-01T14:00:00+02:00",
            "2024-01-01 12:00:00+00:00",
            "2024-01-01T12:00:00",
            "2024-01-01 12:00:00",
            "2024-01-01 12:00:00.000000",
        ] {
            assert_eq!(input.parse::<Watermark>().unwrap(), expected, "input {:?}", input);
        }

        let fractional: Watermark = "2024-01-01 12:00:00.250".parse().unwrap();
        assert_eq!(fractional.timestamp() - expected.timestamp(), Duration::milliseconds(250));
    }

    #[test]
    fn test_parse_rejects_non_timestamps() {
        assert!("yesterday".parse::<Watermark>().is_err());
        assert!("2024-01-01".parse::<Watermark>().is_err());
        assert!("".parse::<Watermark>().is_err());
    }
}
