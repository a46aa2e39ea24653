//! Millisecond-precision UTC timestamps with a fixed wire format.
//!
//! Timestamps are always written as `YYYY-MM-DDTHH:MM:SS.mmmZ`. Because the width never varies,
//! string comparison on the stored JSON orders them chronologically, which is what range
//! filters in both store backends rely on.

use chrono::{DateTime, NaiveDate, NaiveDateTime, SubsecRound, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

const WIRE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3fZ";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, utoipa::ToSchema)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Wraps `at`, dropping sub-millisecond precision.
    pub fn new(at: DateTime<Utc>) -> Self {
        Self(at.trunc_subsecs(3))
    }

    /// Midnight UTC at the start of `date`.
    pub fn start_of(date: NaiveDate) -> Self {
        Self(date.and_time(chrono::NaiveTime::default()).and_utc())
    }

    pub fn as_datetime(&self) -> DateTime<Utc> {
        self.0
    }

    /// Parses RFC 3339, a zone-less `YYYY-MM-DDTHH:MM:SS[.fff]` (taken as UTC), or a bare date.
    pub fn parse(input: &str) -> Option<Self> {
        let input = input.trim();
        if let Ok(at) = DateTime::parse_from_rfc3339(input) {
            return Some(Self::new(at.with_timezone(&Utc)));
        }
        if let Ok(naive) = NaiveDateTime::parse_from_str(input, "%Y-%m-%dT%H:%M:%S%.f") {
            return Some(Self::new(naive.and_utc()));
        }
        NaiveDate::parse_from_str(input, "%Y-%m-%d")
            .ok()
            .map(Self::start_of)
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(at: DateTime<Utc>) -> Self {
        Self::new(at)
    }
}

impl From<Timestamp> for serde_json::Value {
    fn from(ts: Timestamp) -> Self {
        serde_json::Value::String(ts.to_string())
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(WIRE_FORMAT))
    }
}

impl Serialize for Timestamp {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Timestamp::parse(&s)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid date-time '{s}'")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_wire_format_is_fixed_width() {
        let at = Utc
            .with_ymd_and_hms(2026, 1, 2, 3, 4, 5)
            .single()
            .expect("valid timestamp");
        assert_eq!(Timestamp::new(at).to_string(), "2026-01-02T03:04:05.000Z");
    }

    #[test]
    fn test_parse_accepts_offsets_and_dates() {
        let ts = Timestamp::parse("2026-10-16T10:30:00+05:30").expect("rfc3339 should parse");
        assert_eq!(ts.to_string(), "2026-10-16T05:00:00.000Z");

        let ts = Timestamp::parse("2026-10-16").expect("date should parse");
        assert_eq!(ts.to_string(), "2026-10-16T00:00:00.000Z");

        assert!(Timestamp::parse("16/10/2026").is_none());
    }

    #[test]
    fn test_string_order_matches_time_order() {
        let a = Timestamp::parse("2026-10-16T09:59:59.999Z").expect("parse");
        let b = Timestamp::parse("2026-10-16T10:00:00Z").expect("parse");
        assert!(a < b);
        assert!(a.to_string() < b.to_string());
    }
}
