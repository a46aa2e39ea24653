//! Formatting and parsing of generated codes.

use crate::{IdError, IdResult};
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use std::{fmt, str::FromStr};

/// Width of the zero-padded suffix of daily codes.
const DAILY_SEQ_WIDTH: usize = 4;

/// Width of the zero-padded suffix of serial codes.
const SERIAL_SEQ_WIDTH: usize = 5;

/// The families of generated codes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum CodeKind {
    Uhid,
    Visit,
    Accession,
    OpdBill,
    Ipd,
    Appointment,
}

impl CodeKind {
    pub const ALL: [CodeKind; 6] = [
        CodeKind::Uhid,
        CodeKind::Visit,
        CodeKind::Accession,
        CodeKind::OpdBill,
        CodeKind::Ipd,
        CodeKind::Appointment,
    ];

    /// The literal prefix that starts every code of this kind.
    pub fn prefix(self) -> &'static str {
        match self {
            CodeKind::Uhid => "UHID",
            CodeKind::Visit => "VISIT",
            CodeKind::Accession => "LAB",
            CodeKind::OpdBill => "OPD-",
            CodeKind::Ipd => "IPD-",
            CodeKind::Appointment => "APPT-",
        }
    }

    /// Stable name used in counter keys and on the command line.
    pub fn as_str(self) -> &'static str {
        match self {
            CodeKind::Uhid => "uhid",
            CodeKind::Visit => "visit",
            CodeKind::Accession => "accession",
            CodeKind::OpdBill => "opd_bill",
            CodeKind::Ipd => "ipd",
            CodeKind::Appointment => "appointment",
        }
    }

    /// Whether codes of this kind are sequenced per calendar day.
    pub fn is_daily(self) -> bool {
        matches!(self, CodeKind::Uhid | CodeKind::Visit | CodeKind::Accession)
    }

    /// Whether codes of this kind carry a millisecond timestamp instead of a counter.
    pub fn is_timestamped(self) -> bool {
        matches!(self, CodeKind::Ipd | CodeKind::Appointment)
    }
}

impl fmt::Display for CodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CodeKind {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CodeKind::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| IdError::InvalidInput(format!("unknown code kind: '{}'", s)))
    }
}

/// A date-prefixed sequential code such as `UHID202610160007`.
///
/// The sequence is padded to four digits; larger values are printed in full rather than
/// truncated, so ordering within a day stays numeric even past 9999.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct DailyCode {
    kind: CodeKind,
    date: NaiveDate,
    seq: u64,
}

impl DailyCode {
    /// Builds a daily code.
    ///
    /// # Errors
    ///
    /// Returns [`IdError::InvalidInput`] if `kind` is not a daily kind or `seq` is zero.
    pub fn new(kind: CodeKind, date: NaiveDate, seq: u64) -> IdResult<Self> {
        if !kind.is_daily() {
            return Err(IdError::InvalidInput(format!(
                "{} codes are not sequenced per day",
                kind
            )));
        }
        if seq == 0 {
            return Err(IdError::InvalidInput("sequence starts at 1".into()));
        }
        Ok(Self { kind, date, seq })
    }

    /// The counter key for `kind` on `date`, e.g. `uhid:20261016`.
    pub fn counter_key(kind: CodeKind, date: NaiveDate) -> String {
        format!("{}:{}", kind.as_str(), date.format("%Y%m%d"))
    }

    /// Parses a code of a known kind.
    ///
    /// # Errors
    ///
    /// Returns [`IdError::InvalidInput`] when the prefix, date or sequence part is malformed.
    pub fn parse(kind: CodeKind, input: &str) -> IdResult<Self> {
        let rest = input.strip_prefix(kind.prefix()).ok_or_else(|| {
            IdError::InvalidInput(format!(
                "code must start with '{}', got: '{}'",
                kind.prefix(),
                input
            ))
        })?;

        if rest.len() < 8 + DAILY_SEQ_WIDTH || !rest.bytes().all(|b| b.is_ascii_digit()) {
            return Err(IdError::InvalidInput(format!(
                "code must be '{}' followed by yyyymmdd and at least {} digits, got: '{}'",
                kind.prefix(),
                DAILY_SEQ_WIDTH,
                input
            )));
        }

        let (date_part, seq_part) = rest.split_at(8);
        let date = NaiveDate::parse_from_str(date_part, "%Y%m%d").map_err(|e| {
            IdError::InvalidInput(format!("Invalid date in code '{}': {}", input, e))
        })?;
        let seq = seq_part
            .parse::<u64>()
            .map_err(|e| IdError::InvalidInput(format!("Invalid sequence in '{}': {}", input, e)))?;

        Self::new(kind, date, seq)
    }

    pub fn kind(&self) -> CodeKind {
        self.kind
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn seq(&self) -> u64 {
        self.seq
    }
}

impl fmt::Display for DailyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}{:0width$}",
            self.kind.prefix(),
            self.date.format("%Y%m%d"),
            self.seq,
            width = DAILY_SEQ_WIDTH
        )
    }
}

/// A globally sequenced code such as `OPD-00042`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct SerialCode {
    kind: CodeKind,
    seq: u64,
}

impl SerialCode {
    /// # Errors
    ///
    /// Returns [`IdError::InvalidInput`] if `kind` is daily or timestamped, or `seq` is zero.
    pub fn new(kind: CodeKind, seq: u64) -> IdResult<Self> {
        if kind.is_daily() || kind.is_timestamped() {
            return Err(IdError::InvalidInput(format!(
                "{} codes are not globally sequenced",
                kind
            )));
        }
        if seq == 0 {
            return Err(IdError::InvalidInput("sequence starts at 1".into()));
        }
        Ok(Self { kind, seq })
    }

    /// The counter key for a global sequence, e.g. `opd_bill`.
    pub fn counter_key(kind: CodeKind) -> String {
        kind.as_str().to_string()
    }

    /// # Errors
    ///
    /// Returns [`IdError::InvalidInput`] when the prefix or the numeric part is malformed.
    pub fn parse(kind: CodeKind, input: &str) -> IdResult<Self> {
        let digits = input.strip_prefix(kind.prefix()).ok_or_else(|| {
            IdError::InvalidInput(format!(
                "code must start with '{}', got: '{}'",
                kind.prefix(),
                input
            ))
        })?;
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(IdError::InvalidInput(format!(
                "code must end in digits, got: '{}'",
                input
            )));
        }
        let seq = digits
            .parse::<u64>()
            .map_err(|e| IdError::InvalidInput(format!("Invalid sequence in '{}': {}", input, e)))?;
        Self::new(kind, seq)
    }

    pub fn seq(&self) -> u64 {
        self.seq
    }
}

impl fmt::Display for SerialCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{:0width$}",
            self.kind.prefix(),
            self.seq,
            width = SERIAL_SEQ_WIDTH
        )
    }
}

/// A timestamp-suffixed code such as `IPD-1760601234567`.
///
/// Uniqueness relies on two codes of the same kind not being minted in the same millisecond.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct TimestampCode {
    kind: CodeKind,
    timestamp: DateTime<Utc>,
}

impl TimestampCode {
    /// # Errors
    ///
    /// Returns [`IdError::InvalidInput`] if `kind` is not a timestamped kind.
    pub fn new(kind: CodeKind, timestamp: DateTime<Utc>) -> IdResult<Self> {
        if !kind.is_timestamped() {
            return Err(IdError::InvalidInput(format!(
                "{} codes are not timestamped",
                kind
            )));
        }
        let millis = timestamp.timestamp_millis();
        let timestamp = Utc
            .timestamp_millis_opt(millis)
            .single()
            .ok_or_else(|| IdError::InvalidInput("timestamp out of range".into()))?;
        Ok(Self { kind, timestamp })
    }

    /// # Errors
    ///
    /// Returns [`IdError::InvalidInput`] when the prefix or millisecond part is malformed.
    pub fn parse(kind: CodeKind, input: &str) -> IdResult<Self> {
        let digits = input.strip_prefix(kind.prefix()).ok_or_else(|| {
            IdError::InvalidInput(format!(
                "code must start with '{}', got: '{}'",
                kind.prefix(),
                input
            ))
        })?;
        let millis = digits
            .parse::<i64>()
            .map_err(|e| IdError::InvalidInput(format!("Invalid timestamp in '{}': {}", input, e)))?;
        let timestamp = Utc
            .timestamp_millis_opt(millis)
            .single()
            .ok_or_else(|| IdError::InvalidInput(format!("timestamp out of range: '{}'", input)))?;
        Self::new(kind, timestamp)
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
}

impl fmt::Display for TimestampCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.kind.prefix(), self.timestamp.timestamp_millis())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    #[test]
    fn test_daily_code_display_pads_sequence() {
        let code = DailyCode::new(CodeKind::Uhid, day(2026, 10, 16), 7).unwrap();
        assert_eq!(code.to_string(), "UHID202610160007");
    }

    #[test]
    fn test_daily_code_grows_past_padding() {
        let code = DailyCode::new(CodeKind::Accession, day(2026, 10, 16), 12345).unwrap();
        assert_eq!(code.to_string(), "LAB2026101612345");

        let parsed = DailyCode::parse(CodeKind::Accession, "LAB2026101612345").unwrap();
        assert_eq!(parsed.seq(), 12345);
    }

    #[test]
    fn test_daily_code_parse_valid() {
        let code = DailyCode::parse(CodeKind::Visit, "VISIT202610160012").unwrap();
        assert_eq!(code.kind(), CodeKind::Visit);
        assert_eq!(code.date(), day(2026, 10, 16));
        assert_eq!(code.seq(), 12);
    }

    #[test]
    fn test_daily_code_parse_wrong_prefix() {
        let err = DailyCode::parse(CodeKind::Uhid, "VISIT202610160012").unwrap_err();
        match err {
            IdError::InvalidInput(msg) => assert!(msg.contains("must start with 'UHID'")),
        }
    }

    #[test]
    fn test_daily_code_parse_invalid_date() {
        let err = DailyCode::parse(CodeKind::Uhid, "UHID202613400001").unwrap_err();
        match err {
            IdError::InvalidInput(msg) => assert!(msg.contains("Invalid date")),
        }
    }

    #[test]
    fn test_daily_code_rejects_zero_sequence() {
        assert!(DailyCode::new(CodeKind::Uhid, day(2026, 1, 1), 0).is_err());
        assert!(DailyCode::parse(CodeKind::Uhid, "UHID202601010000").is_err());
    }

    #[test]
    fn test_daily_code_rejects_non_daily_kind() {
        assert!(DailyCode::new(CodeKind::OpdBill, day(2026, 1, 1), 1).is_err());
    }

    #[test]
    fn test_counter_key_changes_with_date() {
        let today = DailyCode::counter_key(CodeKind::Uhid, day(2026, 10, 16));
        let tomorrow = DailyCode::counter_key(CodeKind::Uhid, day(2026, 10, 17));

        assert_eq!(today, "uhid:20261016");
        assert_ne!(today, tomorrow);
    }

    #[test]
    fn test_serial_code_display_and_parse() {
        let code = SerialCode::new(CodeKind::OpdBill, 42).unwrap();
        assert_eq!(code.to_string(), "OPD-00042");

        let parsed = SerialCode::parse(CodeKind::OpdBill, "OPD-00042").unwrap();
        assert_eq!(parsed, code);
    }

    #[test]
    fn test_serial_code_rejects_letters() {
        assert!(SerialCode::parse(CodeKind::OpdBill, "OPD-00A42").is_err());
        assert!(SerialCode::parse(CodeKind::OpdBill, "OPD-").is_err());
    }

    #[test]
    fn test_timestamp_code_display() {
        let ts = Utc.timestamp_millis_opt(1_760_601_234_567).single().unwrap();
        let code = TimestampCode::new(CodeKind::Ipd, ts).unwrap();
        assert_eq!(code.to_string(), "IPD-1760601234567");
    }

    #[test]
    fn test_timestamp_code_truncates_to_millis() {
        let ts = Utc.timestamp_nanos(1_760_601_234_567_891_000);
        let code = TimestampCode::new(CodeKind::Appointment, ts).unwrap();
        let parsed = TimestampCode::parse(CodeKind::Appointment, &code.to_string()).unwrap();
        assert_eq!(parsed, code);
    }

    #[test]
    fn test_code_kind_from_str() {
        assert_eq!("UHID".parse::<CodeKind>().unwrap(), CodeKind::Uhid);
        assert_eq!("opd_bill".parse::<CodeKind>().unwrap(), CodeKind::OpdBill);
        assert!("invoice".parse::<CodeKind>().is_err());
    }
}
