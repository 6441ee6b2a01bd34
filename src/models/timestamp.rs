//! Timestamp parsing and UTC normalization
//!
//! Dates reach the analysis layer as ISO-8601 text (query parameters, JSONB
//! history) or as typed chrono values. Everything is normalized to UTC once,
//! here, before any comparison happens:
//!
//! - naive timestamps (no offset) are read as UTC wall-clock time
//! - offset-carrying timestamps are converted to the same instant in UTC
//!
//! The original representation is remembered so callers can detect inputs
//! that mix both kinds.

use std::fmt;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

/// Offset-carrying forms rfc3339 rejects: minutes precision, compact `±HHMM`
const OFFSET_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M%:z",
    "%Y-%m-%dT%H:%M:%S%.f%z",
    "%Y-%m-%d %H:%M:%S%.f%z",
];

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Whether a timestamp carried zone information before normalization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ZoneKind {
    Naive,
    Offset,
}

/// An instant in UTC plus the zone kind it was parsed from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NormalizedTimestamp {
    pub utc: DateTime<Utc>,
    pub zone: ZoneKind,
}

impl NormalizedTimestamp {
    pub fn naive(value: NaiveDateTime) -> Self {
        Self {
            utc: value.and_utc(),
            zone: ZoneKind::Naive,
        }
    }

    pub fn with_offset<Tz: chrono::TimeZone>(value: DateTime<Tz>) -> Self {
        Self {
            utc: value.with_timezone(&Utc),
            zone: ZoneKind::Offset,
        }
    }

    pub fn is_naive(&self) -> bool {
        self.zone == ZoneKind::Naive
    }

    /// Render back to ISO-8601, keeping naive values naive
    pub fn to_iso_string(&self) -> String {
        match self.zone {
            ZoneKind::Naive => self.utc.naive_utc().format("%Y-%m-%dT%H:%M:%S%.f").to_string(),
            ZoneKind::Offset => self.utc.to_rfc3339(),
        }
    }
}

impl fmt::Display for NormalizedTimestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.utc.to_rfc3339())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unrecognized ISO-8601 timestamp: {input:?}")]
pub struct TimestampParseError {
    pub input: String,
}

/// Parse ISO-8601 text: `YYYY-MM-DD`, `YYYY-MM-DDTHH:MM[:SS[.f]]`, with an
/// optional `Z`, `±HH:MM` or `±HHMM` suffix. A date alone means midnight.
pub fn parse_timestamp(input: &str) -> Result<NormalizedTimestamp, TimestampParseError> {
    let text = input.trim();

    if let Ok(parsed) = DateTime::parse_from_rfc3339(text) {
        return Ok(NormalizedTimestamp::with_offset(parsed));
    }
    for format in OFFSET_FORMATS {
        if let Ok(parsed) = DateTime::parse_from_str(text, format) {
            return Ok(NormalizedTimestamp::with_offset(parsed));
        }
    }

    for format in NAIVE_FORMATS {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(text, format) {
            return Ok(NormalizedTimestamp::naive(parsed));
        }
    }

    if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        if let Some(midnight) = date.and_hms_opt(0, 0, 0) {
            return Ok(NormalizedTimestamp::naive(midnight));
        }
    }

    Err(TimestampParseError {
        input: input.to_string(),
    })
}

/// A date argument as supplied by a caller: text or an already-typed value
#[derive(Debug, Clone, PartialEq)]
pub enum DateInput {
    Text(String),
    Naive(NaiveDateTime),
    Utc(DateTime<Utc>),
    Offset(DateTime<FixedOffset>),
}

impl DateInput {
    pub fn normalize(&self) -> Result<NormalizedTimestamp, TimestampParseError> {
        match self {
            Self::Text(text) => parse_timestamp(text),
            Self::Naive(value) => Ok(NormalizedTimestamp::naive(*value)),
            Self::Utc(value) => Ok(NormalizedTimestamp::with_offset(*value)),
            Self::Offset(value) => Ok(NormalizedTimestamp::with_offset(*value)),
        }
    }
}

impl fmt::Display for DateInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(text) => write!(f, "{}", text),
            Self::Naive(value) => write!(f, "{}", value.format("%Y-%m-%dT%H:%M:%S%.f")),
            Self::Utc(value) => write!(f, "{}", value.to_rfc3339()),
            Self::Offset(value) => write!(f, "{}", value.to_rfc3339()),
        }
    }
}

impl From<&str> for DateInput {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for DateInput {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<&String> for DateInput {
    fn from(value: &String) -> Self {
        Self::Text(value.clone())
    }
}

impl From<NaiveDateTime> for DateInput {
    fn from(value: NaiveDateTime) -> Self {
        Self::Naive(value)
    }
}

impl From<NaiveDate> for DateInput {
    fn from(value: NaiveDate) -> Self {
        Self::Naive(value.and_time(chrono::NaiveTime::default()))
    }
}

impl From<DateTime<Utc>> for DateInput {
    fn from(value: DateTime<Utc>) -> Self {
        Self::Utc(value)
    }
}

impl From<DateTime<FixedOffset>> for DateInput {
    fn from(value: DateTime<FixedOffset>) -> Self {
        Self::Offset(value)
    }
}
