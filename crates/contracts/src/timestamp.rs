//! Timestamp model and basis heuristics.

use serde::{Deserialize, Serialize};

use crate::ExtractError;

/// Millisecond timestamp, relative or absolute basis
pub type Timestamp = u64;

/// 2000-01-01T00:00:00Z in Unix epoch milliseconds.
///
/// Timestamps above this value are classified as absolute.
pub const ABSOLUTE_THRESHOLD_MS: Timestamp = 946_684_800_000;

/// Timestamp basis
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimestampBasis {
    /// Infer from the year-2000 heuristic and the reference time
    #[default]
    Auto,
    /// Milliseconds since recording start
    Relative,
    /// Unix epoch milliseconds
    Absolute,
}

/// Whether `ts` looks like a Unix epoch timestamp rather than a recording offset
#[inline]
pub fn is_absolute_timestamp(ts: Timestamp) -> bool {
    ts > ABSOLUTE_THRESHOLD_MS
}

/// Truncate a microsecond stream timestamp to milliseconds
#[inline]
pub fn micros_to_millis(micros: u64) -> Timestamp {
    micros / 1000
}

/// Parse a textual timestamp as an unsigned integer.
///
/// Follows `strtoul` base detection: `0x`/`0X` prefix is hexadecimal,
/// a leading `0` followed by more digits is octal, anything else decimal.
/// Leading and trailing whitespace is ignored, an optional `+` sign is accepted.
pub fn parse_timestamp(text: &str) -> Result<Timestamp, ExtractError> {
    let trimmed = text.trim();
    let digits = trimmed.strip_prefix('+').unwrap_or(trimmed);

    let (radix, body) = if let Some(hex) = digits
        .strip_prefix("0x")
        .or_else(|| digits.strip_prefix("0X"))
    {
        (16, hex)
    } else if digits.len() > 1 && digits.starts_with('0') {
        (8, &digits[1..])
    } else {
        (10, digits)
    };

    if body.is_empty() || body.starts_with(['+', '-']) {
        return Err(ExtractError::timestamp_parse(text, "no digits"));
    }

    Timestamp::from_str_radix(body, radix)
        .map_err(|e| ExtractError::timestamp_parse(text, e.to_string()))
}

/// A target timestamp as written by a caller: number or text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TimestampValue {
    Number(Timestamp),
    Text(String),
}

impl TimestampValue {
    /// Resolve to a millisecond timestamp
    pub fn resolve(&self) -> Result<Timestamp, ExtractError> {
        match self {
            Self::Number(ts) => Ok(*ts),
            Self::Text(text) => parse_timestamp(text),
        }
    }
}

impl From<Timestamp> for TimestampValue {
    fn from(ts: Timestamp) -> Self {
        Self::Number(ts)
    }
}

impl From<&str> for TimestampValue {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}
