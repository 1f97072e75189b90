//! Dual-format timestamp used in JSON bodies.
//!
//! The API emits instants either as integer epoch seconds or as RFC 3339
//! strings, sometimes both within one payload. Decoding accepts either;
//! encoding always produces RFC 3339 in UTC with at most millisecond
//! precision and trailing zeros trimmed (`2019-10-12T07:20:50.52Z`).

use std::fmt;

use chrono::{DateTime, SubsecRound, Timelike, Utc};
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::DecodeError;

/// An instant in time as exchanged with the API.
///
/// Stored at millisecond precision, the finest the wire form carries.
/// Equality compares instants, so an epoch-encoded and a string-encoded
/// value for the same second are equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Sub-millisecond digits are truncated.
    pub fn new(instant: DateTime<Utc>) -> Self {
        Self(instant.trunc_subsecs(3))
    }

    pub fn instant(&self) -> DateTime<Utc> {
        self.0
    }

    /// Decode a raw JSON token: an integer, or a quoted RFC 3339 string.
    pub fn decode(raw: &str) -> Result<Self, DecodeError> {
        let raw = raw.trim();
        if let Ok(secs) = raw.parse::<i64>() {
            return Self::from_epoch_seconds(secs)
                .ok_or_else(|| DecodeError::MalformedTimestamp(raw.to_string()));
        }
        raw.strip_prefix('"')
            .and_then(|s| s.strip_suffix('"'))
            .and_then(|s| Self::parse_rfc3339(s).ok())
            .ok_or_else(|| DecodeError::MalformedTimestamp(raw.to_string()))
    }

    /// Encode as RFC 3339, UTC, millisecond precision with trailing zeros trimmed.
    pub fn encode(&self) -> String {
        let instant = self.0;
        let mut out = instant.format("%Y-%m-%dT%H:%M:%S").to_string();
        let millis = instant.nanosecond() / 1_000_000;
        if millis != 0 {
            let frac = format!("{millis:03}");
            out.push('.');
            out.push_str(frac.trim_end_matches('0'));
        }
        out.push('Z');
        out
    }

    fn from_epoch_seconds(secs: i64) -> Option<Self> {
        DateTime::from_timestamp(secs, 0).map(Self)
    }

    fn parse_rfc3339(s: &str) -> Result<Self, DecodeError> {
        DateTime::parse_from_rfc3339(s)
            .map(|dt| Self::new(dt.with_timezone(&Utc)))
            .map_err(|_| DecodeError::MalformedTimestamp(s.to_string()))
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(instant: DateTime<Utc>) -> Self {
        Self::new(instant)
    }
}

impl From<Timestamp> for DateTime<Utc> {
    fn from(ts: Timestamp) -> Self {
        ts.0
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

impl Serialize for Timestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.encode())
    }
}

impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(TimestampVisitor)
    }
}

struct TimestampVisitor;

impl Visitor<'_> for TimestampVisitor {
    type Value = Timestamp;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("epoch seconds or an RFC 3339 string")
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Timestamp, E> {
        Timestamp::from_epoch_seconds(v)
            .ok_or_else(|| E::custom(DecodeError::MalformedTimestamp(v.to_string())))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Timestamp, E> {
        i64::try_from(v)
            .ok()
            .and_then(Timestamp::from_epoch_seconds)
            .ok_or_else(|| E::custom(DecodeError::MalformedTimestamp(v.to_string())))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Timestamp, E> {
        Timestamp::parse_rfc3339(v).map_err(E::custom)
    }
}
