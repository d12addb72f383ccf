//! Timestamps for tracked-change attribution.
//!
//! Timestamps arrive on the wire either as ISO-8601 strings or as epoch
//! milliseconds. A [`Timestamp`] remembers which shape it came in so it
//! serializes back the same way, while comparisons only look at the instant.

use crate::{error::Result, Error};
use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

/// Wire format used when a timestamp is serialized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimestampFormat {
    /// `2024-01-01T00:00:00.000Z` (default)
    #[default]
    Iso,
    /// Milliseconds since the Unix epoch
    EpochMillis,
}

/// Wire shape of a [`Timestamp`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawTimestamp {
    Iso(String),
    EpochMillis(i64),
}

/// An instant with millisecond resolution.
///
/// Equality, hashing, and ordering use the instant only, so the same moment
/// received as a string and as a number compares equal.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(try_from = "RawTimestamp", into = "RawTimestamp")]
pub struct Timestamp {
    instant: DateTime<Utc>,
    format: TimestampFormat,
}

impl Timestamp {
    /// Current wall-clock time, serialized in the given format.
    pub fn now(format: TimestampFormat) -> Self {
        Self::from_datetime(Utc::now()).with_format(format)
    }

    /// Build from an instant, truncated to whole milliseconds. Serializes as
    /// ISO-8601.
    pub fn from_datetime(instant: DateTime<Utc>) -> Self {
        Self {
            instant: instant.trunc_subsecs(3),
            format: TimestampFormat::Iso,
        }
    }

    /// Build from milliseconds since the Unix epoch. Serializes as a number.
    pub fn from_millis(millis: i64) -> Result<Self> {
        let instant = DateTime::<Utc>::from_timestamp_millis(millis).ok_or_else(|| {
            Error::MalformedInput(format!("timestamp out of range: {millis}"))
        })?;
        Ok(Self {
            instant,
            format: TimestampFormat::EpochMillis,
        })
    }

    /// Parse an ISO-8601 string.
    ///
    /// RFC 3339 is tried first, then an offset without a colon (`+0000`).
    /// A date-time without an offset, or a bare date, is taken as UTC.
    pub fn parse_iso(s: &str) -> Result<Self> {
        let instant = match DateTime::parse_from_rfc3339(s) {
            Ok(parsed) => parsed.with_timezone(&Utc),
            Err(err) => parse_iso_fallback(s)
                .ok_or_else(|| Error::MalformedInput(format!("invalid timestamp '{s}': {err}")))?,
        };
        Ok(Self::from_datetime(instant))
    }

    pub fn from_raw(raw: RawTimestamp) -> Result<Self> {
        match raw {
            RawTimestamp::Iso(s) => Self::parse_iso(&s),
            RawTimestamp::EpochMillis(millis) => Self::from_millis(millis),
        }
    }

    pub fn to_raw(&self) -> RawTimestamp {
        match self.format {
            TimestampFormat::Iso => {
                RawTimestamp::Iso(self.instant.to_rfc3339_opts(SecondsFormat::Millis, true))
            }
            TimestampFormat::EpochMillis => RawTimestamp::EpochMillis(self.as_millis()),
        }
    }

    /// Same instant, different wire format.
    pub fn with_format(mut self, format: TimestampFormat) -> Self {
        self.format = format;
        self
    }

    pub fn as_datetime(&self) -> DateTime<Utc> {
        self.instant
    }

    pub fn as_millis(&self) -> i64 {
        self.instant.timestamp_millis()
    }

    pub fn format(&self) -> TimestampFormat {
        self.format
    }

    /// The later of two timestamps. On a tie the first one is returned.
    pub fn later(a: Timestamp, b: Timestamp) -> Timestamp {
        if a >= b {
            a
        } else {
            b
        }
    }
}

fn parse_iso_fallback(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(parsed) = DateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f%z") {
        return Some(parsed.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(naive.and_utc());
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

impl PartialEq for Timestamp {
    fn eq(&self, other: &Self) -> bool {
        self.instant == other.instant
    }
}

impl Eq for Timestamp {}

impl Hash for Timestamp {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.instant.hash(state);
    }
}

impl Ord for Timestamp {
    fn cmp(&self, other: &Self) -> Ordering {
        self.instant.cmp(&other.instant)
    }
}

impl PartialOrd for Timestamp {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl TryFrom<RawTimestamp> for Timestamp {
    type Error = Error;

    fn try_from(raw: RawTimestamp) -> Result<Self> {
        Self::from_raw(raw)
    }
}

impl From<Timestamp> for RawTimestamp {
    fn from(ts: Timestamp) -> Self {
        ts.to_raw()
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(instant: DateTime<Utc>) -> Self {
        Self::from_datetime(instant)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}",
            self.instant.to_rfc3339_opts(SecondsFormat::Millis, true)
        )
    }
}
