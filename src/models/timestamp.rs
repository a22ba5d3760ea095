//! Snapshot timestamps
//!
//! Second precision UTC instants rendered as `YYYY-MM-DD@HH:MM:SS+00`.
//! The rendering is fixed width, so lexical order equals chronological order.

use chrono::{DateTime, Duration, NaiveDateTime, SubsecRound, Utc};
use std::fmt;

const NAME_FORMAT: &str = "%Y-%m-%d@%H:%M:%S";
const UTC_SUFFIX: &str = "+00";

/// A UTC instant truncated to whole seconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SnapshotTime(DateTime<Utc>);

impl SnapshotTime {
    pub fn new(instant: DateTime<Utc>) -> Self {
        Self(instant.trunc_subsecs(0))
    }

    pub fn now() -> Self {
        Self::new(Utc::now())
    }

    pub fn instant(&self) -> DateTime<Utc> {
        self.0
    }

    /// Parse the exact name form; anything else is rejected
    pub fn parse(s: &str) -> Result<Self, TimestampParseError> {
        let body = s
            .strip_suffix(UTC_SUFFIX)
            .ok_or_else(|| TimestampParseError(s.to_string()))?;

        // chrono accepts some unpadded fields; the fixed width keeps names sortable
        if body.len() != "YYYY-MM-DD@HH:MM:SS".len() {
            return Err(TimestampParseError(s.to_string()));
        }

        let naive = NaiveDateTime::parse_from_str(body, NAME_FORMAT)
            .map_err(|_| TimestampParseError(s.to_string()))?;
        Ok(Self(naive.and_utc()))
    }

    /// How long before `now` this instant lies; negative when in the future
    pub fn age_at(&self, now: SnapshotTime) -> Duration {
        now.0.signed_duration_since(self.0)
    }
}

impl fmt::Display for SnapshotTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.0.format(NAME_FORMAT), UTC_SUFFIX)
    }
}

impl From<DateTime<Utc>> for SnapshotTime {
    fn from(instant: DateTime<Utc>) -> Self {
        Self::new(instant)
    }
}

/// Error type for timestamp parsing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimestampParseError(pub String);

impl fmt::Display for TimestampParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Invalid snapshot timestamp: {}", self.0)
    }
}

impl std::error::Error for TimestampParseError {}
