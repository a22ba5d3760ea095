//! History entries
//!
//! A history entry is `(level, timestamp, tagged)`. On disk it is a directory
//! named `hist.<ts>` for level 1 and `hist<level>.<ts>` above that, with a
//! trailing `t` when tagged. [`HistoryEntry::parse`] and
//! [`HistoryEntry::file_name`] are the only places that know this encoding.

use std::cmp::Ordering;
use std::fmt;

use super::timestamp::SnapshotTime;

const PREFIX: &str = "hist";
const TAG_SUFFIX: char = 't';

/// One snapshot in the rotation history
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HistoryEntry {
    pub level: u32,
    pub timestamp: SnapshotTime,
    pub tagged: bool,
}

impl HistoryEntry {
    /// An untagged entry
    ///
    /// # Panics
    ///
    /// Panics if `level` is zero; levels start at 1.
    pub fn new(level: u32, timestamp: SnapshotTime) -> Self {
        assert!(level >= 1, "history levels start at 1");
        Self {
            level,
            timestamp,
            tagged: false,
        }
    }

    pub fn tagged(self) -> Self {
        Self {
            tagged: true,
            ..self
        }
    }

    pub fn untagged(self) -> Self {
        Self {
            tagged: false,
            ..self
        }
    }

    /// The same snapshot one level up, tag cleared
    pub fn promoted(self) -> Self {
        Self {
            level: self.level + 1,
            tagged: false,
            ..self
        }
    }

    /// Directory name encoding this entry
    pub fn file_name(&self) -> String {
        let mut name = if self.level == 1 {
            format!("{}.{}", PREFIX, self.timestamp)
        } else {
            format!("{}{}.{}", PREFIX, self.level, self.timestamp)
        };
        if self.tagged {
            name.push(TAG_SUFFIX);
        }
        name
    }

    /// Decode a directory name
    ///
    /// Names that do not look like history entries at all yield
    /// [`HistoryNameError::NotHistory`]; names with a history prefix but a
    /// bad timestamp yield [`HistoryNameError::BadTimestamp`] so callers can
    /// warn about them at the right level.
    pub fn parse(name: &str) -> Result<Self, HistoryNameError> {
        let rest = name.strip_prefix(PREFIX).ok_or(HistoryNameError::NotHistory)?;
        let (level_part, stamp_part) = rest.split_once('.').ok_or(HistoryNameError::NotHistory)?;

        let level = if level_part.is_empty() {
            1
        } else if level_part.bytes().all(|b| b.is_ascii_digit()) && !level_part.starts_with('0') {
            match level_part.parse::<u32>() {
                // `hist1.` is never produced; level 1 has no number
                Ok(n) if n >= 2 => n,
                _ => return Err(HistoryNameError::NotHistory),
            }
        } else {
            return Err(HistoryNameError::NotHistory);
        };

        let (stamp, tagged) = match stamp_part.strip_suffix(TAG_SUFFIX) {
            Some(stamp) => (stamp, true),
            None => (stamp_part, false),
        };

        let timestamp = SnapshotTime::parse(stamp).map_err(|_| HistoryNameError::BadTimestamp {
            level,
            name: name.to_string(),
        })?;

        Ok(Self {
            level,
            timestamp,
            tagged,
        })
    }

    /// Newest first, the order rotation walks a level in
    pub fn newest_first(a: &Self, b: &Self) -> Ordering {
        b.timestamp.cmp(&a.timestamp)
    }
}

impl fmt::Display for HistoryEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.file_name())
    }
}

/// Why a directory name is not a usable history entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HistoryNameError {
    /// Not a history name (e.g. `current`, `.tmp`, unrelated files)
    NotHistory,
    /// A history name for `level` whose timestamp cannot be read
    BadTimestamp { level: u32, name: String },
}

impl fmt::Display for HistoryNameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HistoryNameError::NotHistory => write!(f, "Not a history entry name"),
            HistoryNameError::BadTimestamp { level, name } => {
                write!(f, "Unreadable timestamp in level {} entry '{}'", level, name)
            }
        }
    }
}

impl std::error::Error for HistoryNameError {}
