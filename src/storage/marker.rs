//! The `.current.timestamp` marker
//!
//! Rewritten every time staging is promoted to `current`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::file_io::{read_json_required, write_json_atomic};
use crate::config::TargetLayout;
use crate::error::SnapResult;

/// What the marker records about the live snapshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentMarker {
    /// When `.tmp` became `current`
    pub promoted_at: DateTime<Utc>,
    /// Source locations as given for that run
    #[serde(default)]
    pub sources: Vec<String>,
}

impl CurrentMarker {
    pub fn new(promoted_at: DateTime<Utc>, sources: Vec<String>) -> Self {
        Self {
            promoted_at,
            sources,
        }
    }

    /// Read the marker, `None` if no promotion has happened yet
    pub fn load(layout: &TargetLayout) -> SnapResult<Option<Self>> {
        let path = layout.current_marker();
        if !path.exists() {
            return Ok(None);
        }
        read_json_required(&path).map(Some)
    }

    pub fn store(&self, layout: &TargetLayout) -> SnapResult<()> {
        write_json_atomic(layout.current_marker(), self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::TempDir;

    #[test]
    fn test_missing_marker() {
        let temp_dir = TempDir::new().unwrap();
        let layout = TargetLayout::new(temp_dir.path());

        assert!(CurrentMarker::load(&layout).unwrap().is_none());
    }

    #[test]
    fn test_store_replaces_previous() {
        let temp_dir = TempDir::new().unwrap();
        let layout = TargetLayout::new(temp_dir.path());

        let first = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let second = Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap();

        CurrentMarker::new(first, vec!["/home".into()])
            .store(&layout)
            .unwrap();
        CurrentMarker::new(second, vec!["/home".into()])
            .store(&layout)
            .unwrap();

        let loaded = CurrentMarker::load(&layout).unwrap().unwrap();
        assert_eq!(loaded.promoted_at, second);
        assert_eq!(loaded.sources, vec!["/home".to_string()]);
    }
}
