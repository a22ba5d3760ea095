//! Fixed names inside a target root
//!
//! ```text
//! <root>/current              live snapshot
//! <root>/.tmp                 staging directory
//! <root>/.lock                lock artifact
//! <root>/.current.timestamp   promotion marker
//! <root>/hist.<ts>[t]         level 1 history
//! <root>/histN.<ts>[t]        level N history (N >= 2)
//! ```

use std::path::{Path, PathBuf};

use crate::models::HistoryEntry;

pub const CURRENT_DIR: &str = "current";
pub const STAGING_DIR: &str = ".tmp";
pub const LOCK_FILE: &str = ".lock";
pub const CURRENT_MARKER: &str = ".current.timestamp";

/// Paths of the well-known entries under one target root
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetLayout {
    root: PathBuf,
}

impl TargetLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn current(&self) -> PathBuf {
        self.root.join(CURRENT_DIR)
    }

    pub fn staging(&self) -> PathBuf {
        self.root.join(STAGING_DIR)
    }

    pub fn lock_file(&self) -> PathBuf {
        self.root.join(LOCK_FILE)
    }

    pub fn current_marker(&self) -> PathBuf {
        self.root.join(CURRENT_MARKER)
    }

    /// Path of a history entry, including its tag suffix
    pub fn entry(&self, entry: &HistoryEntry) -> PathBuf {
        self.root.join(entry.file_name())
    }

    /// Whether `current` is present (any file type)
    pub fn has_current(&self) -> bool {
        self.current().symlink_metadata().is_ok()
    }

    /// Whether a staging directory was left behind
    pub fn has_staging(&self) -> bool {
        self.staging().symlink_metadata().is_ok()
    }
}
