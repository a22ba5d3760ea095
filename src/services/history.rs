//! History listing
//!
//! Reads a target root once and buckets its history entries by level.

use std::collections::BTreeMap;
use std::fs;

use crate::config::TargetLayout;
use crate::error::{SnapError, SnapResult};
use crate::models::{HistoryEntry, HistoryNameError};

/// A directory name with a history prefix but no readable timestamp
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnreadableEntry {
    pub level: u32,
    pub name: String,
}

/// History entries of one target root, grouped by level
#[derive(Debug, Clone, Default)]
pub struct HistoryIndex {
    levels: BTreeMap<u32, Vec<HistoryEntry>>,
    unreadable: Vec<UnreadableEntry>,
}

impl HistoryIndex {
    /// Scan the target root; a missing root is an empty history
    pub fn scan(layout: &TargetLayout) -> SnapResult<Self> {
        let mut index = Self::default();
        if !layout.root().exists() {
            return Ok(index);
        }

        let dir = fs::read_dir(layout.root()).map_err(|e| {
            SnapError::Io(format!(
                "Failed to read target root {}: {}",
                layout.root().display(),
                e
            ))
        })?;

        for entry in dir {
            let entry = entry
                .map_err(|e| SnapError::Io(format!("Failed to read directory entry: {}", e)))?;
            let name = entry.file_name();
            let Some(name) = name.to_str() else {
                continue;
            };

            match HistoryEntry::parse(name) {
                Ok(history) => index.insert(history),
                Err(HistoryNameError::BadTimestamp { level, name }) => {
                    index.unreadable.push(UnreadableEntry { level, name });
                }
                Err(HistoryNameError::NotHistory) => {}
            }
        }

        index.unreadable.sort_by(|a, b| (a.level, &a.name).cmp(&(b.level, &b.name)));
        Ok(index)
    }

    /// Add an entry, keeping its level sorted newest first
    pub fn insert(&mut self, entry: HistoryEntry) {
        let level = self.levels.entry(entry.level).or_default();
        level.push(entry);
        level.sort_by(HistoryEntry::newest_first);
    }

    /// Entries of one level, newest first
    pub fn level(&self, level: u32) -> &[HistoryEntry] {
        self.levels.get(&level).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Remove and return one level's entries, newest first
    pub fn take_level(&mut self, level: u32) -> Vec<HistoryEntry> {
        self.levels.remove(&level).unwrap_or_default()
    }

    /// Levels that currently hold entries, ascending
    pub fn levels(&self) -> impl Iterator<Item = u32> + '_ {
        self.levels
            .iter()
            .filter(|(_, entries)| !entries.is_empty())
            .map(|(level, _)| *level)
    }

    pub fn unreadable(&self) -> &[UnreadableEntry] {
        &self.unreadable
    }

    pub fn len(&self) -> usize {
        self.levels.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
