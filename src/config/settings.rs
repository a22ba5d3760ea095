//! User settings for snaprotate
//!
//! Holds the default retention policy, the external tool names, and the
//! default passthrough options for the sync tool. Every field has a default
//! so a missing or partial settings file is fine.

use serde::{Deserialize, Serialize};

use super::paths::ConfigPaths;
use crate::error::SnapError;
use crate::models::RetentionPolicy;
use crate::storage::file_io::{read_json, write_json_atomic};

/// External tool configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolSettings {
    /// Program used to populate the staging directory
    #[serde(default = "default_sync_program")]
    pub sync_program: String,

    /// Program used to delete evicted history entries
    #[serde(default = "default_remove_program")]
    pub remove_program: String,

    /// Run removals under `nice -n <value>`; `null` runs them directly
    #[serde(default = "default_remove_niceness")]
    pub remove_niceness: Option<i8>,
}

fn default_sync_program() -> String {
    "rsync".to_string()
}

fn default_remove_program() -> String {
    "rm".to_string()
}

fn default_remove_niceness() -> Option<i8> {
    Some(19)
}

impl Default for ToolSettings {
    fn default() -> Self {
        Self {
            sync_program: default_sync_program(),
            remove_program: default_remove_program(),
            remove_niceness: default_remove_niceness(),
        }
    }
}

/// User settings for snaprotate
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Schema version for migration support
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,

    /// Retention policy used when none is given on the command line
    #[serde(default)]
    pub retention: RetentionPolicy,

    /// External tools
    #[serde(default)]
    pub tools: ToolSettings,

    /// Extra options always passed to the sync tool
    #[serde(default)]
    pub sync_options: Vec<String>,

    /// Nest each source under its own name even for a single source
    #[serde(default)]
    pub extra_dir: bool,
}

fn default_schema_version() -> u32 {
    1
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            schema_version: default_schema_version(),
            retention: RetentionPolicy::default(),
            tools: ToolSettings::default(),
            sync_options: Vec::new(),
            extra_dir: false,
        }
    }
}

impl Settings {
    /// Load settings from disk, falling back to defaults if the file is absent
    pub fn load_or_default(paths: &ConfigPaths) -> Result<Self, SnapError> {
        read_json(paths.settings_file()).map_err(|e| {
            SnapError::Config(format!(
                "Failed to load settings from {}: {}",
                paths.settings_file().display(),
                e
            ))
        })
    }

    /// Save settings to disk
    pub fn save(&self, paths: &ConfigPaths) -> Result<(), SnapError> {
        write_json_atomic(paths.settings_file(), self)
    }
}
