//! Path management for snaprotate settings
//!
//! ## Path Resolution Order
//!
//! 1. `SNAPROTATE_CONFIG` environment variable (path to the settings file)
//! 2. `$XDG_CONFIG_HOME/snaprotate/config.json`
//! 3. `~/.config/snaprotate/config.json`

use std::path::PathBuf;

use crate::error::SnapError;

/// Environment variable naming an explicit settings file
pub const CONFIG_ENV: &str = "SNAPROTATE_CONFIG";

/// Locates the settings file
#[derive(Debug, Clone)]
pub struct ConfigPaths {
    settings_file: PathBuf,
}

impl ConfigPaths {
    /// Resolve the settings file location from the environment
    ///
    /// # Errors
    ///
    /// Returns an error if neither `XDG_CONFIG_HOME` nor `HOME` is set.
    pub fn new() -> Result<Self, SnapError> {
        let settings_file = match std::env::var_os(CONFIG_ENV) {
            Some(custom) if !custom.is_empty() => PathBuf::from(custom),
            _ => resolve_default_dir()?.join("config.json"),
        };

        Ok(Self { settings_file })
    }

    /// Use an explicit settings file (useful for testing)
    pub fn with_settings_file(settings_file: PathBuf) -> Self {
        Self { settings_file }
    }

    /// Path to the settings file
    pub fn settings_file(&self) -> &PathBuf {
        &self.settings_file
    }

    /// Directory holding the settings file
    pub fn config_dir(&self) -> Option<PathBuf> {
        self.settings_file.parent().map(|p| p.to_path_buf())
    }
}

fn resolve_default_dir() -> Result<PathBuf, SnapError> {
    let config_base = match std::env::var_os("XDG_CONFIG_HOME") {
        Some(xdg) if !xdg.is_empty() => PathBuf::from(xdg),
        _ => {
            let home = std::env::var_os("HOME").ok_or_else(|| {
                SnapError::Config("Neither XDG_CONFIG_HOME nor HOME is set".into())
            })?;
            PathBuf::from(home).join(".config")
        }
    };
    Ok(config_base.join("snaprotate"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_explicit_settings_file() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("custom.json");
        let paths = ConfigPaths::with_settings_file(file.clone());

        assert_eq!(paths.settings_file(), &file);
        assert_eq!(paths.config_dir(), Some(temp_dir.path().to_path_buf()));
    }

    #[test]
    fn test_env_var_override() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("from-env.json");

        std::env::set_var(CONFIG_ENV, &file);
        let paths = ConfigPaths::new().unwrap();
        std::env::remove_var(CONFIG_ENV);

        assert_eq!(paths.settings_file(), &file);
    }
}
