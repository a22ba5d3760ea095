//! Read-only CLI commands
//!
//! `list`, `status` and `config` never take the target lock and never
//! modify anything.

use crate::config::{ConfigPaths, Settings, TargetLayout};
use crate::display::{format_history_list, format_status, TargetStatus};
use crate::error::{SnapError, SnapResult};
use crate::models::{PathSpec, RetentionPolicy, SnapshotTime};
use crate::services::{validate_target, HistoryIndex, TargetLock};
use crate::storage::CurrentMarker;

/// Resolve a target argument to its local layout
pub fn resolve_layout(target: &str) -> SnapResult<TargetLayout> {
    let spec = PathSpec::resolve(target)?;
    validate_target(&spec)?;
    spec.abs_path()
        .map(TargetLayout::new)
        .ok_or_else(|| SnapError::UnsupportedRemoteTarget(target.to_string()))
}

/// Gather the status of a target without modifying it
pub fn target_status(layout: &TargetLayout) -> SnapResult<TargetStatus> {
    Ok(TargetStatus {
        has_current: layout.has_current(),
        has_staging: layout.has_staging(),
        lock_held: TargetLock::is_held(layout)?,
        marker: CurrentMarker::load(layout)?,
        history_count: HistoryIndex::scan(layout)?.len(),
    })
}

/// Handle `list`
pub fn handle_list_command(settings: &Settings, target: &str, policy: Option<&str>) -> SnapResult<()> {
    let layout = resolve_layout(target)?;
    if !layout.root().is_dir() {
        return Err(SnapError::target_root(layout.root(), "does not exist"));
    }
    let policy: RetentionPolicy = match policy {
        Some(raw) => raw.parse()?,
        None => settings.retention.clone(),
    };

    let index = HistoryIndex::scan(&layout)?;
    println!(
        "current: {}   staging: {}",
        if layout.has_current() { "present" } else { "missing" },
        if layout.has_staging() { "present" } else { "none" }
    );
    println!();
    println!("{}", format_history_list(&index, &policy, SnapshotTime::now()));
    Ok(())
}

/// Handle `status`
pub fn handle_status_command(target: &str) -> SnapResult<()> {
    let layout = resolve_layout(target)?;
    if !layout.root().is_dir() {
        return Err(SnapError::target_root(layout.root(), "does not exist"));
    }
    let status = target_status(&layout)?;
    println!("{}", format_status(&layout, &status, SnapshotTime::now()));
    Ok(())
}

/// Handle `config`
pub fn handle_config_command(paths: &ConfigPaths, settings: &Settings) -> SnapResult<()> {
    println!("snaprotate Configuration");
    println!("========================");
    println!();
    println!("Settings file: {}", paths.settings_file().display());
    println!(
        "  (exists: {})",
        if paths.settings_file().exists() { "yes" } else { "no" }
    );
    println!();
    println!("{}", serde_json::to_string_pretty(settings)?);
    Ok(())
}
