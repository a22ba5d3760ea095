//! Snapshot staging and promotion
//!
//! A backup fills `<root>/.tmp` with the sync tool, demotes `current` to a
//! level 1 history entry, and renames `.tmp` to `current`. A sync failure or
//! a failed rename is logged and the run continues: `.tmp` is never
//! discarded, so the next run resumes it and only transfers the difference.

use std::fs;
use std::path::Path;

use tracing::{info, warn};

use crate::config::TargetLayout;
use crate::error::{SnapError, SnapResult};
use crate::models::{HistoryEntry, PathSpec, SnapshotTime};
use crate::storage::CurrentMarker;
use crate::tools::sync::is_partial_transfer;
use crate::tools::{SyncCommand, ToolRunner, ToolStatus};

/// Options for one staging run
#[derive(Debug, Clone, Default)]
pub struct StageOptions {
    /// Nest each source under its own name inside the snapshot
    pub nested: bool,
    /// Extra options for the sync tool
    pub passthrough: Vec<String>,
}

/// What happened during a staging run
#[derive(Debug, Clone)]
pub struct StageReport {
    /// A `.tmp` from an earlier run was picked up
    pub resumed: bool,
    pub sync_status: ToolStatus,
    /// The history entry the previous `current` became
    pub demoted: Option<HistoryEntry>,
    /// `.tmp` is now `current`
    pub promoted: bool,
    pub warnings: Vec<String>,
}

impl StageReport {
    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }
}

/// Create the target root if needed
pub fn prepare_root(layout: &TargetLayout) -> SnapResult<()> {
    let root = layout.root();
    fs::create_dir_all(root).map_err(|e| SnapError::target_root(root, e))?;
    if !root.is_dir() {
        return Err(SnapError::target_root(root, "not a directory"));
    }
    Ok(())
}

/// Drives the sync tool and the promotion renames for one target root
pub struct Stager<'a, R: ToolRunner + ?Sized> {
    layout: &'a TargetLayout,
    runner: &'a R,
    sync_program: String,
}

impl<'a, R: ToolRunner + ?Sized> Stager<'a, R> {
    pub fn new(layout: &'a TargetLayout, runner: &'a R, sync_program: impl Into<String>) -> Self {
        Self {
            layout,
            runner,
            sync_program: sync_program.into(),
        }
    }

    /// Stage `sources` and promote, timestamping the demoted snapshot now
    pub fn stage(&self, sources: &[PathSpec], options: &StageOptions) -> SnapResult<StageReport> {
        self.stage_at(sources, options, SnapshotTime::now)
    }

    /// As [`Stager::stage`], reading the clock through `now`
    ///
    /// Only a failure to start the sync tool is returned as an error.
    pub fn stage_at(
        &self,
        sources: &[PathSpec],
        options: &StageOptions,
        now: impl Fn() -> SnapshotTime,
    ) -> SnapResult<StageReport> {
        prepare_root(self.layout)?;

        let staging = self.layout.staging();
        let current = self.layout.current();
        let resumed = self.layout.has_staging();
        if resumed {
            info!(path = %staging.display(), "resuming interrupted staging directory");
        }

        let mut warnings = Vec::new();

        let link_dest = self.layout.has_current().then(|| current.clone());
        let invocation = SyncCommand::new(&self.sync_program)
            .link_dest(link_dest)
            .passthrough(options.passthrough.iter().cloned())
            .invocation(sources, options.nested, &staging);

        info!(sources = sources.len(), nested = options.nested, "syncing into staging");
        let sync_status = self.runner.run(&invocation)?;
        if !sync_status.success() {
            let kind = if is_partial_transfer(&sync_status) {
                "partial transfer"
            } else {
                "failure"
            };
            let msg = format!("sync tool reported {} ({}); keeping what was copied", kind, sync_status);
            warn!("{}", msg);
            warnings.push(msg);
        }

        let mut report = StageReport {
            resumed,
            sync_status,
            demoted: None,
            promoted: false,
            warnings,
        };

        if !self.layout.has_staging() {
            let msg = format!("nothing staged at {}; current left as is", staging.display());
            warn!("{}", msg);
            report.warnings.push(msg);
            return Ok(report);
        }

        if self.layout.has_current() {
            let demoted = HistoryEntry::new(1, now());
            let destination = self.layout.entry(&demoted);
            match rename(&current, &destination) {
                Ok(()) => {
                    info!(entry = %demoted, "demoted previous snapshot");
                    report.demoted = Some(demoted);
                }
                Err(msg) => {
                    warn!("{}", msg);
                    report.warnings.push(msg);
                }
            }
        }

        if self.layout.has_current() {
            let msg = format!(
                "{} still present; {} kept for the next run",
                current.display(),
                staging.display()
            );
            warn!("{}", msg);
            report.warnings.push(msg);
            return Ok(report);
        }

        match rename(&staging, &current) {
            Ok(()) => {
                info!(path = %current.display(), "promoted staging to current");
                report.promoted = true;
            }
            Err(msg) => {
                warn!("{}", msg);
                report.warnings.push(msg);
                return Ok(report);
            }
        }

        let marker = CurrentMarker::new(
            now().instant(),
            sources.iter().map(|s| s.raw().to_string()).collect(),
        );
        if let Err(e) = marker.store(self.layout) {
            let msg = format!("failed to update current marker: {}", e);
            warn!("{}", msg);
            report.warnings.push(msg);
        }

        Ok(report)
    }
}

fn rename(from: &Path, to: &Path) -> Result<(), String> {
    fs::rename(from, to)
        .map_err(|e| format!("failed to rename {} to {}: {}", from.display(), to.display(), e))
}
