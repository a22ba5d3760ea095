//! Backup and rotation CLI commands
//!
//! `run`, `backup` and `rotate` share one argument set and differ only in
//! which phases they ask the backup service for.

use clap::Args;
use tracing::info;

use crate::config::Settings;
use crate::display::{format_rotation_report, format_stage_report};
use crate::error::SnapResult;
use crate::models::RetentionPolicy;
use crate::services::{BackupOutcome, BackupRequest, BackupService};
use crate::tools::ToolRunner;

/// Which phases a command runs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phases {
    /// Stage, promote, then rotate
    Full,
    /// Stage and promote only
    BackupOnly,
    /// Rotate only
    RotateOnly,
}

/// Arguments for `run` and `backup`
#[derive(Args, Debug, Clone)]
pub struct BackupArgs {
    /// Source locations followed by the target directory
    #[arg(value_name = "SOURCES... TARGET")]
    pub locations: Vec<String>,

    #[command(flatten)]
    pub common: CommonArgs,
}

/// Arguments for `rotate`
#[derive(Args, Debug, Clone)]
pub struct RotateArgs {
    /// Target directory
    pub target: Option<String>,

    /// Show what would be promoted and removed without changing anything
    #[arg(long)]
    pub dry_run: bool,

    #[command(flatten)]
    pub common: CommonArgs,
}

/// Flags shared by every command that touches a target
#[derive(Args, Debug, Clone, Default)]
pub struct CommonArgs {
    /// Retention per level, comma separated; negative values are ages in days
    #[arg(short, long, value_name = "LIST", allow_hyphen_values = true)]
    pub policy: Option<String>,

    /// Nest each source under its own name in the snapshot
    #[arg(long, overrides_with = "no_extra_dir")]
    pub extra_dir: bool,

    /// Copy a single source's contents directly into the snapshot
    #[arg(long, overrides_with = "extra_dir")]
    pub no_extra_dir: bool,

    /// Extra option passed through to the sync tool (repeatable)
    #[arg(long = "sync-opt", value_name = "OPT", allow_hyphen_values = true)]
    pub sync_opts: Vec<String>,
}

impl CommonArgs {
    /// Flags win over the settings file
    pub fn extra_dir(&self, settings: &Settings) -> Option<bool> {
        if self.extra_dir {
            Some(true)
        } else if self.no_extra_dir {
            Some(false)
        } else if settings.extra_dir {
            Some(true)
        } else {
            None
        }
    }

    pub fn policy(&self, settings: &Settings) -> SnapResult<RetentionPolicy> {
        match &self.policy {
            Some(raw) => raw.parse(),
            None => Ok(settings.retention.clone()),
        }
    }
}

/// Build the service request for a command
pub fn build_request(
    phases: Phases,
    sources: Vec<String>,
    target: Option<String>,
    common: &CommonArgs,
    dry_run: bool,
    settings: &Settings,
) -> SnapResult<BackupRequest> {
    let mut sync_options = settings.sync_options.clone();
    sync_options.extend(common.sync_opts.iter().cloned());

    Ok(BackupRequest {
        sources,
        target,
        policy: common.policy(settings)?,
        backup: phases != Phases::RotateOnly,
        rotate: phases != Phases::BackupOnly,
        extra_dir: common.extra_dir(settings),
        sync_options,
        dry_run,
    })
}

/// Split `SOURCES... TARGET`; the last location is the target
pub fn split_locations(mut locations: Vec<String>) -> (Vec<String>, Option<String>) {
    let target = locations.pop();
    (locations, target)
}

/// Handle `run` or `backup`
pub fn handle_backup_command<R: ToolRunner + ?Sized>(
    settings: &Settings,
    runner: &R,
    phases: Phases,
    args: BackupArgs,
) -> SnapResult<()> {
    let (sources, target) = split_locations(args.locations);
    let request = build_request(phases, sources, target, &args.common, false, settings)?;
    let outcome = BackupService::new(&settings.tools, runner).run(&request)?;
    print_outcome(&outcome);
    Ok(())
}

/// Handle `rotate`
pub fn handle_rotate_command<R: ToolRunner + ?Sized>(
    settings: &Settings,
    runner: &R,
    args: RotateArgs,
) -> SnapResult<()> {
    let request = build_request(
        Phases::RotateOnly,
        Vec::new(),
        args.target,
        &args.common,
        args.dry_run,
        settings,
    )?;
    let outcome = BackupService::new(&settings.tools, runner).run(&request)?;
    print_outcome(&outcome);
    Ok(())
}

fn print_outcome(outcome: &BackupOutcome) {
    if let Some(stage) = &outcome.stage {
        println!("{}", format_stage_report(stage));
    }
    if let Some(rotation) = &outcome.rotation {
        println!("{}", format_rotation_report(rotation));
    }
    info!(
        target = %outcome.layout.root().display(),
        warnings = outcome.warning_count(),
        "run finished"
    );
}
