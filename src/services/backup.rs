//! Backup run orchestration
//!
//! One invocation: resolve and validate locations, check the external tools,
//! take the target lock, stage, rotate, release the lock. Everything listed
//! as fatal aborts before the target is modified; everything else ends up as
//! a warning in the returned outcome.

use tracing::{info, warn};

use crate::config::{TargetLayout, ToolSettings};
use crate::error::{SnapError, SnapResult};
use crate::models::{PathSpec, RetentionPolicy};
use crate::services::lock::TargetLock;
use crate::services::rotator::{RotationReport, Rotator};
use crate::services::stager::{prepare_root, StageOptions, StageReport, Stager};
use crate::services::validator::{resolve_nesting, validate_sources, validate_target};
use crate::tools::{RemoveCommand, ToolRunner};

/// What the caller wants done
#[derive(Debug, Clone)]
pub struct BackupRequest {
    pub sources: Vec<String>,
    pub target: Option<String>,
    pub policy: RetentionPolicy,
    pub backup: bool,
    pub rotate: bool,
    /// `None` lets the source count decide
    pub extra_dir: Option<bool>,
    pub sync_options: Vec<String>,
    pub dry_run: bool,
}

impl BackupRequest {
    pub fn new(target: impl Into<String>, policy: RetentionPolicy) -> Self {
        Self {
            sources: Vec::new(),
            target: Some(target.into()),
            policy,
            backup: true,
            rotate: true,
            extra_dir: None,
            sync_options: Vec::new(),
            dry_run: false,
        }
    }
}

/// What a run did
#[derive(Debug, Clone)]
pub struct BackupOutcome {
    pub layout: TargetLayout,
    pub nested: bool,
    pub stage: Option<StageReport>,
    pub rotation: Option<RotationReport>,
}

impl BackupOutcome {
    pub fn warning_count(&self) -> usize {
        self.stage.as_ref().map_or(0, |s| s.warnings.len())
            + self.rotation.as_ref().map_or(0, |r| r.warnings.len())
    }
}

/// Service running backup and rotation against one target root
pub struct BackupService<'a, R: ToolRunner + ?Sized> {
    tools: &'a ToolSettings,
    runner: &'a R,
}

impl<'a, R: ToolRunner + ?Sized> BackupService<'a, R> {
    pub fn new(tools: &'a ToolSettings, runner: &'a R) -> Self {
        Self { tools, runner }
    }

    pub fn run(&self, request: &BackupRequest) -> SnapResult<BackupOutcome> {
        let target_raw = request
            .target
            .as_deref()
            .filter(|t| !t.is_empty())
            .ok_or(SnapError::MissingArgument("target"))?;
        if request.backup && request.sources.is_empty() {
            return Err(SnapError::MissingArgument("source"));
        }

        let target = PathSpec::resolve(target_raw)?;
        validate_target(&target)?;
        let root = target
            .abs_path()
            .ok_or_else(|| SnapError::UnsupportedRemoteTarget(target_raw.to_string()))?;
        let layout = TargetLayout::new(root);

        let sources = request
            .sources
            .iter()
            .map(|s| PathSpec::resolve(s))
            .collect::<SnapResult<Vec<_>>>()?;
        validate_sources(&sources)?;

        let nested = resolve_nesting(sources.len(), request.extra_dir);
        if request.extra_dir == Some(false) && nested {
            warn!(sources = sources.len(), "multiple sources are always nested under their names");
        }

        let remove = RemoveCommand::from_settings(self.tools);
        if request.backup {
            self.runner.locate(&self.tools.sync_program)?;
        }
        if request.rotate && !request.dry_run {
            for program in remove.required_programs() {
                self.runner.locate(program)?;
            }
        }

        if request.backup {
            prepare_root(&layout)?;
        } else if !layout.root().is_dir() {
            return Err(SnapError::target_root(layout.root(), "does not exist"));
        }

        // A planning-only run does not create `.lock` on a root that has none
        let lock = if request.dry_run && !request.backup {
            TargetLock::acquire_existing(&layout)?
        } else {
            Some(TargetLock::acquire(&layout)?)
        };
        if lock.is_some() {
            info!(target = %layout.root().display(), "target locked");
        }

        // The lock guard is dropped on every return below, error or not
        let stage = if request.backup {
            let options = StageOptions {
                nested,
                passthrough: request.sync_options.clone(),
            };
            Some(Stager::new(&layout, self.runner, &self.tools.sync_program).stage(&sources, &options)?)
        } else {
            None
        };

        let rotation = if request.rotate {
            Some(
                Rotator::new(&layout, self.runner, remove)
                    .dry_run(request.dry_run)
                    .rotate(&request.policy)?,
            )
        } else {
            None
        };

        if let Some(lock) = lock {
            lock.release();
        }

        Ok(BackupOutcome {
            layout,
            nested,
            stage,
            rotation,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{HistoryEntry, SnapshotTime};
    use crate::services::history::HistoryIndex;
    use crate::tools::fake::FakeRunner;
    use chrono::{Duration, Utc};
    use std::fs;
    use tempfile::TempDir;

    fn request(target: &std::path::Path, sources: &[&std::path::Path], policy: &str) -> BackupRequest {
        let mut req = BackupRequest::new(target.to_str().unwrap(), policy.parse().unwrap());
        req.sources = sources.iter().map(|s| s.to_str().unwrap().to_string()).collect();
        req
    }

    fn source(root: &std::path::Path, name: &str) -> std::path::PathBuf {
        let dir = root.join(name);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("file.txt"), name).unwrap();
        dir
    }

    #[test]
    fn test_empty_target_first_backup() {
        let temp_dir = TempDir::new().unwrap();
        let src = source(temp_dir.path(), "data");
        let target = temp_dir.path().join("target");
        let runner = FakeRunner::new();
        let tools = ToolSettings::default();

        let outcome = BackupService::new(&tools, &runner)
            .run(&request(&target, &[&src], "-7,4,3"))
            .unwrap();

        assert!(outcome.stage.as_ref().unwrap().promoted);
        assert_eq!(
            fs::read_to_string(outcome.layout.current().join("file.txt")).unwrap(),
            "data"
        );
        assert!(HistoryIndex::scan(&outcome.layout).unwrap().is_empty());
        assert_eq!(outcome.warning_count(), 0);
        assert!(!TargetLock::is_held(&outcome.layout).unwrap());
    }

    #[test]
    fn test_backup_then_rotate_promotes_oldest_daily() {
        let temp_dir = TempDir::new().unwrap();
        let src = source(temp_dir.path(), "data");
        let target = temp_dir.path().join("target");
        let layout = TargetLayout::new(&target);
        fs::create_dir_all(layout.current()).unwrap();
        let now = Utc::now();
        for day in 1..=7 {
            let entry = HistoryEntry::new(1, SnapshotTime::new(now - Duration::days(day)));
            fs::create_dir_all(layout.entry(&entry)).unwrap();
        }
        let runner = FakeRunner::new();
        let tools = ToolSettings::default();

        let outcome = BackupService::new(&tools, &runner)
            .run(&request(&target, &[&src], "7,4,3"))
            .unwrap();

        let rotation = outcome.rotation.unwrap();
        assert!(outcome.stage.unwrap().demoted.is_some());
        assert_eq!(rotation.promoted.len(), 1);
        assert!(rotation.evicted.is_empty());

        let index = HistoryIndex::scan(&layout).unwrap();
        assert_eq!(index.level(1).len(), 7);
        assert_eq!(index.level(2).len(), 1);
        assert_eq!(
            index.level(2)[0].timestamp,
            SnapshotTime::new(now - Duration::days(7))
        );
    }

    #[test]
    fn test_two_sources_force_nesting() {
        let temp_dir = TempDir::new().unwrap();
        let a = source(temp_dir.path(), "alpha");
        let b = source(temp_dir.path(), "beta");
        let target = temp_dir.path().join("target");
        let runner = FakeRunner::new();
        let tools = ToolSettings::default();

        let mut req = request(&target, &[&a, &b], "7");
        req.extra_dir = None;
        let outcome = BackupService::new(&tools, &runner).run(&req).unwrap();

        assert!(outcome.nested);
        assert!(outcome.layout.current().join("alpha/file.txt").exists());
        assert!(outcome.layout.current().join("beta/file.txt").exists());
    }

    #[test]
    fn test_missing_arguments() {
        let runner = FakeRunner::new();
        let tools = ToolSettings::default();
        let service = BackupService::new(&tools, &runner);

        let mut req = BackupRequest::new("/tmp/x", RetentionPolicy::default());
        req.target = None;
        assert!(matches!(
            service.run(&req),
            Err(SnapError::MissingArgument("target"))
        ));

        let req = BackupRequest::new("/tmp/x", RetentionPolicy::default());
        assert!(matches!(
            service.run(&req),
            Err(SnapError::MissingArgument("source"))
        ));
    }

    #[test]
    fn test_remote_target_rejected() {
        let runner = FakeRunner::new();
        let tools = ToolSettings::default();
        let mut req = BackupRequest::new("nas:/backups", RetentionPolicy::default());
        req.sources = vec!["/etc".into()];

        let err = BackupService::new(&tools, &runner).run(&req).unwrap_err();
        assert!(matches!(err, SnapError::UnsupportedRemoteTarget(_)));
        assert!(runner.calls.borrow().is_empty());
    }

    #[test]
    fn test_mixed_sources_rejected_before_touching_target() {
        let temp_dir = TempDir::new().unwrap();
        let target = temp_dir.path().join("target");
        let runner = FakeRunner::new();
        let tools = ToolSettings::default();
        let mut req = BackupRequest::new(target.to_str().unwrap(), RetentionPolicy::default());
        req.sources = vec!["/etc".into(), "db1:/etc".into()];

        let err = BackupService::new(&tools, &runner).run(&req).unwrap_err();
        assert!(matches!(err, SnapError::MixedLocality { .. }));
        assert!(!target.exists());
    }

    #[test]
    fn test_missing_sync_tool_is_fatal() {
        let temp_dir = TempDir::new().unwrap();
        let src = source(temp_dir.path(), "data");
        let target = temp_dir.path().join("target");
        let mut runner = FakeRunner::new();
        runner.missing.insert("rsync".into());
        let tools = ToolSettings::default();

        let err = BackupService::new(&tools, &runner)
            .run(&request(&target, &[&src], "7"))
            .unwrap_err();
        assert!(matches!(err, SnapError::ToolNotFound { .. }));
        assert!(!target.exists());
    }

    #[test]
    fn test_locked_target_fails_fast() {
        let temp_dir = TempDir::new().unwrap();
        let src = source(temp_dir.path(), "data");
        let target = temp_dir.path().join("target");
        fs::create_dir_all(&target).unwrap();
        let _held = TargetLock::acquire(&TargetLayout::new(&target)).unwrap();
        let runner = FakeRunner::new();
        let tools = ToolSettings::default();

        let err = BackupService::new(&tools, &runner)
            .run(&request(&target, &[&src], "7"))
            .unwrap_err();
        assert!(err.is_lock_contention());
        assert!(runner.sync_calls().is_empty());
    }

    #[test]
    fn test_rotate_only_needs_existing_root() {
        let temp_dir = TempDir::new().unwrap();
        let runner = FakeRunner::new();
        let tools = ToolSettings::default();
        let mut req = BackupRequest::new(
            temp_dir.path().join("absent").to_str().unwrap(),
            RetentionPolicy::default(),
        );
        req.backup = false;

        let err = BackupService::new(&tools, &runner).run(&req).unwrap_err();
        assert!(matches!(err, SnapError::TargetRoot { .. }));
    }

    #[test]
    fn test_lock_released_after_run() {
        let temp_dir = TempDir::new().unwrap();
        let target = temp_dir.path().join("target");
        fs::create_dir_all(&target).unwrap();
        let runner = FakeRunner::new();
        let tools = ToolSettings::default();
        let mut req = BackupRequest::new(target.to_str().unwrap(), RetentionPolicy::default());
        req.backup = false;

        BackupService::new(&tools, &runner).run(&req).unwrap();
        assert!(TargetLock::acquire(&TargetLayout::new(&target)).is_ok());
    }

    /// Finds every tool but cannot start any of them
    struct Unstartable;

    impl ToolRunner for Unstartable {
        fn locate(&self, program: &str) -> SnapResult<std::path::PathBuf> {
            Ok(std::path::PathBuf::from("/usr/bin").join(program))
        }

        fn run(&self, invocation: &crate::tools::Invocation) -> SnapResult<crate::tools::ToolStatus> {
            Err(SnapError::ToolInvocation {
                tool: invocation.program.clone(),
                reason: "permission denied".into(),
            })
        }
    }

    #[test]
    fn test_lock_released_when_staging_fails() {
        let temp_dir = TempDir::new().unwrap();
        let src = source(temp_dir.path(), "data");
        let target = temp_dir.path().join("target");
        let tools = ToolSettings::default();

        let err = BackupService::new(&tools, &Unstartable)
            .run(&request(&target, &[&src], "7"))
            .unwrap_err();

        assert!(matches!(err, SnapError::ToolInvocation { .. }));
        assert!(TargetLock::acquire(&TargetLayout::new(&target)).is_ok());
    }

    #[test]
    fn test_lock_released_when_rotation_fails() {
        let temp_dir = TempDir::new().unwrap();
        let target = temp_dir.path().join("target");
        let layout = TargetLayout::new(&target);
        let now = Utc::now();
        for day in 1..=3 {
            let entry = HistoryEntry::new(1, SnapshotTime::new(now - Duration::days(day)));
            fs::create_dir_all(layout.entry(&entry)).unwrap();
        }
        let tools = ToolSettings::default();
        let mut req = BackupRequest::new(target.to_str().unwrap(), "1".parse().unwrap());
        req.backup = false;

        let err = BackupService::new(&tools, &Unstartable).run(&req).unwrap_err();

        assert!(matches!(err, SnapError::ToolInvocation { .. }));
        assert!(TargetLock::acquire(&layout).is_ok());
    }

    #[test]
    fn test_dry_run_does_not_create_lock_file() {
        let temp_dir = TempDir::new().unwrap();
        let target = temp_dir.path().join("target");
        let layout = TargetLayout::new(&target);
        let entry = HistoryEntry::new(1, SnapshotTime::new(Utc::now() - Duration::days(30)));
        fs::create_dir_all(layout.entry(&entry)).unwrap();
        let runner = FakeRunner::new();
        let tools = ToolSettings::default();
        let mut req = BackupRequest::new(target.to_str().unwrap(), "-7".parse().unwrap());
        req.backup = false;
        req.dry_run = true;

        let outcome = BackupService::new(&tools, &runner).run(&req).unwrap();

        assert_eq!(outcome.rotation.unwrap().evicted, vec![entry]);
        assert!(!layout.lock_file().exists());
        assert!(layout.entry(&entry).exists());
        assert!(runner.calls.borrow().is_empty());
    }
}
