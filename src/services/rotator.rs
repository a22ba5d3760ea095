//! Multi-level history rotation
//!
//! Levels are processed from 1 upward. For each level the entries that fall
//! outside its rule become candidates. At most one candidate is promoted to
//! the next level per run; every other candidate is evicted.
//!
//! Which candidate promotes is remembered across runs with a tag:
//!
//! - a tagged candidate is promoted;
//! - with no tag anywhere in the level, the oldest candidate is promoted;
//! - with a tag on an entry that is still kept, candidates are evicted.
//!
//! After a promotion the newest kept entry is tagged, so the next promotion
//! happens once that entry has aged out. A level with a count rule of `n`
//! therefore promotes about once every `n` backups. The highest level never
//! promotes and never tags.

use std::fmt;
use std::fs;

use chrono::Duration;
use tracing::{info, warn};

use crate::config::TargetLayout;
use crate::error::SnapResult;
use crate::models::{HistoryEntry, LevelRule, RetentionPolicy, SnapshotTime};
use crate::services::history::HistoryIndex;
use crate::tools::{RemoveCommand, ToolRunner, ToolStatus};

/// Decisions for one level
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LevelPlan {
    pub level: u32,
    pub rule: LevelRule,
    /// Moves to `level + 1`
    pub promote: Option<HistoryEntry>,
    /// Deleted, oldest first
    pub evict: Vec<HistoryEntry>,
    /// Kept entry to mark as the next promotion
    pub tag: Option<HistoryEntry>,
    /// Kept entries whose stale tag is cleared
    pub untag: Vec<HistoryEntry>,
    /// Left alone because their timestamp lies ahead of now
    pub future: Vec<HistoryEntry>,
}

/// Something rotation skipped or could not do
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RotationWarning {
    UnreadableName { level: u32, name: String },
    FutureDated { entry: HistoryEntry },
    BeyondPolicy { entry: HistoryEntry },
    RenameFailed { from: String, to: String, reason: String },
    RemoveFailed { entry: HistoryEntry, status: ToolStatus },
}

impl fmt::Display for RotationWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RotationWarning::UnreadableName { level, name } => {
                write!(f, "level {}: skipping '{}', timestamp unreadable", level, name)
            }
            RotationWarning::FutureDated { entry } => {
                write!(f, "level {}: skipping '{}', dated in the future", entry.level, entry)
            }
            RotationWarning::BeyondPolicy { entry } => {
                write!(f, "'{}' is above the highest configured level; left untouched", entry)
            }
            RotationWarning::RenameFailed { from, to, reason } => {
                write!(f, "failed to rename '{}' to '{}': {}", from, to, reason)
            }
            RotationWarning::RemoveFailed { entry, status } => {
                write!(f, "failed to remove '{}': {}", entry, status)
            }
        }
    }
}

/// Outcome of a rotation run
#[derive(Debug, Clone, Default)]
pub struct RotationReport {
    pub plans: Vec<LevelPlan>,
    pub promoted: Vec<HistoryEntry>,
    pub evicted: Vec<HistoryEntry>,
    pub warnings: Vec<RotationWarning>,
    pub dry_run: bool,
}

impl RotationReport {
    fn warn(&mut self, warning: RotationWarning) {
        warn!("{}", warning);
        self.warnings.push(warning);
    }
}

/// Decide the fate of one level's entries
///
/// `entries` must all belong to `level`; order does not matter.
pub fn plan_level(
    level: u32,
    rule: LevelRule,
    is_highest: bool,
    entries: &[HistoryEntry],
    now: SnapshotTime,
) -> LevelPlan {
    let mut sorted = entries.to_vec();
    sorted.sort_by(HistoryEntry::newest_first);

    let mut kept = Vec::new();
    let mut candidates = Vec::new();
    let mut future = Vec::new();

    match rule {
        LevelRule::KeepCount(n) => {
            let split = n.min(sorted.len());
            candidates = sorted.split_off(split);
            kept = sorted;
        }
        LevelRule::MaxAgeDays(_) => {
            let max_age = rule.max_age().unwrap_or_else(Duration::zero);
            for entry in sorted {
                let age = entry.timestamp.age_at(now);
                if age < Duration::zero() {
                    future.push(entry);
                } else if age > max_age {
                    candidates.push(entry);
                } else {
                    kept.push(entry);
                }
            }
        }
    }

    // Oldest first from here on
    candidates.reverse();

    let level_has_tag = kept.iter().chain(candidates.iter()).any(|e| e.tagged);
    let promote = if is_highest {
        None
    } else if let Some(tagged) = candidates.iter().find(|e| e.tagged) {
        Some(*tagged)
    } else if !level_has_tag {
        candidates.first().copied()
    } else {
        None
    };

    let evict: Vec<HistoryEntry> = candidates
        .iter()
        .filter(|e| Some(**e) != promote)
        .copied()
        .collect();

    let (tag, untag) = match (promote, kept.first()) {
        (Some(_), Some(newest)) => {
            let tag = (!newest.tagged).then_some(*newest);
            let untag = kept[1..].iter().filter(|e| e.tagged).copied().collect();
            (tag, untag)
        }
        _ => (None, Vec::new()),
    };

    LevelPlan {
        level,
        rule,
        promote,
        evict,
        tag,
        untag,
        future,
    }
}

/// Applies a retention policy to one target root
pub struct Rotator<'a, R: ToolRunner + ?Sized> {
    layout: &'a TargetLayout,
    runner: &'a R,
    remove: RemoveCommand,
    dry_run: bool,
}

impl<'a, R: ToolRunner + ?Sized> Rotator<'a, R> {
    pub fn new(layout: &'a TargetLayout, runner: &'a R, remove: RemoveCommand) -> Self {
        Self {
            layout,
            runner,
            remove,
            dry_run: false,
        }
    }

    /// Plan only; history entries are neither renamed nor removed
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn rotate(&self, policy: &RetentionPolicy) -> SnapResult<RotationReport> {
        self.rotate_at(policy, SnapshotTime::now())
    }

    /// Rotate every configured level, judging ages against `now`
    ///
    /// Failed renames and removals are collected as warnings. Errors are
    /// returned only when the target root cannot be read or the remove tool
    /// cannot be started.
    pub fn rotate_at(&self, policy: &RetentionPolicy, now: SnapshotTime) -> SnapResult<RotationReport> {
        let mut index = HistoryIndex::scan(self.layout)?;
        let mut report = RotationReport {
            dry_run: self.dry_run,
            ..RotationReport::default()
        };

        for unreadable in index.unreadable().to_vec() {
            report.warn(RotationWarning::UnreadableName {
                level: unreadable.level,
                name: unreadable.name,
            });
        }

        let highest = policy.highest_level();
        for (level, rule) in policy.levels() {
            let entries = index.take_level(level);
            let plan = plan_level(level, rule, level == highest, &entries, now);

            for entry in &plan.future {
                report.warn(RotationWarning::FutureDated { entry: *entry });
            }

            if let Some(promoted) = self.apply(&plan, &mut report)? {
                index.insert(promoted);
            }
            report.plans.push(plan);
        }

        let beyond: Vec<u32> = index.levels().filter(|l| *l > highest).collect();
        for level in beyond {
            for entry in index.level(level).to_vec() {
                report.warn(RotationWarning::BeyondPolicy { entry });
            }
        }

        info!(
            promoted = report.promoted.len(),
            evicted = report.evicted.len(),
            warnings = report.warnings.len(),
            dry_run = self.dry_run,
            "rotation finished"
        );
        Ok(report)
    }

    /// Execute one level's plan; returns the entry that landed one level up
    fn apply(&self, plan: &LevelPlan, report: &mut RotationReport) -> SnapResult<Option<HistoryEntry>> {
        let mut landed = None;

        if let Some(entry) = plan.promote {
            let target = entry.promoted();
            if self.rename(&entry, &target, report) {
                info!(from = %entry, to = %target, "promoted");
                report.promoted.push(entry);
                landed = Some(target);

                if let Some(newest) = plan.tag {
                    self.rename(&newest, &newest.tagged(), report);
                }
                for stale in &plan.untag {
                    self.rename(stale, &stale.untagged(), report);
                }
            }
        }

        for entry in &plan.evict {
            if self.dry_run {
                report.evicted.push(*entry);
                continue;
            }
            let status = self.runner.run(&self.remove.invocation(&self.layout.entry(entry)))?;
            if status.success() {
                info!(entry = %entry, "evicted");
                report.evicted.push(*entry);
            } else {
                report.warn(RotationWarning::RemoveFailed {
                    entry: *entry,
                    status,
                });
            }
        }

        Ok(landed)
    }

    fn rename(&self, from: &HistoryEntry, to: &HistoryEntry, report: &mut RotationReport) -> bool {
        if self.dry_run {
            return true;
        }
        match fs::rename(self.layout.entry(from), self.layout.entry(to)) {
            Ok(()) => true,
            Err(e) => {
                report.warn(RotationWarning::RenameFailed {
                    from: from.file_name(),
                    to: to.file_name(),
                    reason: e.to_string(),
                });
                false
            }
        }
    }
}
