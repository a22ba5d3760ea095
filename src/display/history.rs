//! History display formatting
//!
//! Formats a target's history, its status, and run reports for terminal
//! output.

use crate::config::TargetLayout;
use crate::models::{LevelRule, RetentionPolicy, SnapshotTime};
use crate::services::{HistoryIndex, RotationReport, StageReport};
use crate::storage::CurrentMarker;

/// Format a duration as a short age like `3d` or `5h`
pub fn format_age(duration: chrono::Duration) -> String {
    let total_seconds = duration.num_seconds();
    if total_seconds < 0 {
        return "future".to_string();
    }

    if total_seconds < 60 {
        return format!("{}s", total_seconds);
    }

    let minutes = total_seconds / 60;
    if minutes < 60 {
        return format!("{}m", minutes);
    }

    let hours = minutes / 60;
    if hours < 24 {
        return format!("{}h", hours);
    }

    let days = hours / 24;
    if days < 30 {
        return format!("{}d", days);
    }

    let months = days / 30;
    format!("{}mo", months)
}

/// Describe a level rule in words
pub fn format_rule(rule: LevelRule) -> String {
    match rule {
        LevelRule::KeepCount(n) => format!("keep newest {}", n),
        LevelRule::MaxAgeDays(_) => match rule.max_age() {
            Some(age) => format!("keep younger than {}", format_age(age)),
            None => String::new(),
        },
    }
}

/// Format the history of a target, one block per level
pub fn format_history_list(
    index: &HistoryIndex,
    policy: &RetentionPolicy,
    now: SnapshotTime,
) -> String {
    if index.is_empty() && index.unreadable().is_empty() {
        return "No history entries found.".to_string();
    }

    let mut output = String::new();
    for level in index.levels() {
        let entries = index.level(level);
        let rule = match policy.rule(level) {
            Some(rule) => format_rule(rule),
            None => "beyond policy".to_string(),
        };
        output.push_str(&format!(
            "Level {} ({}, {} entries)\n",
            level,
            rule,
            entries.len()
        ));

        let name_width = entries
            .iter()
            .map(|e| e.file_name().len())
            .max()
            .unwrap_or(4)
            .max(4);

        for entry in entries {
            let marker = if entry.tagged { "  [next]" } else { "" };
            output.push_str(&format!(
                "  {:<name_width$}  {:>6}{}\n",
                entry.file_name(),
                format_age(entry.timestamp.age_at(now)),
                marker,
                name_width = name_width,
            ));
        }
        output.push('\n');
    }

    if !index.unreadable().is_empty() {
        output.push_str("Unreadable names (ignored)\n");
        for entry in index.unreadable() {
            output.push_str(&format!("  {}\n", entry.name));
        }
        output.push('\n');
    }

    output.push_str(&format!("Total: {} entries", index.len()));
    output
}

/// Snapshot of a target's state for `status`
#[derive(Debug, Clone)]
pub struct TargetStatus {
    pub has_current: bool,
    pub has_staging: bool,
    pub lock_held: bool,
    pub marker: Option<CurrentMarker>,
    pub history_count: usize,
}

/// Format target status as aligned key/value lines
pub fn format_status(layout: &TargetLayout, status: &TargetStatus, now: SnapshotTime) -> String {
    let yes_no = |b: bool| if b { "yes" } else { "no" };

    let mut output = String::new();
    output.push_str(&format!("Target:   {}\n", layout.root().display()));
    output.push_str(&format!("Current:  {}\n", yes_no(status.has_current)));
    if let Some(marker) = &status.marker {
        let age = SnapshotTime::new(marker.promoted_at).age_at(now);
        output.push_str(&format!(
            "Promoted: {} ({} ago)\n",
            marker.promoted_at.format("%Y-%m-%d %H:%M:%S UTC"),
            format_age(age)
        ));
        if !marker.sources.is_empty() {
            output.push_str(&format!("Sources:  {}\n", marker.sources.join(", ")));
        }
    }
    output.push_str(&format!(
        "Staging:  {}\n",
        if status.has_staging {
            "present (next run resumes it)"
        } else {
            "none"
        }
    ));
    output.push_str(&format!("Locked:   {}\n", yes_no(status.lock_held)));
    output.push_str(&format!("History:  {} entries", status.history_count));
    output
}

/// Summarize what staging did
pub fn format_stage_report(report: &StageReport) -> String {
    let mut lines = Vec::new();
    if report.resumed {
        lines.push("Resumed an interrupted staging directory".to_string());
    }
    if let Some(demoted) = &report.demoted {
        lines.push(format!("Previous backup kept as {}", demoted.file_name()));
    }
    if report.promoted {
        lines.push("New backup promoted to current".to_string());
    } else {
        lines.push("New backup not promoted; staging kept for the next run".to_string());
    }
    for warning in &report.warnings {
        lines.push(format!("warning: {}", warning));
    }
    lines.join("\n")
}

/// Summarize what rotation did or would do
///
/// Only actions that took effect are listed; failed ones show up as
/// warnings instead.
pub fn format_rotation_report(report: &RotationReport) -> String {
    let mut lines = Vec::new();
    let (promote_verb, evict_verb) = if report.dry_run {
        ("would promote", "would remove")
    } else {
        ("promoted", "removed")
    };

    for entry in &report.promoted {
        lines.push(format!(
            "{} {} to level {}",
            promote_verb,
            entry.file_name(),
            entry.level + 1
        ));
    }
    for entry in &report.evicted {
        lines.push(format!("{} {}", evict_verb, entry.file_name()));
    }
    if lines.is_empty() {
        lines.push("Nothing to rotate".to_string());
    }
    for warning in &report.warnings {
        lines.push(format!("warning: {}", warning));
    }
    lines.join("\n")
}
