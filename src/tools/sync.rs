//! Sync tool command line
//!
//! Builds the rsync-style invocation that fills the staging directory.

use std::path::{Path, PathBuf};

use super::runner::{Invocation, ToolStatus};
use crate::models::PathSpec;

/// rsync: "partial transfer due to vanished source files"
const EXIT_VANISHED: i32 = 24;

/// Copy behavior requested from the sync tool
///
/// Files already identical at the destination are skipped by the tool's
/// default quick check, so there is no flag for that.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncCommand {
    pub program: String,
    /// Preserve permissions, times, symlinks, ownership
    pub archive: bool,
    /// Delete destination files missing from the sources
    pub delete_extraneous: bool,
    /// Keep going past per-file errors
    pub ignore_errors: bool,
    /// Hard-link unchanged files against this directory
    pub link_dest: Option<PathBuf>,
    /// Options passed through untouched
    pub passthrough: Vec<String>,
}

impl SyncCommand {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            archive: true,
            delete_extraneous: true,
            ignore_errors: true,
            link_dest: None,
            passthrough: Vec::new(),
        }
    }

    pub fn link_dest(mut self, dir: Option<PathBuf>) -> Self {
        self.link_dest = dir;
        self
    }

    pub fn passthrough(mut self, options: impl IntoIterator<Item = String>) -> Self {
        self.passthrough.extend(options);
        self
    }

    /// Argument vector copying `sources` into `destination`
    pub fn invocation(&self, sources: &[PathSpec], nested: bool, destination: &Path) -> Invocation {
        let mut inv = Invocation::new(&self.program);
        if self.archive {
            inv = inv.arg("--archive");
        }
        if self.delete_extraneous {
            inv = inv.arg("--delete");
        }
        if self.ignore_errors {
            inv = inv.arg("--ignore-errors");
        }
        if let Some(dir) = &self.link_dest {
            let mut opt = std::ffi::OsString::from("--link-dest=");
            opt.push(dir.as_os_str());
            inv = inv.arg(opt);
        }
        inv = inv.args(&self.passthrough);
        inv = inv.args(sources.iter().map(|s| s.sync_arg(nested)));

        let mut dest = destination.as_os_str().to_os_string();
        if !destination.to_string_lossy().ends_with('/') {
            dest.push("/");
        }
        inv.arg(dest)
    }
}

/// Whether a failed sync still transferred what it could see
pub fn is_partial_transfer(status: &ToolStatus) -> bool {
    status.code == Some(EXIT_VANISHED)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::OsString;

    fn args(inv: &Invocation) -> Vec<String> {
        inv.args
            .iter()
            .map(|a: &OsString| a.to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn test_default_flags_single_source() {
        let src = PathSpec::resolve("/srv/data").unwrap();
        let cmd = SyncCommand::new("rsync");
        let inv = cmd.invocation(&[src], false, Path::new("/backups/.tmp"));

        assert_eq!(inv.program, "rsync");
        assert_eq!(
            args(&inv),
            vec![
                "--archive",
                "--delete",
                "--ignore-errors",
                "/srv/data/",
                "/backups/.tmp/"
            ]
        );
    }

    #[test]
    fn test_link_dest_and_passthrough() {
        let src = PathSpec::resolve("alice@db1:/var/lib").unwrap();
        let cmd = SyncCommand::new("rsync")
            .link_dest(Some(PathBuf::from("/backups/current")))
            .passthrough(vec!["--exclude=*.log".to_string()]);
        let inv = cmd.invocation(&[src], true, Path::new("/backups/.tmp"));

        assert_eq!(
            args(&inv),
            vec![
                "--archive",
                "--delete",
                "--ignore-errors",
                "--link-dest=/backups/current",
                "--exclude=*.log",
                "alice@db1:/var/lib",
                "/backups/.tmp/"
            ]
        );
    }

    #[test]
    fn test_nested_sources_keep_names() {
        let a = PathSpec::resolve("db1:/etc/").unwrap();
        let b = PathSpec::resolve("db1:/home/").unwrap();
        let inv = SyncCommand::new("rsync").invocation(&[a, b], true, Path::new("/t/.tmp"));
        let argv = args(&inv);

        assert!(argv.contains(&"db1:/etc".to_string()));
        assert!(argv.contains(&"db1:/home".to_string()));
    }

    #[test]
    fn test_partial_transfer() {
        assert!(is_partial_transfer(&ToolStatus::exited(24)));
        assert!(!is_partial_transfer(&ToolStatus::exited(23)));
    }
}
