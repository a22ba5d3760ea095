//! In-process stand-in for the external tools, for tests
//!
//! Sync invocations mirror the source directories into the destination
//! (honoring the trailing-slash nesting convention); remove invocations
//! delete their final argument.

use std::cell::RefCell;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use super::runner::{Invocation, ToolRunner, ToolStatus};
use crate::error::{SnapError, SnapResult};

#[derive(Default)]
pub struct FakeRunner {
    pub calls: RefCell<Vec<Invocation>>,
    pub missing: HashSet<String>,
    /// Exit code reported by sync runs after copying
    pub sync_exit: i32,
    /// Sync runs copy nothing at all
    pub sync_noop: bool,
    /// Exit code reported by remove runs; non-zero skips the deletion
    pub remove_exit: i32,
}

impl FakeRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sync_calls(&self) -> Vec<Invocation> {
        self.calls
            .borrow()
            .iter()
            .filter(|c| c.program == "rsync")
            .cloned()
            .collect()
    }

    pub fn remove_calls(&self) -> Vec<Invocation> {
        self.calls
            .borrow()
            .iter()
            .filter(|c| c.program != "rsync")
            .cloned()
            .collect()
    }

    fn sync(&self, invocation: &Invocation) -> SnapResult<()> {
        let positional: Vec<String> = invocation
            .args
            .iter()
            .map(|a| a.to_string_lossy().into_owned())
            .filter(|a| !a.starts_with("--"))
            .collect();
        let Some((dest, sources)) = positional.split_last() else {
            return Ok(());
        };
        let dest = PathBuf::from(dest.trim_end_matches('/'));

        if dest.exists() {
            fs::remove_dir_all(&dest)?;
        }
        fs::create_dir_all(&dest)?;

        for source in sources {
            let src = PathBuf::from(source.trim_end_matches('/'));
            if source.ends_with('/') {
                copy_tree(&src, &dest)?;
            } else if let Some(name) = src.file_name() {
                copy_tree(&src, &dest.join(name))?;
            }
        }
        Ok(())
    }
}

impl ToolRunner for FakeRunner {
    fn locate(&self, program: &str) -> SnapResult<PathBuf> {
        if self.missing.contains(program) {
            return Err(SnapError::tool_not_found(program));
        }
        Ok(PathBuf::from("/usr/bin").join(program))
    }

    fn run(&self, invocation: &Invocation) -> SnapResult<ToolStatus> {
        self.calls.borrow_mut().push(invocation.clone());

        if invocation.program == "rsync" {
            if !self.sync_noop {
                self.sync(invocation)?;
            }
            return Ok(ToolStatus::exited(self.sync_exit));
        }

        if self.remove_exit == 0 {
            if let Some(path) = invocation.args.last() {
                let path = Path::new(path);
                if path.is_dir() {
                    fs::remove_dir_all(path)?;
                } else if path.exists() {
                    fs::remove_file(path)?;
                }
            }
        }
        Ok(ToolStatus::exited(self.remove_exit))
    }
}

pub fn copy_tree(src: &Path, dest: &Path) -> std::io::Result<()> {
    fs::create_dir_all(dest)?;
    for entry in fs::read_dir(src)? {
        let entry = entry?;
        let target = dest.join(entry.file_name());
        if entry.file_type()?.is_dir() {
            copy_tree(&entry.path(), &target)?;
        } else {
            fs::copy(entry.path(), target)?;
        }
    }
    Ok(())
}
