//! Exclusive per-target lock
//!
//! A non-blocking `flock` on `<root>/.lock`. The kernel drops the lock when
//! the holding descriptor closes, so a crashed run never leaves a stale
//! lock behind. The file itself is left in place.

use std::fmt;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

use nix::errno::Errno;
use nix::fcntl::{Flock, FlockArg};
use tracing::{debug, warn};

use crate::config::TargetLayout;
use crate::error::{SnapError, SnapResult};

/// Held for the duration of a run; released on drop
pub struct TargetLock {
    path: PathBuf,
    lock: Flock<File>,
}

impl fmt::Debug for TargetLock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TargetLock")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

impl TargetLock {
    /// Take the lock or fail immediately with [`SnapError::LockContention`]
    pub fn acquire(layout: &TargetLayout) -> SnapResult<Self> {
        Self::open_and_lock(layout, true)
    }

    /// Like [`TargetLock::acquire`], but never creates the lock file
    ///
    /// With no lock file no run can hold the lock, so `None` is returned and
    /// the target is left untouched.
    pub fn acquire_existing(layout: &TargetLayout) -> SnapResult<Option<Self>> {
        if !layout.lock_file().exists() {
            return Ok(None);
        }
        Self::open_and_lock(layout, false).map(Some)
    }

    fn open_and_lock(layout: &TargetLayout, create: bool) -> SnapResult<Self> {
        let path = layout.lock_file();
        let file = OpenOptions::new()
            .create(create)
            .truncate(false)
            .read(true)
            .write(true)
            .open(&path)
            .map_err(|e| {
                SnapError::Io(format!("Failed to open lock file {}: {}", path.display(), e))
            })?;

        match Flock::lock(file, FlockArg::LockExclusiveNonblock) {
            Ok(lock) => {
                debug!(path = %path.display(), "lock acquired");
                Ok(Self { path, lock })
            }
            Err((_, errno)) if errno == Errno::EWOULDBLOCK => {
                Err(SnapError::LockContention(layout.root().to_path_buf()))
            }
            Err((_, errno)) => Err(SnapError::Io(format!(
                "Failed to lock {}: {}",
                path.display(),
                errno
            ))),
        }
    }

    /// Whether some run currently holds the lock, without waiting
    pub fn is_held(layout: &TargetLayout) -> SnapResult<bool> {
        if !layout.lock_file().exists() {
            return Ok(false);
        }
        match Self::acquire(layout) {
            Ok(lock) => {
                lock.release();
                Ok(false)
            }
            Err(e) if e.is_lock_contention() => Ok(true),
            Err(e) => Err(e),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Release explicitly; dropping the guard has the same effect
    pub fn release(self) {
        let path = self.path;
        match self.lock.unlock() {
            Ok(_) => debug!(path = %path.display(), "lock released"),
            // The descriptor closes with the returned guard, which unlocks anyway
            Err((_, errno)) => warn!(path = %path.display(), %errno, "explicit unlock failed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_acquire_creates_lock_file() {
        let temp_dir = TempDir::new().unwrap();
        let layout = TargetLayout::new(temp_dir.path());

        let lock = TargetLock::acquire(&layout).unwrap();
        assert!(layout.lock_file().exists());
        assert_eq!(lock.path(), layout.lock_file());
    }

    #[test]
    fn test_second_acquire_fails_fast() {
        let temp_dir = TempDir::new().unwrap();
        let layout = TargetLayout::new(temp_dir.path());

        let held = TargetLock::acquire(&layout).unwrap();
        let started = std::time::Instant::now();
        let second = TargetLock::acquire(&layout);

        assert!(matches!(second, Err(ref e) if e.is_lock_contention()));
        assert!(format!("{:?}", held).contains(".lock"));
        assert!(started.elapsed() < std::time::Duration::from_secs(1));
    }

    #[test]
    fn test_drop_releases() {
        let temp_dir = TempDir::new().unwrap();
        let layout = TargetLayout::new(temp_dir.path());

        {
            let _held = TargetLock::acquire(&layout).unwrap();
            assert!(TargetLock::is_held(&layout).unwrap());
        }
        assert!(!TargetLock::is_held(&layout).unwrap());
        assert!(TargetLock::acquire(&layout).is_ok());
    }

    #[test]
    fn test_acquire_existing_leaves_fresh_root_alone() {
        let temp_dir = TempDir::new().unwrap();
        let layout = TargetLayout::new(temp_dir.path());

        assert!(TargetLock::acquire_existing(&layout).unwrap().is_none());
        assert!(!layout.lock_file().exists());

        let held = TargetLock::acquire(&layout).unwrap();
        assert!(TargetLock::acquire_existing(&layout)
            .unwrap_err()
            .is_lock_contention());
        held.release();
        assert!(TargetLock::acquire_existing(&layout).unwrap().is_some());
    }

    #[test]
    fn test_explicit_release() {
        let temp_dir = TempDir::new().unwrap();
        let layout = TargetLayout::new(temp_dir.path());

        TargetLock::acquire(&layout).unwrap().release();
        assert!(TargetLock::acquire(&layout).is_ok());
    }

    #[test]
    fn test_probe_without_lock_file() {
        let temp_dir = TempDir::new().unwrap();
        let layout = TargetLayout::new(temp_dir.path());

        assert!(!TargetLock::is_held(&layout).unwrap());
        assert!(!layout.lock_file().exists());
    }
}
