//! Source and target validation
//!
//! Pure checks over resolved locations; nothing here touches the disk.

use crate::error::{SnapError, SnapResult};
use crate::models::PathSpec;

/// Sources must be all local, or all remote on a single host
pub fn validate_sources(sources: &[PathSpec]) -> SnapResult<()> {
    let local = sources.iter().find(|s| !s.is_remote());
    let remote = sources.iter().find(|s| s.is_remote());

    if let (Some(local), Some(remote)) = (local, remote) {
        return Err(SnapError::MixedLocality {
            local: local.raw().to_string(),
            remote: remote.raw().to_string(),
        });
    }

    let mut hosts = sources.iter().filter_map(|s| s.host());
    if let Some(first) = hosts.next() {
        if let Some(other) = hosts.find(|h| *h != first) {
            return Err(SnapError::MixedHost {
                first: first.to_string(),
                second: other.to_string(),
            });
        }
    }

    Ok(())
}

/// Only local targets are supported
pub fn validate_target(target: &PathSpec) -> SnapResult<()> {
    if target.is_remote() {
        return Err(SnapError::UnsupportedRemoteTarget(target.raw().to_string()));
    }
    Ok(())
}

/// Whether each source is nested under its own name in staging
///
/// More than one source always nests, otherwise same-named files from
/// different sources would overwrite each other.
pub fn resolve_nesting(source_count: usize, requested: Option<bool>) -> bool {
    source_count > 1 || requested.unwrap_or(false)
}
