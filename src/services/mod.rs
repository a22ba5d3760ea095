//! Service layer for snaprotate
//!
//! The services operate on one target root: validating what a run is asked
//! to do, guarding the root with a lock, staging the new backup, and rotating
//! the history levels.

pub mod backup;
pub mod history;
pub mod lock;
pub mod rotator;
pub mod stager;
pub mod validator;

pub use backup::{BackupOutcome, BackupRequest, BackupService};
pub use history::{HistoryIndex, UnreadableEntry};
pub use lock::TargetLock;
pub use rotator::{plan_level, LevelPlan, RotationReport, RotationWarning, Rotator};
pub use stager::{prepare_root, StageOptions, StageReport, Stager};
pub use validator::{resolve_nesting, validate_sources, validate_target};
