//! Core data models for snaprotate
//!
//! Location descriptors, history entries and their timestamps, and the
//! retention policy that drives rotation.

pub mod history;
pub mod pathspec;
pub mod policy;
pub mod timestamp;

pub use history::{HistoryEntry, HistoryNameError};
pub use pathspec::{PathSpec, Protocol};
pub use policy::{LevelRule, RetentionPolicy};
pub use timestamp::{SnapshotTime, TimestampParseError};
