//! Persisted metadata for snaprotate
//!
//! Snapshot contents are written by the sync tool; this layer only owns the
//! small JSON files around them.

pub mod file_io;
pub mod marker;

pub use file_io::{read_json, write_json_atomic};
pub use marker::CurrentMarker;
