//! External tools
//!
//! The sync tool and the remove tool are invoked, never reimplemented.

pub mod remove;
pub mod runner;
pub mod sync;

pub use remove::RemoveCommand;
pub use runner::{Invocation, SystemRunner, ToolRunner, ToolStatus};
pub use sync::SyncCommand;

#[cfg(test)]
pub(crate) mod fake;
