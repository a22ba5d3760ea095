//! Configuration module for snaprotate
//!
//! This module provides:
//! - Settings file resolution (XDG-compliant)
//! - User settings persistence
//! - The on-disk layout of a target root

pub mod layout;
pub mod paths;
pub mod settings;

pub use layout::TargetLayout;
pub use paths::ConfigPaths;
pub use settings::{Settings, ToolSettings};
