//! snaprotate - hard-linked snapshot backups with rotating history
//!
//! A target directory holds the live snapshot `current`, a staging
//! directory `.tmp` while a backup is in flight, and history entries named
//! `hist.<timestamp>` (level 1) or `histN.<timestamp>` (level N). A backup
//! syncs the sources into `.tmp` with hard links against `current`, demotes
//! the old `current` to level 1 and promotes `.tmp`. Rotation then walks the
//! levels, evicting what the retention policy no longer keeps and promoting
//! one entry per level upward.
//!
//! # Architecture
//!
//! - `config`: settings file, tool names, target layout
//! - `error`: custom error types
//! - `models`: location specs, history entries, retention policy
//! - `storage`: atomic JSON files kept next to the snapshots
//! - `tools`: typed invocations of the sync and remove tools
//! - `services`: validation, locking, staging, rotation
//! - `cli` / `display`: command handlers and terminal output
//!
//! # Example
//!
//! ```rust,ignore
//! use snaprotate::config::ToolSettings;
//! use snaprotate::services::{BackupRequest, BackupService};
//! use snaprotate::tools::SystemRunner;
//!
//! let mut request = BackupRequest::new("/backups/home", "-7,4,3".parse()?);
//! request.sources = vec!["/home/me".into()];
//! let outcome = BackupService::new(&ToolSettings::default(), &SystemRunner).run(&request)?;
//! ```

pub mod cli;
pub mod config;
pub mod display;
pub mod error;
pub mod logging;
pub mod models;
pub mod services;
pub mod storage;
pub mod tools;

pub use error::{SnapError, SnapResult};
