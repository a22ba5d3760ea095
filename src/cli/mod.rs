//! CLI command handlers
//!
//! This module contains the implementation of CLI commands,
//! bridging the clap argument parsing with the service layer.

pub mod inspect;
pub mod run;

pub use inspect::{handle_config_command, handle_list_command, handle_status_command};
pub use run::{handle_backup_command, handle_rotate_command, BackupArgs, CommonArgs, Phases, RotateArgs};
