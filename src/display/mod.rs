//! Display formatting for terminal output
//!
//! Turns history indexes and run reports into the text the CLI prints.

pub mod history;

pub use history::{
    format_age, format_history_list, format_rotation_report, format_rule, format_stage_report,
    format_status, TargetStatus,
};
