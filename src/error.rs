//! Custom error types for snaprotate
//!
//! Every condition that aborts a run has its own variant. Conditions a run
//! survives (sync tool exit codes, failed renames, failed removals, odd
//! history names) are not errors at all: they are logged and collected in
//! the stage and rotation reports.

use std::path::PathBuf;

use thiserror::Error;

/// The main error type for snaprotate operations
#[derive(Error, Debug)]
pub enum SnapError {
    /// A required source or target argument was not supplied
    #[error("Missing argument: {0}")]
    MissingArgument(&'static str),

    /// Some sources are local and others remote
    #[error("Sources mix local and remote locations: {local} is local, {remote} is remote")]
    MixedLocality { local: String, remote: String },

    /// Remote sources live on different hosts
    #[error("Remote sources must share one host: found '{first}' and '{second}'")]
    MixedHost { first: String, second: String },

    /// The target resolved to a remote location
    #[error("Remote targets are not supported: {0}")]
    UnsupportedRemoteTarget(String),

    /// An external tool is not on the execution path
    #[error("Required tool '{tool}' not found on PATH")]
    ToolNotFound { tool: String },

    /// An external tool exists but could not be started
    #[error("Failed to invoke '{tool}': {reason}")]
    ToolInvocation { tool: String, reason: String },

    /// The target root could not be created or is not a directory
    #[error("Cannot prepare target root {path}: {reason}")]
    TargetRoot { path: PathBuf, reason: String },

    /// Another run holds the lock on this target root
    #[error("Target root {0} is locked by another run")]
    LockContention(PathBuf),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// File I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(String),

    /// Validation errors for user supplied values
    #[error("Validation error: {0}")]
    Validation(String),
}

impl SnapError {
    /// Create a "tool not found" error
    pub fn tool_not_found(tool: impl Into<String>) -> Self {
        Self::ToolNotFound { tool: tool.into() }
    }

    /// Create a target root error from any displayable cause
    pub fn target_root(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Self::TargetRoot {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    /// Check if this error means another run owns the target
    pub fn is_lock_contention(&self) -> bool {
        matches!(self, Self::LockContention(_))
    }

    /// Check if this is a validation error
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}

impl From<std::io::Error> for SnapError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<serde_json::Error> for SnapError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err.to_string())
    }
}

/// Result type alias for snaprotate operations
pub type SnapResult<T> = Result<T, SnapError>;
