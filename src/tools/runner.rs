//! Typed subprocess invocation
//!
//! External programs are always run from an argument vector, never through a
//! shell. A tool that cannot be found or started is an error; a tool that
//! runs and exits non-zero is a [`ToolStatus`] the caller inspects.

use std::ffi::{OsStr, OsString};
use std::fmt;
use std::path::PathBuf;
use std::process::Command;

use tracing::debug;

use crate::error::{SnapError, SnapResult};

/// A program plus its arguments
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<OsString>,
}

impl Invocation {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_os_string());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.args
            .extend(args.into_iter().map(|a| a.as_ref().to_os_string()));
        self
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg.to_string_lossy())?;
        }
        Ok(())
    }
}

/// How a tool run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToolStatus {
    /// Exit code, `None` when killed by a signal
    pub code: Option<i32>,
}

impl ToolStatus {
    pub const SUCCESS: ToolStatus = ToolStatus { code: Some(0) };

    pub fn exited(code: i32) -> Self {
        Self { code: Some(code) }
    }

    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

impl fmt::Display for ToolStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.code {
            Some(code) => write!(f, "exit code {}", code),
            None => write!(f, "terminated by signal"),
        }
    }
}

/// Runs external tools
pub trait ToolRunner {
    /// Find a program on the execution path
    fn locate(&self, program: &str) -> SnapResult<PathBuf>;

    /// Run to completion; `Err` only when the program could not be started
    fn run(&self, invocation: &Invocation) -> SnapResult<ToolStatus>;
}

/// Runs tools as child processes sharing this process's stdio
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl ToolRunner for SystemRunner {
    fn locate(&self, program: &str) -> SnapResult<PathBuf> {
        which::which(program).map_err(|_| SnapError::tool_not_found(program))
    }

    fn run(&self, invocation: &Invocation) -> SnapResult<ToolStatus> {
        debug!(command = %invocation, "running external tool");
        let status = Command::new(&invocation.program)
            .args(&invocation.args)
            .status()
            .map_err(|e| SnapError::ToolInvocation {
                tool: invocation.program.clone(),
                reason: e.to_string(),
            })?;
        Ok(ToolStatus { code: status.code() })
    }
}
