//! Remove tool command line
//!
//! Evicted snapshots are deleted by an external recursive remove, optionally
//! at lowered CPU priority through `nice`.

use std::path::Path;

use super::runner::Invocation;
use crate::config::ToolSettings;

const NICE_PROGRAM: &str = "nice";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoveCommand {
    pub program: String,
    pub niceness: Option<i8>,
}

impl RemoveCommand {
    pub fn new(program: impl Into<String>, niceness: Option<i8>) -> Self {
        Self {
            program: program.into(),
            niceness,
        }
    }

    pub fn from_settings(tools: &ToolSettings) -> Self {
        Self::new(tools.remove_program.clone(), tools.remove_niceness)
    }

    /// Programs that must be on PATH for removals to run
    pub fn required_programs(&self) -> Vec<&str> {
        match self.niceness {
            Some(_) => vec![NICE_PROGRAM, self.program.as_str()],
            None => vec![self.program.as_str()],
        }
    }

    pub fn invocation(&self, path: &Path) -> Invocation {
        let base = match self.niceness {
            Some(n) => Invocation::new(NICE_PROGRAM)
                .arg("-n")
                .arg(n.to_string())
                .arg(&self.program),
            None => Invocation::new(&self.program),
        };
        base.args(["-rf", "--"]).arg(path)
    }
}
