//! Source and target location descriptors
//!
//! Location strings follow the sync tool's conventions:
//!
//! - `[USER@]HOST::MODULE[/PATH]`  module (daemon) remote
//! - `[USER@]HOST:PATH`            remote shell remote
//! - anything else                 local path
//!
//! Nothing is quoted or escaped here; arguments reach the sync tool as
//! separate argv entries.

use std::env;
use std::fmt;
use std::fs;
use std::path::{Component, Path, PathBuf};

use crate::error::{SnapError, SnapResult};

/// How a location is reached
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Protocol {
    Local,
    Ssh,
    Module,
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Protocol::Local => write!(f, "local"),
            Protocol::Ssh => write!(f, "ssh"),
            Protocol::Module => write!(f, "module"),
        }
    }
}

/// A parsed location string
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathSpec {
    raw: String,
    protocol: Protocol,
    host: Option<String>,
    user: Option<String>,
    module: Option<String>,
    path: String,
    abs_path: Option<PathBuf>,
}

impl PathSpec {
    /// Parse a location string, resolving local paths to absolute form
    pub fn resolve(raw: &str) -> SnapResult<Self> {
        if raw.is_empty() {
            return Err(SnapError::Validation("empty location".into()));
        }

        let trimmed = strip_trailing_slashes(raw);

        if let Some(spec) = parse_module(raw, trimmed) {
            return Ok(spec);
        }
        if let Some(spec) = parse_ssh(raw, trimmed) {
            return Ok(spec);
        }

        let abs_path = absolutize(Path::new(trimmed))?;
        Ok(Self {
            raw: raw.to_string(),
            protocol: Protocol::Local,
            host: None,
            user: None,
            module: None,
            path: trimmed.to_string(),
            abs_path: Some(abs_path),
        })
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn protocol(&self) -> Protocol {
        self.protocol
    }

    pub fn is_remote(&self) -> bool {
        self.protocol != Protocol::Local
    }

    pub fn host(&self) -> Option<&str> {
        self.host.as_deref()
    }

    pub fn user(&self) -> Option<&str> {
        self.user.as_deref()
    }

    pub fn module(&self) -> Option<&str> {
        self.module.as_deref()
    }

    /// Path part as written, trailing slashes removed
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Absolute path, only for local specs
    pub fn abs_path(&self) -> Option<&Path> {
        self.abs_path.as_deref()
    }

    /// The location as the sync tool should see it
    ///
    /// With `nested` the final component is kept so the tool creates a
    /// directory of that name; without it a trailing slash makes the tool
    /// copy only the contents.
    pub fn sync_arg(&self, nested: bool) -> String {
        let mut arg = match self.protocol {
            Protocol::Local => self
                .abs_path
                .as_ref()
                .map(|p| p.to_string_lossy().into_owned())
                .unwrap_or_else(|| self.path.clone()),
            Protocol::Ssh => format!("{}:{}", self.user_host(), self.path),
            Protocol::Module => {
                let module = self.module.as_deref().unwrap_or_default();
                if self.path.is_empty() {
                    format!("{}::{}", self.user_host(), module)
                } else {
                    format!("{}::{}/{}", self.user_host(), module, self.path)
                }
            }
        };
        if !nested && !arg.ends_with('/') {
            arg.push('/');
        }
        arg
    }

    /// Name a nested copy of this source ends up under
    pub fn base_name(&self) -> Option<String> {
        match self.protocol {
            Protocol::Local => self
                .abs_path
                .as_ref()
                .and_then(|p| p.file_name())
                .map(|n| n.to_string_lossy().into_owned()),
            _ => self
                .path
                .rsplit('/')
                .find(|s| !s.is_empty())
                .map(str::to_string)
                .or_else(|| self.module.clone()),
        }
    }

    fn user_host(&self) -> String {
        let host = self.host.as_deref().unwrap_or_default();
        match &self.user {
            Some(user) => format!("{}@{}", user, host),
            None => host.to_string(),
        }
    }
}

impl fmt::Display for PathSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

fn strip_trailing_slashes(s: &str) -> &str {
    let stripped = s.trim_end_matches('/');
    if stripped.is_empty() && s.starts_with('/') {
        "/"
    } else {
        stripped
    }
}

fn split_user(user_host: &str) -> (Option<String>, String) {
    match user_host.rsplit_once('@') {
        Some((user, host)) if !user.is_empty() => (Some(user.to_string()), host.to_string()),
        _ => (None, user_host.to_string()),
    }
}

fn is_host(candidate: &str) -> bool {
    !candidate.is_empty() && !candidate.contains('/') && !candidate.ends_with('@')
}

fn parse_module(raw: &str, s: &str) -> Option<PathSpec> {
    let (user_host, rest) = s.split_once("::")?;
    if !is_host(user_host) {
        return None;
    }
    let (module, path) = match rest.split_once('/') {
        Some((module, path)) => (module, path),
        None => (rest, ""),
    };
    if module.is_empty() {
        return None;
    }
    let (user, host) = split_user(user_host);
    Some(PathSpec {
        raw: raw.to_string(),
        protocol: Protocol::Module,
        host: Some(host),
        user,
        module: Some(module.to_string()),
        path: path.to_string(),
        abs_path: None,
    })
}

fn parse_ssh(raw: &str, s: &str) -> Option<PathSpec> {
    let (user_host, path) = s.split_once(':')?;
    if !is_host(user_host) {
        return None;
    }
    let (user, host) = split_user(user_host);
    Some(PathSpec {
        raw: raw.to_string(),
        protocol: Protocol::Ssh,
        host: Some(host),
        user,
        module: None,
        path: path.to_string(),
        abs_path: None,
    })
}

/// Canonical path when it exists, otherwise a lexically cleaned absolute path
fn absolutize(path: &Path) -> SnapResult<PathBuf> {
    if let Ok(canonical) = fs::canonicalize(path) {
        return Ok(canonical);
    }

    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        env::current_dir()
            .map_err(|e| SnapError::Io(format!("Failed to read working directory: {}", e)))?
            .join(path)
    };

    let mut clean = PathBuf::new();
    for component in joined.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                clean.pop();
            }
            other => clean.push(other.as_os_str()),
        }
    }
    Ok(clean)
}
