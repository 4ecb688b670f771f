//! Unix-form paths on the web host.

use crate::error::{Result, SiteError};
use std::fmt;
use std::path::{Component, Path, PathBuf};

/// An absolute or relative path on the remote host, always `/`-separated
/// regardless of the local platform.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RemotePath(String);

impl RemotePath {
    pub fn new(path: impl Into<String>) -> Self {
        Self(path.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Append a `/`-separated relative path.
    pub fn join(&self, relative: &str) -> RemotePath {
        let base = self.0.trim_end_matches('/');
        let relative = relative.trim_start_matches('/');
        if relative.is_empty() {
            return self.clone();
        }
        if base.is_empty() && self.0.starts_with('/') {
            return RemotePath(format!("/{}", relative));
        }
        RemotePath(format!("{}/{}", base, relative))
    }

    /// Parent directory, or `None` for a bare name or the root.
    pub fn parent(&self) -> Option<RemotePath> {
        let trimmed = self.0.trim_end_matches('/');
        match trimmed.rfind('/') {
            Some(0) if trimmed.len() > 1 => Some(RemotePath("/".to_string())),
            Some(0) => None,
            Some(idx) => Some(RemotePath(trimmed[..idx].to_string())),
            None => None,
        }
    }

    /// Path of `self` relative to `root`, if `self` lies strictly under it.
    pub fn relative_to(&self, root: &RemotePath) -> Option<&str> {
        let root = root.0.trim_end_matches('/');
        self.0
            .strip_prefix(root)
            .and_then(|rest| rest.strip_prefix('/'))
            .filter(|rest| !rest.is_empty())
    }

    /// Directory components, skipping empty segments from leading or
    /// repeated separators.
    pub fn components(&self) -> impl Iterator<Item = &str> {
        self.0
            .split('/')
            .map(str::trim)
            .filter(|segment| !segment.is_empty())
    }

    /// Shell-quoted form for interpolation into a command line.
    pub fn quoted(&self) -> String {
        shell_quote(&self.0)
    }
}

impl fmt::Display for RemotePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RemotePath {
    fn from(path: &str) -> Self {
        RemotePath::new(path)
    }
}

/// Single-quote `value` for a POSIX shell.
pub fn shell_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', r"'\''"))
}

/// `/`-joined form of a local relative path, for use under a remote root.
pub fn to_remote_relative(relative: &Path) -> Result<String> {
    let mut parts = Vec::new();
    for component in relative.components() {
        match component {
            Component::Normal(part) => parts.push(part.to_string_lossy().into_owned()),
            Component::CurDir => {}
            _ => {
                return Err(SiteError::InvalidPath {
                    path: relative.display().to_string(),
                    reason: "expected a plain relative path".to_string(),
                })
            }
        }
    }
    Ok(parts.join("/"))
}

/// Local path for a `/`-separated remote relative path under `root`.
///
/// Rejects anything that could escape `root`.
pub fn to_local_path(root: &Path, relative: &str) -> Result<PathBuf> {
    let invalid = |reason: &str| SiteError::InvalidPath {
        path: relative.to_string(),
        reason: reason.to_string(),
    };

    if relative.is_empty() {
        return Err(invalid("empty path"));
    }
    if relative.starts_with('/') {
        return Err(invalid("absolute path not allowed"));
    }

    let mut path = root.to_path_buf();
    for segment in relative.split('/') {
        match segment {
            "" | "." => {}
            ".." => return Err(invalid("path traversal not allowed")),
            part => path.push(part),
        }
    }
    Ok(path)
}
