use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Broad category of a failure, independent of the operation that hit it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Configuration,
    Connection,
    Execution,
    Transfer,
    LocalFilesystem,
    Usage,
    External,
}

#[derive(Error, Debug)]
pub enum SiteError {
    #[error("configuration error in {}: {message}", .path.display())]
    Config { path: PathBuf, message: String },

    #[error("failed to connect to web host {address}: {message}")]
    Connection { address: String, message: String },

    #[error("host key verification failed for {address}: {message}")]
    HostKey { address: String, message: String },

    #[error("authentication failed for user '{user}' on {address}: {message}")]
    Auth {
        user: String,
        address: String,
        message: String,
    },

    #[error("failed to run command '{command}': {message}")]
    Session { command: String, message: String },

    #[error("remote command '{command}' exited with status {status}{}", stderr_suffix(.stderr))]
    CommandFailed {
        command: String,
        status: i32,
        stderr: String,
    },

    #[error("unexpected output from remote command '{command}': {output:?}")]
    UnexpectedOutput { command: String, output: String },

    #[error("failed to copy '{}' {direction} '{remote}': {message}", .local.display())]
    Transfer {
        local: PathBuf,
        remote: String,
        direction: Direction,
        message: String,
    },

    #[error("{action} '{}': {source}", .path.display())]
    LocalFs {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid path '{path}': {reason}")]
    InvalidPath { path: String, reason: String },

    #[error("command '{command}' requires sub-domain. Unknown subdomain: '{subdomain}'. Try 'listsubdomains' to see list.")]
    UnknownSubdomain { command: String, subdomain: String },

    #[error("cannot run command '{command}': {message}")]
    External { command: String, message: String },

    #[error("{0} is not implemented yet")]
    NotImplemented(&'static str),
}

/// Which way bytes were moving when a transfer failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Upload,
    Download,
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Direction::Upload => write!(f, "to remote"),
            Direction::Download => write!(f, "from remote"),
        }
    }
}

fn stderr_suffix(stderr: &str) -> String {
    let trimmed = stderr.trim();
    if trimmed.is_empty() {
        String::new()
    } else {
        format!(": {}", trimmed)
    }
}

impl SiteError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            SiteError::Config { .. } => ErrorKind::Configuration,
            SiteError::Connection { .. } | SiteError::HostKey { .. } | SiteError::Auth { .. } => {
                ErrorKind::Connection
            }
            SiteError::Session { .. }
            | SiteError::CommandFailed { .. }
            | SiteError::UnexpectedOutput { .. } => ErrorKind::Execution,
            SiteError::Transfer { .. } => ErrorKind::Transfer,
            SiteError::LocalFs { .. } | SiteError::InvalidPath { .. } => {
                ErrorKind::LocalFilesystem
            }
            SiteError::UnknownSubdomain { .. } => ErrorKind::Usage,
            SiteError::External { .. } | SiteError::NotImplemented(_) => ErrorKind::External,
        }
    }

    pub(crate) fn config(path: &Path, message: impl Into<String>) -> Self {
        SiteError::Config {
            path: path.to_path_buf(),
            message: message.into(),
        }
    }

    pub(crate) fn local_fs(action: &'static str, path: &Path, source: io::Error) -> Self {
        SiteError::LocalFs {
            action,
            path: path.to_path_buf(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, SiteError>;
