//! Single-file copies between the local machine and the remote host.

use crate::error::{Direction, Result, SiteError};
use crate::remote::{exec, Remote, RemotePath, UPLOAD_FILE_MODE};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;
use tracing::debug;

/// What happened to one directory component during [`create_remote_dirs`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DirOutcome {
    Created(RemotePath),
    AlreadyExisted(RemotePath),
}

impl DirOutcome {
    pub fn path(&self) -> &RemotePath {
        match self {
            DirOutcome::Created(path) | DirOutcome::AlreadyExisted(path) => path,
        }
    }
}

/// Successively longer absolute prefixes of `dir`, one per component.
fn dir_prefixes(dir: &RemotePath) -> Vec<RemotePath> {
    let mut current = String::new();
    dir.components()
        .map(|segment| {
            current.push('/');
            current.push_str(segment);
            RemotePath::new(current.clone())
        })
        .collect()
}

/// Create `dir` and every missing ancestor on the remote host.
///
/// Components that already exist are reported as such; any other `mkdir`
/// failure (permissions, a file in the way) is an error. Running this twice
/// on the same path succeeds both times.
pub fn create_remote_dirs<R: Remote + ?Sized>(
    remote: &R,
    dir: &RemotePath,
) -> Result<Vec<DirOutcome>> {
    let mut outcomes = Vec::new();

    for prefix in dir_prefixes(dir) {
        let quoted = prefix.quoted();
        // The trailing plain `mkdir` reproduces the real failure and exit code
        let command = format!(
            "if mkdir {0} 2>/dev/null; then echo created; elif [ -d {0} ]; then echo exists; else mkdir {0}; fi",
            quoted
        );
        let output = exec::run(remote, &command)?;

        let outcome = match output.trim() {
            "created" => DirOutcome::Created(prefix),
            "exists" => DirOutcome::AlreadyExisted(prefix),
            other => {
                return Err(SiteError::UnexpectedOutput {
                    command,
                    output: other.to_string(),
                })
            }
        };
        outcomes.push(outcome);
    }

    Ok(outcomes)
}

/// Copy a local file to `remote_path`, creating missing remote parent
/// directories first. The remote file gets mode 0644.
pub fn upload_file<R: Remote + ?Sized>(
    remote: &R,
    local_path: &Path,
    remote_path: &RemotePath,
) -> Result<u64> {
    let transfer_error = |message: String| SiteError::Transfer {
        local: local_path.to_path_buf(),
        remote: remote_path.to_string(),
        direction: Direction::Upload,
        message,
    };

    let file = File::open(local_path)
        .map_err(|e| transfer_error(format!("unable to open local file: {}", e)))?;
    let size = file
        .metadata()
        .map_err(|e| transfer_error(format!("unable to read local file metadata: {}", e)))?
        .len();

    if let Some(parent) = remote_path.parent() {
        create_remote_dirs(remote, &parent)?;
    }

    debug!(local = %local_path.display(), remote = %remote_path, size, "uploading file");
    let mut reader = BufReader::new(file);
    let written = remote
        .send(&mut reader, size, remote_path, UPLOAD_FILE_MODE)
        .map_err(|e| transfer_error(e.to_string()))?;

    Ok(written)
}

/// Copy `remote_path` to a local file, creating missing local parent
/// directories first. An existing local file is truncated.
pub fn download_file<R: Remote + ?Sized>(
    remote: &R,
    remote_path: &RemotePath,
    local_path: &Path,
) -> Result<u64> {
    if let Some(parent) = local_path.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| SiteError::local_fs("unable to create directories for", local_path, e))?;
    }
    let file = File::create(local_path)
        .map_err(|e| SiteError::local_fs("unable to create file", local_path, e))?;

    debug!(remote = %remote_path, local = %local_path.display(), "downloading file");
    let mut writer = BufWriter::new(file);
    let received = remote
        .receive(remote_path, &mut writer)
        .and_then(|n| writer.flush().map(|_| n))
        .map_err(|e| SiteError::Transfer {
            local: local_path.to_path_buf(),
            remote: remote_path.to_string(),
            direction: Direction::Download,
            message: e.to_string(),
        })?;

    Ok(received)
}
