//! Loopback remote - runs "remote" commands with the local shell.
//!
//! Remote paths are plain local paths. Used by tests and for exercising the
//! synchronizer against a scratch directory without an SSH server.

use crate::error::{Result, SiteError};
use crate::remote::{copy_exact, CommandOutput, Remote, RemotePath};
use std::fs::File;
use std::io::{self, Read, Write};
use std::path::Path;
use std::process::Command;

/// [`Remote`] implementation backed by `sh -c` and local file I/O.
#[derive(Debug, Clone)]
pub struct LocalRemote {
    shell: String,
}

impl LocalRemote {
    pub fn new() -> Self {
        Self {
            shell: "sh".to_string(),
        }
    }
}

impl Default for LocalRemote {
    fn default() -> Self {
        Self::new()
    }
}

impl Remote for LocalRemote {
    fn exec(&self, command: &str) -> Result<CommandOutput> {
        let output = Command::new(&self.shell)
            .arg("-c")
            .arg(command)
            .output()
            .map_err(|e| SiteError::Session {
                command: command.to_string(),
                message: e.to_string(),
            })?;

        Ok(CommandOutput {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            // Killed by a signal
            exit_status: output.status.code().unwrap_or(-1),
        })
    }

    fn send(
        &self,
        source: &mut dyn Read,
        size: u64,
        remote_path: &RemotePath,
        mode: i32,
    ) -> io::Result<u64> {
        let path = Path::new(remote_path.as_str());
        let mut file = File::create(path)?;
        let written = copy_exact(source, &mut file, size)?;
        file.flush()?;
        set_mode(path, mode)?;
        Ok(written)
    }

    fn receive(&self, remote_path: &RemotePath, dest: &mut dyn Write) -> io::Result<u64> {
        let mut file = File::open(remote_path.as_str())?;
        io::copy(&mut file, dest)
    }
}

#[cfg(unix)]
fn set_mode(path: &Path, mode: i32) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(mode as u32))
}

#[cfg(not(unix))]
fn set_mode(_path: &Path, _mode: i32) -> io::Result<()> {
    Ok(())
}
