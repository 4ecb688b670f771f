//! Remote host primitives.
//!
//! Everything the synchronizer does to the web host goes through the
//! [`Remote`] trait: run one shell command line, or copy one file in either
//! direction. The SSH connection implements it for real hosts and
//! [`LocalRemote`] implements it against the local filesystem for testing.

pub mod exec;
pub mod local;
pub mod path;
pub mod probe;
pub mod transfer;

use crate::error::Result;
use std::io::{self, Read, Write};

pub use exec::{run, run_to_console};
pub use local::LocalRemote;
pub use path::{shell_quote, RemotePath};
pub use probe::{is_directory, is_file, list_files_recursive, parse_predicate};
pub use transfer::{create_remote_dirs, download_file, upload_file, DirOutcome};

/// Mode applied to every uploaded file (rw-r--r--)
pub const UPLOAD_FILE_MODE: i32 = 0o644;

/// Captured result of one remote command line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    pub exit_status: i32,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.exit_status == 0
    }
}

/// A host that accepts shell command lines and single-file copies.
///
/// Each call is self-contained: implementations open whatever session or
/// channel they need and release it before returning, on success or error.
pub trait Remote {
    /// Run `command` through the remote shell and capture its output.
    ///
    /// A non-zero exit status is not an error at this level; the caller
    /// decides what it means.
    fn exec(&self, command: &str) -> Result<CommandOutput>;

    /// Stream `size` bytes from `source` into `remote_path` with the given
    /// file mode. The parent directory must already exist.
    fn send(
        &self,
        source: &mut dyn Read,
        size: u64,
        remote_path: &RemotePath,
        mode: i32,
    ) -> io::Result<u64>;

    /// Stream the contents of `remote_path` into `dest`.
    fn receive(&self, remote_path: &RemotePath, dest: &mut dyn Write) -> io::Result<u64>;
}

/// Copy exactly `size` bytes from `source` to `dest`.
///
/// A source that ends early is an `UnexpectedEof` error, never a short
/// success. Bytes past `size` are not read.
pub(crate) fn copy_exact(
    source: &mut dyn Read,
    dest: &mut dyn Write,
    size: u64,
) -> io::Result<u64> {
    let copied = io::copy(&mut source.take(size), dest)?;
    if copied != size {
        return Err(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            format!("expected {} bytes, copied {}", size, copied),
        ));
    }
    Ok(copied)
}

impl<R: Remote + ?Sized> Remote for &R {
    fn exec(&self, command: &str) -> Result<CommandOutput> {
        (**self).exec(command)
    }

    fn send(
        &self,
        source: &mut dyn Read,
        size: u64,
        remote_path: &RemotePath,
        mode: i32,
    ) -> io::Result<u64> {
        (**self).send(source, size, remote_path, mode)
    }

    fn receive(&self, remote_path: &RemotePath, dest: &mut dyn Write) -> io::Result<u64> {
        (**self).receive(remote_path, dest)
    }
}
