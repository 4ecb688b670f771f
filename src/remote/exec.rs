//! Remote command execution.

use crate::error::{Result, SiteError};
use crate::remote::Remote;
use tracing::debug;

/// Run `command` on the remote host and return its standard output.
///
/// A non-zero exit status becomes [`SiteError::CommandFailed`] carrying the
/// status and stderr; failing to run the command at all is reported by the
/// [`Remote`] implementation as [`SiteError::Session`].
pub fn run<R: Remote + ?Sized>(remote: &R, command: &str) -> Result<String> {
    debug!(command, "running remote command");
    let output = remote.exec(command)?;

    if !output.success() {
        return Err(SiteError::CommandFailed {
            command: command.to_string(),
            status: output.exit_status,
            stderr: output.stderr,
        });
    }

    Ok(output.stdout)
}

/// Run `command` and print its standard output to the console.
pub fn run_to_console<R: Remote + ?Sized>(remote: &R, command: &str) -> Result<()> {
    let stdout = run(remote, command)?;
    println!("{}", stdout);
    Ok(())
}
