//! Authenticated SSH connection to the web host.
//!
//! One [`SshConnection`] is opened per command. Each remote command gets its
//! own exec channel and each file copy its own SCP channel; both are closed
//! before the call returns. The session is disconnected when the connection
//! is dropped.

use crate::error::{Result, SiteError};
use crate::remote::{copy_exact, CommandOutput, Remote, RemotePath};
use crate::ssh::config::{HostVerification, SshConfig};
use ssh2::{Channel, CheckResult, KnownHostFileKind, Session};
use std::io::{self, Read, Write};
use std::net::TcpStream;
use std::path::Path;
use tracing::{debug, warn};

pub struct SshConnection {
    session: Session,
    address: String,
}

impl SshConnection {
    /// Dial, handshake, verify the host key, and authenticate with password.
    pub fn open(config: &SshConfig) -> Result<Self> {
        let address = config.address();
        let connection_error = |message: String| SiteError::Connection {
            address: address.clone(),
            message,
        };

        debug!(%address, user = %config.username, "connecting to web host");
        let tcp = TcpStream::connect((config.host.as_str(), config.port))
            .map_err(|e| connection_error(e.to_string()))?;

        let mut session = Session::new().map_err(|e| connection_error(e.to_string()))?;
        session.set_tcp_stream(tcp);
        session
            .handshake()
            .map_err(|e| connection_error(format!("SSH handshake failed: {}", e)))?;

        verify_host_key(&session, config, &address)?;

        session
            .userauth_password(&config.username, &config.password)
            .map_err(|e| SiteError::Auth {
                user: config.username.clone(),
                address: address.clone(),
                message: e.to_string(),
            })?;
        if !session.authenticated() {
            return Err(SiteError::Auth {
                user: config.username.clone(),
                address,
                message: "server rejected credentials".to_string(),
            });
        }

        Ok(Self { session, address })
    }
}

fn verify_host_key(session: &Session, config: &SshConfig, address: &str) -> Result<()> {
    let host_key_error = |message: String| SiteError::HostKey {
        address: address.to_string(),
        message,
    };

    let known_hosts_path = match &config.host_verification {
        HostVerification::Insecure => {
            warn!(%address, "host key verification disabled (insecure mode)");
            return Ok(());
        }
        HostVerification::KnownHosts(path) => path,
    };

    let mut known_hosts = session
        .known_hosts()
        .map_err(|e| host_key_error(e.to_string()))?;
    known_hosts
        .read_file(known_hosts_path, KnownHostFileKind::OpenSSH)
        .map_err(|e| {
            host_key_error(format!(
                "problem parsing ssh known_hosts file '{}': {}",
                known_hosts_path.display(),
                e
            ))
        })?;

    let (key, _) = session
        .host_key()
        .ok_or_else(|| host_key_error("server did not present a host key".to_string()))?;

    match known_hosts.check_port(&config.host, config.port, key) {
        CheckResult::Match => Ok(()),
        CheckResult::NotFound => Err(host_key_error(format!(
            "host not found in '{}'",
            known_hosts_path.display()
        ))),
        CheckResult::Mismatch => Err(host_key_error(
            "host key does not match known_hosts entry".to_string(),
        )),
        CheckResult::Failure => Err(host_key_error("host key check failed".to_string())),
    }
}

/// Signal EOF, close the channel, and wait for the remote end to close.
fn close_channel(channel: &mut Channel) -> std::result::Result<(), ssh2::Error> {
    channel.send_eof()?;
    channel.wait_eof()?;
    channel.close()?;
    channel.wait_close()
}

impl Remote for SshConnection {
    fn exec(&self, command: &str) -> Result<CommandOutput> {
        let session_error = |message: String| SiteError::Session {
            command: command.to_string(),
            message,
        };

        let mut channel = self
            .session
            .channel_session()
            .map_err(|e| session_error(format!("failed to create session: {}", e)))?;

        let result = (|| -> std::result::Result<CommandOutput, String> {
            channel.exec(command).map_err(|e| e.to_string())?;

            let mut stdout = Vec::new();
            channel.read_to_end(&mut stdout).map_err(|e| e.to_string())?;
            let mut stderr = Vec::new();
            channel
                .stderr()
                .read_to_end(&mut stderr)
                .map_err(|e| e.to_string())?;

            channel.wait_close().map_err(|e| e.to_string())?;
            let exit_status = channel.exit_status().map_err(|e| e.to_string())?;

            // File names are not guaranteed to be UTF-8
            Ok(CommandOutput {
                stdout: String::from_utf8_lossy(&stdout).into_owned(),
                stderr: String::from_utf8_lossy(&stderr).into_owned(),
                exit_status,
            })
        })();

        if result.is_err() {
            let _ = channel.close();
        }
        result.map_err(session_error)
    }

    fn send(
        &self,
        source: &mut dyn Read,
        size: u64,
        remote_path: &RemotePath,
        mode: i32,
    ) -> io::Result<u64> {
        let mut channel =
            self.session
                .scp_send(Path::new(remote_path.as_str()), mode, size, None)?;

        let copied = copy_exact(source, &mut channel, size);
        let closed = close_channel(&mut channel);

        let copied = copied?;
        closed?;
        Ok(copied)
    }

    fn receive(&self, remote_path: &RemotePath, dest: &mut dyn Write) -> io::Result<u64> {
        let (mut channel, stat) = self.session.scp_recv(Path::new(remote_path.as_str()))?;

        // A stream that ends before the announced size is a failed copy
        let copied = copy_exact(&mut channel, dest, stat.size());
        let closed = close_channel(&mut channel);

        let copied = copied?;
        closed?;
        Ok(copied)
    }
}

impl Drop for SshConnection {
    fn drop(&mut self) {
        debug!(address = %self.address, "disconnecting from web host");
        if let Err(e) = self.session.disconnect(None, "closing", None) {
            debug!(error = %e, "disconnect failed");
        }
    }
}

/// Open a connection, run `f` with it, and disconnect on every exit path.
pub fn with_connection<T>(
    config: &SshConfig,
    f: impl FnOnce(&SshConnection) -> Result<T>,
) -> Result<T> {
    let connection = SshConnection::open(config)?;
    let result = f(&connection);
    drop(connection);
    result
}
