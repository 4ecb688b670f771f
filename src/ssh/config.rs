//! Web host credentials file.
//!
//! `ssh.config` is a plain four-line file that must never be committed:
//!
//! ```text
//! alice                    # username
//! hunter2                  # password
//! server.com:22            # host:port
//! ~/.ssh/known_hosts       # known_hosts file, or `insecure`
//! ```

use crate::error::{Result, SiteError};
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

/// Default location of the credentials file, relative to the working dir
pub const DEFAULT_CONFIG_FILE: &str = "ssh.config";

/// Fourth-line token that disables host key verification
pub const INSECURE_MODE: &str = "insecure";

const FORMAT_HELP: &str = "ssh config (username, password) must be provided in this file.
ssh.config format:
- 1st line: username to auth into web host ssh
- 2nd line: password to auth into web host ssh
- 3rd line: tcp address in the format '[address]:[port]' (ex. 'server.com:22')
- 4th line: location of ssh known_hosts file OR 'insecure' if host key should not be validated (INSECURE)";

/// How the web host's identity is checked during the handshake.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostVerification {
    /// Require the host key to match an entry in this known_hosts file
    KnownHosts(PathBuf),
    /// Accept any host key
    Insecure,
}

/// Connection settings for the web host.
#[derive(Clone, PartialEq, Eq)]
pub struct SshConfig {
    pub username: String,
    pub password: String,
    pub host: String,
    pub port: u16,
    pub host_verification: HostVerification,
}

impl fmt::Debug for SshConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SshConfig")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("host_verification", &self.host_verification)
            .finish()
    }
}

impl SshConfig {
    /// Read and parse the credentials file at `path`.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => SiteError::config(path, format!("file not found. {}", FORMAT_HELP)),
            _ => SiteError::config(path, format!("unable to read file: {}", e)),
        })?;
        Self::parse(path, &content)
    }

    /// Parse credentials file content. `path` is only used in errors.
    pub fn parse(path: &Path, content: &str) -> Result<Self> {
        let mut lines = content.lines();
        let mut next_line = |message: &str| {
            lines
                .next()
                .ok_or_else(|| SiteError::config(path, message.to_string()))
        };

        let username = next_line("1st line of ssh.config must contain ssh username")?;
        let password = next_line("2nd line of ssh.config must contain ssh password")?;
        let address = next_line(
            "3rd line of ssh.config must contain tcp address in the format '[address]:[port]' (ex: 'server.com:22')",
        )?;
        let verification = next_line(
            "4th line of ssh.config must either be file location of ssh known_hosts file OR 'insecure' if INSECURE mode should be used (no host key validation)",
        )?;

        let (host, port) = parse_address(address.trim()).map_err(|reason| {
            SiteError::config(path, format!("invalid tcp address '{}': {}", address, reason))
        })?;

        let verification = verification.trim();
        let host_verification = if verification == INSECURE_MODE {
            HostVerification::Insecure
        } else if verification.is_empty() {
            return Err(SiteError::config(
                path,
                "4th line of ssh.config is empty; expected a known_hosts path or 'insecure'",
            ));
        } else {
            HostVerification::KnownHosts(expand_tilde(Path::new(verification)))
        };

        Ok(Self {
            username: username.to_string(),
            password: password.to_string(),
            host,
            port,
            host_verification,
        })
    }

    /// `host:port` form used for dialing and in messages.
    pub fn address(&self) -> String {
        if self.host.contains(':') {
            format!("[{}]:{}", self.host, self.port)
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }
}

/// Split `host:port`, accepting `[v6addr]:port`.
fn parse_address(address: &str) -> std::result::Result<(String, u16), String> {
    let (host, port) = address
        .rsplit_once(':')
        .ok_or_else(|| "missing ':port'".to_string())?;

    let host = host
        .strip_prefix('[')
        .and_then(|h| h.strip_suffix(']'))
        .unwrap_or(host);
    if host.is_empty() {
        return Err("missing host".to_string());
    }

    let port = port
        .parse::<u16>()
        .map_err(|_| format!("invalid port '{}'", port))?;

    Ok((host.to_string(), port))
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
    let path_str = path.to_string_lossy();

    if path_str == "~" {
        dirs::home_dir().unwrap_or_else(|| path.to_path_buf())
    } else if let Some(rest) = path_str.strip_prefix("~/") {
        match dirs::home_dir() {
            Some(home) => home.join(rest),
            None => path.to_path_buf(),
        }
    } else {
        path.to_path_buf()
    }
}
