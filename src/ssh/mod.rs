//! SSH connection management for the web host.

pub mod config;
pub mod connection;

pub use config::{HostVerification, SshConfig, DEFAULT_CONFIG_FILE, INSECURE_MODE};
pub use connection::{with_connection, SshConnection};
