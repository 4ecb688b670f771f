//! sitesync - build a static site and publish it to a web host over SSH/SCP.
//!
//! Every upload first mirrors the live site into a local backup snapshot,
//! then replaces the remote site root file by file. `rollback` publishes
//! the snapshot back.

pub mod cli;
pub mod commands;
pub mod error;
pub mod generator;
pub mod remote;
pub mod site;
pub mod ssh;
pub mod sync;

pub use error::{ErrorKind, Result, SiteError};
pub use remote::{LocalRemote, Remote, RemotePath};
pub use site::SubSite;
