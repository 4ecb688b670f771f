//! Command-level orchestration.
//!
//! ```text
//! deploy:   build -> connect -> backup remote -> publish build output
//! upload:            connect -> backup remote -> publish build output
//! rollback:          connect ->                  publish backup snapshot
//! ```
//!
//! Any error ends the command immediately; nothing is retried or resumed.

use crate::cli::Command;
use crate::error::{Result, SiteError};
use crate::generator::{wait_for_server, Browser, SiteGenerator, DEFAULT_PREVIEW_URL};
use crate::remote::{Remote, RemotePath};
use crate::site::{self, SubSite};
use crate::ssh::{with_connection, SshConfig, DEFAULT_CONFIG_FILE};
use crate::sync::{backup_remote_site, publish_site, SyncOptions, SyncStats};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::{error, info};

/// Generator output directory
pub const DEFAULT_BUILD_DIR: &str = "public";

/// Local backup snapshot of the remote site
pub const DEFAULT_BACKUP_DIR: &str = "bin/website-old";

/// Local paths and collaborators a command works with.
#[derive(Debug, Clone)]
pub struct Workspace {
    pub build_dir: PathBuf,
    pub backup_dir: PathBuf,
    pub ssh_config: PathBuf,
    pub generator: SiteGenerator,
    pub browser: Browser,
    pub preview_url: String,
    pub sync: SyncOptions,
}

impl Default for Workspace {
    fn default() -> Self {
        Self {
            build_dir: PathBuf::from(DEFAULT_BUILD_DIR),
            backup_dir: PathBuf::from(DEFAULT_BACKUP_DIR),
            ssh_config: PathBuf::from(DEFAULT_CONFIG_FILE),
            generator: SiteGenerator::default(),
            browser: Browser::default(),
            preview_url: DEFAULT_PREVIEW_URL.to_string(),
            sync: SyncOptions::default(),
        }
    }
}

/// What an upload moved in each direction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UploadReport {
    pub backed_up: SyncStats,
    pub published: SyncStats,
}

/// Look up the sub-site a command targets. Fails before any work is done
/// when `subdomain` is missing or not in the registry.
pub fn require_site(command: Command, subdomain: Option<&str>) -> Result<&'static SubSite> {
    let id = subdomain.unwrap_or_default();
    site::lookup(id).ok_or_else(|| unknown_subdomain(command, id))
}

fn unknown_subdomain(command: Command, id: &str) -> SiteError {
    SiteError::UnknownSubdomain {
        command: command.name().to_string(),
        subdomain: id.to_string(),
    }
}

/// Validate arguments and run one command.
pub fn execute(command: Command, subdomain: Option<&str>, ws: &Workspace) -> Result<()> {
    let site = if command.requires_subdomain() {
        Some(require_site(command, subdomain)?)
    } else {
        None
    };

    match (command, site) {
        (Command::Build, Some(_)) => build(ws),
        (Command::Deploy, Some(site)) => deploy(ws, site).map(drop),
        (Command::Upload, Some(site)) => upload(ws, site).map(drop),
        (Command::Rollback, Some(site)) => rollback(ws, site).map(drop),
        (Command::Build | Command::Deploy | Command::Upload | Command::Rollback, None) => {
            Err(unknown_subdomain(command, subdomain.unwrap_or_default()))
        }
        (Command::Preview, _) => preview(ws),
        (Command::Rotatecert, _) => rotate_cert(),
        (Command::Listcerts, _) => list_certs(&mut io::stdout().lock()),
        (Command::Listsubdomains, _) => list_subdomains(&mut io::stdout().lock()),
    }
}

/// Build the site into the build directory.
pub fn build(ws: &Workspace) -> Result<()> {
    ws.generator.build(&ws.build_dir)
}

/// Build, then upload only if the build succeeded.
pub fn deploy(ws: &Workspace, site: &SubSite) -> Result<UploadReport> {
    build(ws)?;
    upload(ws, site)
}

/// Back up the remote site, then publish the build output over it.
pub fn upload(ws: &Workspace, site: &SubSite) -> Result<UploadReport> {
    info!("Connecting to web host");
    let config = SshConfig::load(&ws.ssh_config)?;
    let site_root = site.site_root(&config.username);

    with_connection(&config, |connection| {
        upload_to(connection, &site_root, ws)
    })
}

/// Upload over an already open connection.
pub fn upload_to<R: Remote + ?Sized>(
    remote: &R,
    site_root: &RemotePath,
    ws: &Workspace,
) -> Result<UploadReport> {
    info!(
        "Copying old website from web host to {} in case there are any issues",
        ws.backup_dir.display()
    );
    let backed_up = backup_remote_site(remote, site_root, &ws.backup_dir, ws.sync)?;

    let published = publish_site(remote, site_root, &ws.build_dir, ws.sync)?;
    info!(
        files = published.files,
        bytes = published.bytes,
        "Published website to {}",
        site_root
    );

    Ok(UploadReport {
        backed_up,
        published,
    })
}

/// Publish the backup snapshot taken by the last upload.
pub fn rollback(ws: &Workspace, site: &SubSite) -> Result<SyncStats> {
    info!(
        "Beginning rollback of old website in {}",
        ws.backup_dir.display()
    );
    info!("Connecting to web host");
    let config = SshConfig::load(&ws.ssh_config)?;
    let site_root = site.site_root(&config.username);

    with_connection(&config, |connection| {
        rollback_to(connection, &site_root, ws)
    })
}

/// Rollback over an already open connection. No new backup is taken.
pub fn rollback_to<R: Remote + ?Sized>(
    remote: &R,
    site_root: &RemotePath,
    ws: &Workspace,
) -> Result<SyncStats> {
    let published = publish_site(remote, site_root, &ws.backup_dir, ws.sync)?;
    info!(
        files = published.files,
        bytes = published.bytes,
        "Restored website at {}",
        site_root
    );
    Ok(published)
}

/// Run the generator's preview server and point the browser at it.
///
/// A browser failure is reported but the server keeps running.
pub fn preview(ws: &Workspace) -> Result<()> {
    info!("Starting local preview server...");
    let server = ws.generator.serve()?;

    if let Err(e) = ws.browser.open(&ws.preview_url) {
        error!("{}", e);
    }

    wait_for_server(server, ws.generator.program())
}

pub fn rotate_cert() -> Result<()> {
    info!("Command not yet implemented. Sorry!");
    Err(SiteError::NotImplemented("rotatecert"))
}

pub fn list_subdomains(out: &mut impl Write) -> Result<()> {
    write_listing(out, |out| {
        writeln!(out, "Supported sub-domains:")?;
        writeln!(out)?;
        writeln!(
            out,
            "   Each value to pass into 'subdomain' arg and corresponding dir to store files on server."
        )?;
        writeln!(out)?;
        for site in site::all() {
            writeln!(
                out,
                "  {:<15} -> files go into {} directory on server.",
                site.id, site.domain
            )?;
        }
        Ok(())
    })
}

pub fn list_certs(out: &mut impl Write) -> Result<()> {
    write_listing(out, |out| {
        writeln!(
            out,
            "Here are the sub-domains for which we can rotate the SSL certificate:"
        )?;
        writeln!(out)?;
        for site in site::cert_eligible() {
            writeln!(out, "  {:<15} -> {}", site.id, site.domain)?;
        }
        Ok(())
    })
}

fn write_listing<W: Write>(out: &mut W, f: impl FnOnce(&mut W) -> io::Result<()>) -> Result<()> {
    f(out).map_err(|e| SiteError::local_fs("failed to write listing to", Path::new("<stdout>"), e))
}
