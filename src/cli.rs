use crate::commands::{Workspace, DEFAULT_BACKUP_DIR, DEFAULT_BUILD_DIR};
use crate::generator::{
    Browser, SiteGenerator, DEFAULT_BROWSER, DEFAULT_GENERATOR, DEFAULT_PREVIEW_URL,
};
use crate::ssh::DEFAULT_CONFIG_FILE;
use crate::sync::SyncOptions;
use clap::error::{ContextKind, ErrorKind as ClapErrorKind};
use clap::{Parser, Subcommand};
use std::ffi::OsString;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "sitesync")]
#[command(about = "Build a static site and publish it to the web host over SSH", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Sub-site to act on (see `listsubdomains`)
    #[arg(short, long, global = true, value_name = "ID")]
    pub subdomain: Option<String>,

    /// Credentials file (username, password, host:port, known_hosts|insecure)
    #[arg(long, global = true, env = "SITESYNC_SSH_CONFIG", default_value = DEFAULT_CONFIG_FILE)]
    pub ssh_config: PathBuf,

    /// Directory the site generator builds into
    #[arg(long, global = true, default_value = DEFAULT_BUILD_DIR)]
    pub build_dir: PathBuf,

    /// Where the remote site is backed up before each upload
    #[arg(long, global = true, default_value = DEFAULT_BACKUP_DIR)]
    pub backup_dir: PathBuf,

    /// Static-site generator executable
    #[arg(long, global = true, env = "SITESYNC_GENERATOR", default_value = DEFAULT_GENERATOR)]
    pub generator: String,

    /// Browser launcher used by `preview`
    #[arg(long, global = true, env = "SITESYNC_BROWSER", default_value = DEFAULT_BROWSER)]
    pub browser: String,

    /// URL opened by `preview`
    #[arg(long, global = true, default_value = DEFAULT_PREVIEW_URL)]
    pub preview_url: String,

    /// Verbose output (-v debug, -vv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Only print warnings and errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Build the website, overwriting the selected-domain's file on server. (requires sub-domain)
    #[command(name = "build")]
    Build,

    /// Build and upload the latest version of the website to selected sub-domain (requires sub-domain)
    #[command(name = "deploy")]
    Deploy,

    /// Start a local server for previewing the website.
    #[command(name = "preview")]
    Preview,

    /// Upload the built website and host it at selected sub-domain. (requires sub-domain)
    #[command(name = "upload")]
    Upload,

    /// Rollback the website to whatever was present before the last deploy. (requires sub-domain)
    #[command(name = "rollback")]
    Rollback,

    /// Rotate the ssl (https) cert for supported domains.
    #[command(name = "rotatecert")]
    Rotatecert,

    /// List all of the domains for which we can rotate certs.
    #[command(name = "listcerts")]
    Listcerts,

    /// List all of the sub-domains we support generation of web pages.
    #[command(name = "listsubdomains")]
    Listsubdomains,
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Command::Build => "build",
            Command::Deploy => "deploy",
            Command::Preview => "preview",
            Command::Upload => "upload",
            Command::Rollback => "rollback",
            Command::Rotatecert => "rotatecert",
            Command::Listcerts => "listcerts",
            Command::Listsubdomains => "listsubdomains",
        }
    }

    pub fn requires_subdomain(&self) -> bool {
        matches!(
            self,
            Command::Build | Command::Deploy | Command::Upload | Command::Rollback
        )
    }
}

impl Cli {
    /// Parse process arguments, accepting the single-dash `-subdomain` form.
    pub fn try_parse_args() -> Result<Self, clap::Error> {
        Self::try_parse_from(normalize_args(std::env::args_os()))
    }

    pub fn log_level(&self) -> &'static str {
        if self.quiet {
            return "warn";
        }
        match self.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    }

    pub fn workspace(&self) -> Workspace {
        Workspace {
            build_dir: self.build_dir.clone(),
            backup_dir: self.backup_dir.clone(),
            ssh_config: self.ssh_config.clone(),
            generator: SiteGenerator::new(self.generator.clone()),
            browser: Browser::new(self.browser.clone()),
            preview_url: self.preview_url.clone(),
            sync: SyncOptions {
                progress: !self.quiet,
            },
        }
    }
}

/// One-line message for a rejected command line, printed after `Error:`.
pub fn usage_error_message(err: &clap::Error) -> String {
    match err.kind() {
        ClapErrorKind::MissingSubcommand | ClapErrorKind::DisplayHelpOnMissingArgumentOrSubcommand => {
            "did not specify command. Try 'help' command.".to_string()
        }
        ClapErrorKind::InvalidSubcommand => match err.get(ContextKind::InvalidSubcommand) {
            Some(name) => format!(
                "unknown command '{}'. Must provide valid command. Try 'help' command.",
                name
            ),
            None => "Must provide valid command. Try 'help' command.".to_string(),
        },
        _ => {
            let rendered = err.to_string();
            let first = rendered.lines().next().unwrap_or_default();
            first.strip_prefix("error: ").unwrap_or(first).to_string()
        }
    }
}

/// Rewrite `-subdomain X` / `-subdomain=X` to the `--subdomain` long form.
pub fn normalize_args<I>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = OsString>,
{
    args.into_iter()
        .map(|arg| match arg.to_str() {
            Some("-subdomain") => OsString::from("--subdomain"),
            Some(s) if s.starts_with("-subdomain=") => OsString::from(format!("-{}", s)),
            _ => arg,
        })
        .collect()
}
