//! External programs: the static-site generator and the browser launcher.
//!
//! Only their exit status is observed.

use crate::error::{Result, SiteError};
use std::fs;
use std::io;
use std::path::Path;
use std::process::{Child, Command};
use tracing::info;

/// Default static-site generator executable
pub const DEFAULT_GENERATOR: &str = "hugo";

/// Default browser launcher executable
pub const DEFAULT_BROWSER: &str = "x-www-browser";

/// Where the generator's preview server listens
pub const DEFAULT_PREVIEW_URL: &str = "http://localhost:1313";

/// The static-site generator, invoked from the working directory.
#[derive(Debug, Clone)]
pub struct SiteGenerator {
    program: String,
}

impl SiteGenerator {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// Clear `output_dir`, recreate it empty, then run the generator with no
    /// arguments.
    pub fn build(&self, output_dir: &Path) -> Result<()> {
        info!("Clearing {} directory", output_dir.display());
        match fs::remove_dir_all(output_dir) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(SiteError::local_fs("failed to clear", output_dir, e)),
        }
        fs::create_dir_all(output_dir)
            .map_err(|e| SiteError::local_fs("failed to create", output_dir, e))?;

        info!("Building website");
        run_to_completion(Command::new(&self.program), &self.program)
    }

    /// Start the generator's local preview server without waiting for it.
    pub fn serve(&self) -> Result<Child> {
        let display = format!("{} server", self.program);
        Command::new(&self.program)
            .arg("server")
            .spawn()
            .map_err(|e| SiteError::External {
                command: display,
                message: e.to_string(),
            })
    }
}

impl Default for SiteGenerator {
    fn default() -> Self {
        Self::new(DEFAULT_GENERATOR)
    }
}

/// Program that opens a URL in the user's browser.
#[derive(Debug, Clone)]
pub struct Browser {
    program: String,
}

impl Browser {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn open(&self, url: &str) -> Result<()> {
        let mut cmd = Command::new(&self.program);
        cmd.arg(url);
        run_to_completion(cmd, &format!("{} {}", self.program, url))
    }
}

impl Default for Browser {
    fn default() -> Self {
        Self::new(DEFAULT_BROWSER)
    }
}

/// Wait on a started preview server and map a failed exit to an error.
pub fn wait_for_server(mut child: Child, program: &str) -> Result<()> {
    let display = format!("{} server", program);
    let status = child.wait().map_err(|e| SiteError::External {
        command: display.clone(),
        message: e.to_string(),
    })?;
    if !status.success() {
        return Err(SiteError::External {
            command: display,
            message: format!("exited with {}", status),
        });
    }
    Ok(())
}

fn run_to_completion(mut cmd: Command, display: &str) -> Result<()> {
    let status = cmd.status().map_err(|e| SiteError::External {
        command: display.to_string(),
        message: e.to_string(),
    })?;
    if !status.success() {
        return Err(SiteError::External {
            command: display.to_string(),
            message: format!("exited with {}", status),
        });
    }
    Ok(())
}
