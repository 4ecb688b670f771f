use anyhow::Context;
use colored::Colorize;
use sitesync::cli::{usage_error_message, Cli};
use sitesync::commands;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    let cli = match Cli::try_parse_args() {
        Ok(cli) => cli,
        // --help and --version
        Err(e) if !e.use_stderr() => e.exit(),
        Err(e) => {
            println!("{} {}", "Error:".red().bold(), usage_error_message(&e));
            return ExitCode::from(2);
        }
    };

    // RUST_LOG wins over -v/-q
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("sitesync={}", cli.log_level())));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stdout)
        .with_target(false)
        .without_time()
        .init();

    let workspace = cli.workspace();
    let result = commands::execute(cli.command, cli.subdomain.as_deref(), &workspace)
        .with_context(|| format!("'{}' failed", cli.command.name()));

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            println!("{} {:#}", "Error:".red().bold(), e);
            ExitCode::FAILURE
        }
    }
}
