//! Proxybuild CLI library
//!
//! This library contains all the CLI logic for proxybuild, making it reusable
//! for testing and integration with other tools.

pub mod cmd;
pub mod command;
pub mod error;
pub mod logging;
pub mod package;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use command::Command;

/// Proxybuild - wrap a command with declarative before/after hooks
#[derive(Parser)]
#[command(name = "proxybuild")]
#[command(about = "Wrap a command with declarative before/after hooks")]
#[command(version)]
#[command(long_about = "Wrap a command with declarative before/after hooks

A JSON configuration names a base command and, per sub-command, hooks that
run before or after it. Hooks can be restricted by the arguments given, by
whether the base command failed, and by the host platform.

Examples:
  • proxybuild run --config compose.json up -d
      → Run docker-compose up -d with the configured hooks

  • proxybuild show --config compose.json --sub-command down
      → List the hooks that apply to `down`

  • proxybuild build compose.json --os windows --arch amd64
      → Package docker-compose-proxy.exe for Windows")]
pub struct Cli {
    /// Enable verbose output (shows DEBUG level logs)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Write logs to a file (useful for debugging)
    #[arg(long, env = "PROXYBUILD_LOG_FILE", value_name = "FILE", global = true)]
    pub log_file: Option<PathBuf>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands for proxybuild CLI
#[derive(Subcommand)]
pub enum Commands {
    /// Run the base command with its hooks
    #[command(long_about = "Run the base command with its hooks

All ARGS are passed to the base command. The first one selects the hooks;
without ARGS the hooks under the empty-string key apply. Use `--` before
ARGS that look like proxybuild options.

The exit code is the base command's, 127 if it could not be started.")]
    Run(cmd::run::RunCommand),

    /// Package a configuration into a standalone executable
    Build(cmd::build::BuildCommand),

    /// Show the hooks a configuration declares
    Show(cmd::show::ShowCommand),
}

/// Run the CLI and return the process exit code
///
/// # Errors
///
/// Returns an error if:
/// - Logging initialization fails
/// - The configuration cannot be loaded
/// - A hook could not be started
/// - Packaging fails
pub fn run(cli: Cli) -> Result<i32> {
    // Initialize logging based on verbosity
    logging::init(cli.verbose, cli.log_file.as_deref())?;

    match cli.command {
        Commands::Run(run_cmd) => run_cmd
            .execute()
            .with_context(|| format!("Failed to run {}", run_cmd.config.display())),
        Commands::Build(build_cmd) => {
            build_cmd
                .execute()
                .with_context(|| format!("Failed to package {}", build_cmd.config.display()))?;
            Ok(0)
        }
        Commands::Show(show_cmd) => {
            show_cmd.execute()?;
            Ok(0)
        }
    }
}
