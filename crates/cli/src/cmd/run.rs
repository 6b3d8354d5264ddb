//! Run command implementation
//!
//! Loads a configuration and runs it against the given arguments, the same
//! way a packaged proxy does at startup.

use crate::command::Command;
use crate::error::Result;
use clap::Args;
use proxybuild_config::Config;
use proxybuild_engine::{BaseOutcome, ProxyRunner};
use std::path::PathBuf;

/// Run a configuration as a proxy for its base command
#[derive(Debug, Args)]
pub struct RunCommand {
    /// Configuration file
    #[arg(short, long, env = "PROXYBUILD_CONFIG", value_name = "FILE")]
    pub config: PathBuf,

    /// Arguments for the base command (the first one selects the hooks)
    #[arg(
        value_name = "ARGS",
        trailing_var_arg = true,
        allow_hyphen_values = true
    )]
    pub args: Vec<String>,
}

impl Command for RunCommand {
    type Output = i32;

    fn execute(&self) -> Result<i32> {
        let config = Config::load(&self.config)?;
        let report = ProxyRunner::new(&config).run(&self.args)?;

        match &report.base {
            BaseOutcome::Exited(outcome) => tracing::debug!(
                success = outcome.success,
                code = ?outcome.code,
                before = report.before_hooks_run,
                after = report.after_hooks_run,
                "Run finished"
            ),
            BaseOutcome::NotStarted(e) => tracing::error!("{e}"),
        }

        Ok(report.exit_code())
    }
}
