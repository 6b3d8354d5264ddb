//! Show command implementation
//!
//! Prints a configuration's base command and the hooks that apply to each
//! sub-command, in the order they would run.

use crate::command::Command;
use crate::error::Result;
use clap::Args;
use owo_colors::OwoColorize;
use proxybuild_config::{Conditions, Config, ErrorCondition, Hook};
use proxybuild_core::platform::CURRENT_PLATFORM;
use std::path::PathBuf;

/// Show the hooks a configuration declares
#[derive(Debug, Args)]
pub struct ShowCommand {
    /// Configuration file
    #[arg(short, long, env = "PROXYBUILD_CONFIG", value_name = "FILE")]
    pub config: PathBuf,

    /// Only show hooks for this sub-command ("" for invocations without one)
    #[arg(short, long, value_name = "NAME")]
    pub sub_command: Option<String>,
}

impl Command for ShowCommand {
    type Output = ();

    fn execute(&self) -> Result<()> {
        let config = Config::load(&self.config)?;
        print!(
            "{}",
            render(&config, self.sub_command.as_deref(), CURRENT_PLATFORM.os)
        );
        Ok(())
    }
}

/// Render the configuration summary
fn render(config: &Config, sub_command: Option<&str>, platform: &str) -> String {
    let mut lines = Vec::new();

    let base = if config.base_command.is_empty() {
        "(none)".dimmed().to_string()
    } else {
        config.base_command.cyan().to_string()
    };
    lines.push(format!("{} {} [{}]", "Base command:".bold(), base, config.executor));

    if !config.env_vars.is_empty() {
        lines.push("Environment:".bold().to_string());
        lines.extend(
            config
                .env_vars
                .iter()
                .map(|(key, value)| format!("  {key}={value}")),
        );
    }

    let selected: Vec<(&String, &Vec<Hook>)> = config
        .hooks
        .iter()
        .filter(|(name, _)| sub_command.is_none_or(|wanted| wanted == name.as_str()))
        .collect();

    if selected.iter().all(|(_, hooks)| hooks.is_empty()) {
        let message = match sub_command {
            Some(name) => format!("No hooks for sub-command '{name}'"),
            None => "No hooks configured".to_string(),
        };
        lines.push(message.yellow().to_string());
        return lines.join("\n") + "\n";
    }

    for (name, hooks) in selected {
        let title = if name.is_empty() {
            "(no sub-command)".to_string()
        } else {
            name.clone()
        };
        lines.push(String::new());
        lines.push(title.bold().to_string());

        for (position, hook) in hooks.iter().enumerate() {
            let mut line = hook.command.clone();
            for arg in &hook.args {
                line.push(' ');
                line.push_str(arg);
            }
            lines.push(format!(
                "  #{position} {:<6} [{}] {line}",
                hook.when.as_str(),
                hook.executor
            ));

            if !hook.conditions.is_empty() {
                let mut note = describe_conditions(&hook.conditions);
                if !hook.conditions.os_match.is_empty()
                    && !hook.conditions.os_match.iter().any(|os| os == platform)
                {
                    note.push_str(" (not on this platform)");
                }
                lines.push(format!("      {} {}", "if".dimmed(), note));
            }
        }
    }

    lines.join("\n") + "\n"
}

/// Human-readable summary of a hook's conditions
fn describe_conditions(conditions: &Conditions) -> String {
    let mut parts = Vec::new();

    match conditions.on_error {
        ErrorCondition::RequireError => parts.push("base command failed".to_string()),
        ErrorCondition::RequireSuccess => parts.push("base command succeeded".to_string()),
        ErrorCondition::Unset => {}
    }
    if !conditions.args_contain.is_empty() {
        parts.push(format!("args contain [{}]", conditions.args_contain.join(", ")));
    }
    if !conditions.args_match.is_empty() {
        parts.push(format!("args match [{}]", conditions.args_match.join(", ")));
    }
    if !conditions.os_match.is_empty() {
        parts.push(format!("os in [{}]", conditions.os_match.join(", ")));
    }

    parts.join(", ")
}
