//! Logging configuration for proxybuild CLI
//!
//! Diagnostics go to stderr so the wrapped command owns stdout. An optional
//! log file receives everything at debug level.

use crate::error::Result;
use std::path::Path;
use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Crates whose events are shown by default
const CRATES: [&str; 4] = [
    "proxybuild",
    "proxybuild_config",
    "proxybuild_core",
    "proxybuild_engine",
];

/// Default filter directive for a level, one entry per crate
fn default_directive(verbose: bool) -> String {
    let level = if verbose { "debug" } else { "warn" };
    CRATES
        .iter()
        .map(|krate| format!("{krate}={level}"))
        .collect::<Vec<_>>()
        .join(",")
}

/// Initialize the logging system
///
/// `RUST_LOG` overrides the default filter.
///
/// # Arguments
/// * `verbose` - Enable debug level logging
/// * `log_file` - Optional path to append logs to
pub fn init(verbose: bool, log_file: Option<&Path>) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_directive(verbose)))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_file(false)
        .with_line_number(false)
        .without_time()
        .compact()
        .with_ansi(true)
        .with_filter(env_filter);

    let file_layer = match log_file {
        Some(log_path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(log_path)?;

            Some(
                fmt::layer()
                    .with_writer(file)
                    .with_ansi(false)
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_file(true)
                    .with_line_number(true)
                    .with_filter(EnvFilter::new("debug")),
            )
        }
        None => None,
    };

    // A second init (tests, embedding) keeps the first subscriber
    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(file_layer)
        .try_init()
        .ok();

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_directive_levels() {
        assert_eq!(
            default_directive(false),
            "proxybuild=warn,proxybuild_config=warn,proxybuild_core=warn,proxybuild_engine=warn"
        );
        assert!(default_directive(true).contains("proxybuild_engine=debug"));
    }

    #[test]
    fn test_default_directive_parses() {
        assert!(EnvFilter::try_new(default_directive(true)).is_ok());
    }
}
