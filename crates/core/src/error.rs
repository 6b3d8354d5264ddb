//! Base error types for proxybuild
//!
//! This module provides the foundation error types that all crates can use.

use std::path::PathBuf;
use thiserror::Error;

/// Base error type for shared functionality
#[derive(Error, Debug)]
pub enum Error {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration file could not be read
    #[error("Failed to read configuration file {}: {source}", path.display())]
    ConfigRead {
        /// Path that was being read
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Configuration document is malformed or does not match the schema
    #[error("Failed to decode configuration: {0}")]
    Decode(#[source] serde_json::Error),

    /// Executor kind other than `shell` or `direct`
    #[error("Unknown executor '{value}' at {location} (expected 'shell' or 'direct')")]
    UnknownExecutor {
        /// JSON location of the offending field, e.g. `hooks.up[0].executor`
        location: String,
        /// The rejected value
        value: String,
    },

    /// A process could not be launched (missing binary, permission denied)
    #[error("Failed to start '{program}': {source}")]
    Startup {
        /// Program that was being launched
        program: String,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// A hook could not be launched; the run was aborted
    #[error("{phase} hook #{position} ('{command}') for sub-command '{sub_command}' aborted the run: {source}")]
    HookAborted {
        /// Phase the hook belongs to ("before" or "after")
        phase: &'static str,
        /// Sub-command whose hook list was being processed
        sub_command: String,
        /// Zero-based position of the hook in its declared list
        position: usize,
        /// The hook's command
        command: String,
        /// Why the hook could not be started
        #[source]
        source: Box<Error>,
    },

    /// Generic error message
    #[error("{0}")]
    Message(String),
}

impl Error {
    /// Whether this error stems from configuration content rather than I/O or process state
    #[must_use]
    pub fn is_configuration_error(&self) -> bool {
        matches!(self, Self::Decode(_) | Self::UnknownExecutor { .. })
    }

    /// Whether this error means a process could not be launched
    ///
    /// Looks through [`Error::HookAborted`] to the underlying cause.
    #[must_use]
    pub fn is_startup_error(&self) -> bool {
        match self {
            Self::Startup { .. } => true,
            Self::HookAborted { source, .. } => source.is_startup_error(),
            _ => false,
        }
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
