//! Error types for CLI commands
//!
//! Library failures arrive as [`proxybuild_core::Error`]; the variants here
//! cover what only the command-line front end can get wrong.

use std::path::PathBuf;
use std::process::ExitStatus;
use thiserror::Error;

/// Errors that can occur during command execution
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum CommandError {
    /// Operating system name not recognised for packaging
    #[error("Unsupported target OS '{0}' (expected linux, darwin or windows)")]
    UnsupportedOs(String),

    /// Architecture name not recognised for packaging
    #[error("Unsupported target architecture '{0}' (expected amd64, arm64 or 386)")]
    UnsupportedArch(String),

    /// Known OS and architecture that cannot be combined
    #[error("Unsupported target platform {os}/{arch}")]
    UnsupportedTarget {
        /// Normalised OS name
        os: String,
        /// Normalised architecture name
        arch: String,
    },

    /// The directory given as workspace root does not contain the crates
    #[error("{} is not a proxybuild source tree (missing crates/engine/Cargo.toml)", .0.display())]
    InvalidSourceRoot(PathBuf),

    /// `cargo` is not on PATH
    #[error("Could not find cargo on PATH: {0}")]
    CargoNotFound(#[from] which::Error),

    /// `cargo build` ran and failed
    #[error("cargo build failed with {0}")]
    BuildFailed(ExitStatus),

    /// `cargo build` succeeded but the binary is not where expected
    #[error("Build succeeded but no executable was found at {}", .0.display())]
    ArtifactMissing(PathBuf),

    /// Rendering the generated project failed
    #[error("Failed to render {name}: {source}")]
    Render {
        /// Template name
        name: &'static str,
        /// The underlying template error
        #[source]
        source: minijinja::Error,
    },

    /// Configuration or engine error
    #[error(transparent)]
    Core(#[from] proxybuild_core::Error),

    /// IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Generic error
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias for command operations
pub type Result<T> = std::result::Result<T, CommandError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unsupported_target_message() {
        let err = CommandError::UnsupportedTarget {
            os: "darwin".to_string(),
            arch: "386".to_string(),
        };
        assert_eq!(err.to_string(), "Unsupported target platform darwin/386");
    }

    #[test]
    fn test_core_error_is_transparent() {
        let err = CommandError::from(proxybuild_core::Error::Message("boom".to_string()));
        assert_eq!(err.to_string(), "boom");
    }
}
