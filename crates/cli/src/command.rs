//! Command trait for proxybuild CLI
//!
//! Every subcommand implements [`Command`], which gives `lib.rs` one uniform
//! way to dispatch and lets tests drive commands without going through clap.

use crate::error::Result;

/// Trait for all proxybuild commands
///
/// Commands specify their return type via the `Output` associated type:
/// `run` yields the exit code of the wrapped command, `build` the path of
/// the packaged executable.
pub trait Command {
    /// The type returned by this command
    type Output;

    /// Execute the command
    ///
    /// # Errors
    ///
    /// Returns a `CommandError` if the command fails to execute. Error messages should
    /// be descriptive enough for the user to understand what went wrong.
    fn execute(&self) -> Result<Self::Output>;
}
