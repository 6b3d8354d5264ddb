//! Command execution
//!
//! Runs one command line under one of two invocation modes:
//!
//! - `direct`: the program is executed with the arguments as its literal
//!   argument vector; no shell metacharacter is interpreted
//! - `shell`: the command line is handed to the platform shell
//!   (`/bin/sh -c` on Unix, `cmd /C` on Windows), so pipes, redirection and
//!   variable expansion work. Anything that reaches `command` or `args` is
//!   interpreted by the shell.
//!
//! Children inherit stdin, stdout and stderr. A non-zero exit is a normal
//! outcome; only a failure to launch the process is an error.

use indexmap::IndexMap;
use proxybuild_config::ExecutorKind;
use proxybuild_core::{Error, Result};
use std::ffi::OsString;
use std::process::ExitStatus;

/// One command to run
#[derive(Debug, Clone, Copy)]
pub struct Invocation<'a> {
    /// Program (direct) or command line prefix (shell)
    pub command: &'a str,
    /// Arguments
    pub args: &'a [String],
    /// Invocation mode
    pub executor: ExecutorKind,
    /// Exact environment for the child; `None` or empty inherits the parent's
    pub env: Option<&'a IndexMap<OsString, OsString>>,
}

impl<'a> Invocation<'a> {
    /// Create an invocation that inherits the parent environment
    pub fn new(command: &'a str, args: &'a [String], executor: ExecutorKind) -> Self {
        Self {
            command,
            args,
            executor,
            env: None,
        }
    }

    /// Run the child with exactly this environment
    #[must_use]
    pub fn with_env(mut self, env: &'a IndexMap<OsString, OsString>) -> Self {
        self.env = Some(env);
        self
    }

    /// The environment override, if one applies
    pub fn env_override(&self) -> Option<&'a IndexMap<OsString, OsString>> {
        self.env.filter(|env| !env.is_empty())
    }
}

/// How a command that did start ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandOutcome {
    /// Whether the command exited successfully
    pub success: bool,
    /// Exit code, if the command exited normally
    pub code: Option<i32>,
    /// Terminating signal, if the command was killed (Unix only)
    pub signal: Option<i32>,
}

impl CommandOutcome {
    /// A successful exit
    #[must_use]
    pub fn succeeded() -> Self {
        Self {
            success: true,
            code: Some(0),
            signal: None,
        }
    }

    /// A normal exit with a non-zero code
    #[must_use]
    pub fn exited(code: i32) -> Self {
        Self {
            success: code == 0,
            code: Some(code),
            signal: None,
        }
    }

    /// Exit code a wrapper process should report for this outcome
    ///
    /// Signals map to `128 + signal` like POSIX shells do.
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        match (self.success, self.code, self.signal) {
            (true, _, _) => 0,
            (false, Some(code), _) if code != 0 => code,
            (false, _, Some(signal)) => 128 + signal,
            (false, _, None) => 1,
        }
    }
}

impl From<ExitStatus> for CommandOutcome {
    fn from(status: ExitStatus) -> Self {
        #[cfg(unix)]
        let signal = {
            use std::os::unix::process::ExitStatusExt;
            status.signal()
        };
        #[cfg(not(unix))]
        let signal = None;

        Self {
            success: status.success(),
            code: status.code(),
            signal,
        }
    }
}

/// Abstraction over launching commands
///
/// This trait allows different backends:
/// - `ProcessRunner`: spawns real child processes
/// - Recording implementations for testing
pub trait CommandRunner {
    /// Run a command to completion
    ///
    /// # Errors
    ///
    /// Returns [`Error::Startup`] if the process could not be launched.
    /// A non-zero exit is reported through [`CommandOutcome`], not as an error.
    fn run(&self, invocation: &Invocation<'_>) -> Result<CommandOutcome>;
}

impl<T: CommandRunner + ?Sized> CommandRunner for &T {
    fn run(&self, invocation: &Invocation<'_>) -> Result<CommandOutcome> {
        (**self).run(invocation)
    }
}

/// Runs commands as child processes of the current process
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessRunner;

impl CommandRunner for ProcessRunner {
    #[tracing::instrument(skip_all, fields(command = %invocation.command, executor = %invocation.executor))]
    fn run(&self, invocation: &Invocation<'_>) -> Result<CommandOutcome> {
        let (program, argv) = program_and_args(invocation, cfg!(windows));

        tracing::debug!("Executing: {} {:?}", program, argv);

        // Inherits stdio and, unless overridden, the parent environment
        let mut expression = duct::cmd(&program, &argv).unchecked();
        if let Some(env) = invocation.env_override() {
            tracing::debug!(vars = env.len(), "Using exact child environment");
            expression = expression.full_env(env);
        }

        let output = expression.run().map_err(|source| Error::Startup {
            program: program.clone(),
            source,
        })?;

        let outcome = CommandOutcome::from(output.status);
        tracing::debug!(
            success = outcome.success,
            code = ?outcome.code,
            "Command finished"
        );
        Ok(outcome)
    }
}

/// Resolve the program and argument vector for an invocation
fn program_and_args(invocation: &Invocation<'_>, windows: bool) -> (String, Vec<String>) {
    match invocation.executor {
        ExecutorKind::Direct => (invocation.command.to_string(), invocation.args.to_vec()),
        ExecutorKind::Shell => shell_command(invocation.command, invocation.args, windows),
    }
}

/// Build the shell invocation for a command line
///
/// On Unix the command and its arguments are joined with spaces into a single
/// `sh -c` script. On Windows they are passed to `cmd /C` as separate words.
fn shell_command(command: &str, args: &[String], windows: bool) -> (String, Vec<String>) {
    if windows {
        let mut argv = Vec::with_capacity(args.len() + 2);
        argv.push("/C".to_string());
        argv.push(command.to_string());
        argv.extend_from_slice(args);
        return ("cmd".to_string(), argv);
    }

    let script = if args.is_empty() {
        command.to_string()
    } else {
        format!("{command} {}", args.join(" "))
    };
    ("/bin/sh".to_string(), vec!["-c".to_string(), script])
}
