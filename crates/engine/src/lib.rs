//! # Proxybuild Engine
//!
//! Hook-driven execution engine for proxybuild.
//!
//! A run resolves the sub-command from the first argument, runs the matching
//! `before` hooks, runs the wrapped base command with the composed
//! environment, then runs the matching `after` hooks with the base command's
//! outcome:
//!
//! - **Conditions**: pure evaluation of a hook's constraints
//! - **Executor**: `shell` and `direct` invocation of one command
//! - **Environment**: composition of configured and ambient variables
//! - **Runner**: the before/base/after protocol and its report

pub mod conditions;
pub mod environment;
pub mod executor;
pub mod runner;

// Re-export error types from core
pub use proxybuild_core::{Error, Result};

// Re-export commonly used types
pub use conditions::{UnmetCondition, should_fire, unmet_condition};
pub use environment::compose_environment;
pub use executor::{CommandOutcome, CommandRunner, Invocation, ProcessRunner};
pub use runner::{
    BaseOutcome, HookStage, NOT_STARTED_EXIT_CODE, ProxyRunner, ProxyRunnerBuilder, RunReport, run,
};
