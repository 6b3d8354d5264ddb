//! Hook condition evaluation
//!
//! Decides whether a hook fires for an invocation. Constraints are checked in
//! a fixed order and evaluation stops at the first one that does not hold:
//!
//! 1. `os_match`: the host platform must be listed (empty list = any platform)
//! 2. `on_error`: the base command outcome must match
//! 3. `args_contain`: each entry must be a substring of some argument
//! 4. `args_match`: each entry must equal some argument
//!
//! Evaluation is pure: identical inputs always give the same answer.

use proxybuild_config::{Conditions, Hook};
use std::fmt;

/// The first constraint of a hook that did not hold
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnmetCondition<'a> {
    /// Host platform is not in `os_match`
    Platform,
    /// Base command outcome does not match `on_error`
    Outcome,
    /// No argument contains this `args_contain` entry
    ArgsContain(&'a str),
    /// No argument equals this `args_match` entry
    ArgsMatch(&'a str),
}

impl fmt::Display for UnmetCondition<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Platform => f.write_str("platform not in os_match"),
            Self::Outcome => f.write_str("base command outcome does not match on_error"),
            Self::ArgsContain(needle) => write!(f, "no argument contains '{needle}'"),
            Self::ArgsMatch(expected) => write!(f, "no argument equals '{expected}'"),
        }
    }
}

/// Check if a hook should fire
///
/// A hook without conditions always fires. The hook's `when` phase is not
/// considered here; the engine filters by phase before asking.
///
/// # Examples
///
/// ```
/// use proxybuild_config::{Conditions, Hook, HookPhase};
/// use proxybuild_engine::should_fire;
///
/// let hook = Hook::new("echo", HookPhase::After).with_conditions(Conditions {
///     args_contain: vec!["8080".to_string()],
///     ..Conditions::default()
/// });
///
/// let args = |list: &[&str]| list.iter().map(ToString::to_string).collect::<Vec<_>>();
/// assert!(should_fire(&hook, &args(&["up", "-p", "8080:80"]), false, "linux"));
/// assert!(!should_fire(&hook, &args(&["up", "-p", "9090:90"]), false, "linux"));
/// ```
#[must_use]
pub fn should_fire(hook: &Hook, args: &[String], had_error: bool, platform: &str) -> bool {
    unmet_condition(&hook.conditions, args, had_error, platform).is_none()
}

/// Find the first constraint that does not hold, if any
#[must_use]
pub fn unmet_condition<'a>(
    conditions: &'a Conditions,
    args: &[String],
    had_error: bool,
    platform: &str,
) -> Option<UnmetCondition<'a>> {
    if !conditions.os_match.is_empty() && !conditions.os_match.iter().any(|os| os == platform) {
        return Some(UnmetCondition::Platform);
    }

    if !conditions.on_error.accepts(had_error) {
        return Some(UnmetCondition::Outcome);
    }

    if let Some(needle) = conditions
        .args_contain
        .iter()
        .find(|needle| !args.iter().any(|arg| arg.contains(needle.as_str())))
    {
        return Some(UnmetCondition::ArgsContain(needle));
    }

    conditions
        .args_match
        .iter()
        .find(|expected| !args.iter().any(|arg| arg == *expected))
        .map(|expected| UnmetCondition::ArgsMatch(expected))
}
