//! Configuration structures
//!
//! Defines the proxy configuration: the wrapped base command, the hooks keyed
//! by sub-command, and the conditions gating each hook.

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

/// Root configuration object
///
/// Immutable once loaded. Field names match the JSON document:
///
/// ```json
/// {
///   "base_command": "docker-compose",
///   "executor": "direct",
///   "hooks": {
///     "up": [{ "command": "echo", "args": ["starting"], "when": "before" }]
///   },
///   "env_vars": { "COMPOSE_PROJECT_NAME": "demo" }
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// The program to wrap
    #[serde(default, deserialize_with = "null_as_default")]
    pub base_command: String,

    /// How the base command is invoked
    #[serde(default)]
    pub executor: ExecutorKind,

    /// Hooks by sub-command, in declaration order
    ///
    /// The empty-string key matches invocations without a sub-command.
    #[serde(default, deserialize_with = "null_values_as_default")]
    pub hooks: IndexMap<String, Vec<Hook>>,

    /// Additional environment entries for the base command
    #[serde(default, deserialize_with = "null_values_as_default")]
    pub env_vars: IndexMap<String, String>,
}

impl Config {
    /// Hooks declared for a sub-command, in declaration order
    #[must_use]
    pub fn hooks_for(&self, sub_command: &str) -> &[Hook] {
        self.hooks
            .get(sub_command)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Check if no base command and no hooks are configured
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.base_command.is_empty() && self.hooks.values().all(Vec::is_empty)
    }

    /// Get total number of hooks across all sub-commands
    #[must_use]
    pub fn total_hooks(&self) -> usize {
        self.hooks.values().map(Vec::len).sum()
    }
}

/// A single hook definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hook {
    /// Command to run
    #[serde(deserialize_with = "null_as_default")]
    pub command: String,

    /// Arguments passed to the command
    #[serde(default, deserialize_with = "null_items_as_default")]
    pub args: Vec<String>,

    /// How the hook is invoked (default: shell)
    #[serde(default)]
    pub executor: ExecutorKind,

    /// Phase the hook belongs to
    #[serde(default)]
    pub when: HookPhase,

    /// Conditions gating the hook (default: none)
    #[serde(
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "Conditions::is_empty"
    )]
    pub conditions: Conditions,
}

impl Hook {
    /// Create an unconditional hook for a phase
    pub fn new(command: impl Into<String>, when: HookPhase) -> Self {
        Self {
            command: command.into(),
            args: Vec::new(),
            executor: ExecutorKind::default(),
            when,
            conditions: Conditions::default(),
        }
    }

    /// Set the hook's arguments
    #[must_use]
    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    /// Set the hook's executor kind
    #[must_use]
    pub fn with_executor(mut self, executor: ExecutorKind) -> Self {
        self.executor = executor;
        self
    }

    /// Set the hook's conditions
    #[must_use]
    pub fn with_conditions(mut self, conditions: Conditions) -> Self {
        self.conditions = conditions;
        self
    }
}

/// Conditions under which a hook fires
///
/// Every present constraint must hold.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conditions {
    /// Outcome of the base command the hook requires
    #[serde(default, skip_serializing_if = "ErrorCondition::is_unset")]
    pub on_error: ErrorCondition,

    /// Substrings that must each occur in at least one argument
    #[serde(
        default,
        deserialize_with = "null_items_as_default",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub args_contain: Vec<String>,

    /// Strings that must each equal at least one argument
    #[serde(
        default,
        deserialize_with = "null_items_as_default",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub args_match: Vec<String>,

    /// Platforms the hook runs on (empty = all platforms)
    #[serde(
        default,
        deserialize_with = "null_items_as_default",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub os_match: Vec<String>,
}

impl Conditions {
    /// Check if no constraint is present
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.on_error.is_unset()
            && self.args_contain.is_empty()
            && self.args_match.is_empty()
            && self.os_match.is_empty()
    }
}

/// The `on_error` constraint
///
/// Decoded from an optional boolean: absent or `null` is [`ErrorCondition::Unset`],
/// `true` is [`ErrorCondition::RequireError`], `false` is
/// [`ErrorCondition::RequireSuccess`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Option<bool>", into = "Option<bool>")]
pub enum ErrorCondition {
    /// No constraint
    #[default]
    Unset,
    /// Fire only if the base command failed
    RequireError,
    /// Fire only if the base command succeeded
    RequireSuccess,
}

impl ErrorCondition {
    /// Check if no constraint is set
    #[must_use]
    pub fn is_unset(&self) -> bool {
        matches!(self, Self::Unset)
    }

    /// Whether the constraint accepts the given outcome
    #[must_use]
    pub fn accepts(self, had_error: bool) -> bool {
        match self {
            Self::Unset => true,
            Self::RequireError => had_error,
            Self::RequireSuccess => !had_error,
        }
    }
}

impl From<Option<bool>> for ErrorCondition {
    fn from(value: Option<bool>) -> Self {
        match value {
            None => Self::Unset,
            Some(true) => Self::RequireError,
            Some(false) => Self::RequireSuccess,
        }
    }
}

impl From<ErrorCondition> for Option<bool> {
    fn from(value: ErrorCondition) -> Self {
        match value {
            ErrorCondition::Unset => None,
            ErrorCondition::RequireError => Some(true),
            ErrorCondition::RequireSuccess => Some(false),
        }
    }
}

/// Invocation mode for a command
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "Option<String>")]
pub enum ExecutorKind {
    /// Interpret the command line through the platform shell
    #[default]
    Shell,
    /// Execute the program with a literal argument vector
    Direct,
}

impl ExecutorKind {
    /// Get the string name of this executor kind
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Shell => "shell",
            Self::Direct => "direct",
        }
    }
}

impl fmt::Display for ExecutorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExecutorKind {
    type Err = String;

    /// The empty string selects the default (shell)
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "" | "shell" => Ok(Self::Shell),
            "direct" => Ok(Self::Direct),
            other => Err(format!(
                "unknown executor '{other}' (expected 'shell' or 'direct')"
            )),
        }
    }
}

impl TryFrom<Option<String>> for ExecutorKind {
    type Error = String;

    fn try_from(value: Option<String>) -> Result<Self, Self::Error> {
        value.as_deref().unwrap_or_default().parse()
    }
}

/// Hook phase (`when`)
///
/// Values other than `before` and `after` are kept verbatim in
/// [`HookPhase::Other`]; such hooks never fire.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "Option<String>", into = "String")]
pub enum HookPhase {
    /// Before the base command
    Before,
    /// After the base command
    After,
    /// Any other (or missing) value
    #[default]
    Unrecognized,
    /// Unrecognized non-empty value
    Other(String),
}

impl HookPhase {
    /// Get the string name of this phase
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Before => "before",
            Self::After => "after",
            Self::Unrecognized => "",
            Self::Other(value) => value,
        }
    }
}

impl fmt::Display for HookPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<Option<String>> for HookPhase {
    fn from(value: Option<String>) -> Self {
        match value.as_deref() {
            Some("before") => Self::Before,
            Some("after") => Self::After,
            None | Some("") => Self::Unrecognized,
            Some(_) => Self::Other(value.unwrap_or_default()),
        }
    }
}

impl From<HookPhase> for String {
    fn from(value: HookPhase) -> Self {
        match value {
            HookPhase::Other(value) => value,
            phase => phase.as_str().to_string(),
        }
    }
}

/// Deserialize `null` as the type's default value
///
/// Documents written by older tooling serialise empty collections as `null`.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

/// Decode a list, reading the list itself or any element as `null` as empty
fn null_items_as_default<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    let items = Option::<Vec<Option<T>>>::deserialize(deserializer)?;
    Ok(items
        .unwrap_or_default()
        .into_iter()
        .map(Option::unwrap_or_default)
        .collect())
}

/// Decode a map, reading the map itself or any value as `null` as empty
fn null_values_as_default<'de, D, V>(deserializer: D) -> Result<IndexMap<String, V>, D::Error>
where
    D: Deserializer<'de>,
    V: Default + Deserialize<'de>,
{
    let entries = Option::<IndexMap<String, Option<V>>>::deserialize(deserializer)?;
    Ok(entries
        .unwrap_or_default()
        .into_iter()
        .map(|(key, value)| (key, value.unwrap_or_default()))
        .collect())
}
