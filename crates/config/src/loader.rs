//! Configuration loading
//!
//! Decoding is staged so that each failure is reported with the right kind:
//!
//! 1. The text is parsed as JSON ([`Error::Decode`] on syntax errors or a
//!    top-level value that is not an object)
//! 2. Every `executor` field is checked against the known executor kinds
//!    ([`Error::UnknownExecutor`], before any process can be started)
//! 3. The document is decoded into [`Config`] ([`Error::Decode`] on schema
//!    mismatches such as a string where a list is expected)

use crate::config::{Config, ExecutorKind};
use proxybuild_core::{Error, Result};
use serde::Deserialize;
use serde_json::Value;
use std::fs;
use std::path::Path;

impl Config {
    /// Load configuration from a JSON file
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigRead`] if the file cannot be read, otherwise the
    /// errors of [`Config::from_json_str`]
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| Error::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;

        tracing::debug!(path = %path.display(), "Loading configuration");
        Self::from_json_str(&content)
    }

    /// Decode configuration from JSON text
    ///
    /// # Errors
    ///
    /// Returns [`Error::Decode`] for malformed JSON or schema mismatches and
    /// [`Error::UnknownExecutor`] for executor kinds other than `shell`/`direct`
    pub fn from_json_str(content: &str) -> Result<Self> {
        let document = parse_document(content)?;
        validate_document(&document)?;

        // Decoding the text again keeps line and column in schema errors
        let config = serde_json::from_str(content).map_err(Error::Decode)?;
        log_decoded(&config);
        Ok(config)
    }

    /// Decode configuration from an already parsed JSON document
    ///
    /// # Errors
    ///
    /// Same as [`Config::from_json_str`], minus syntax errors
    pub fn from_document(document: &Value) -> Result<Self> {
        validate_document(document)?;

        let config = Self::deserialize(document).map_err(Error::Decode)?;
        log_decoded(&config);
        Ok(config)
    }

    /// Serialize configuration as pretty-printed JSON
    ///
    /// # Errors
    ///
    /// Returns [`Error::Decode`] if serialization fails
    pub fn to_json_pretty(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(Error::Decode)
    }
}

/// Parse configuration text into a JSON document without interpreting it
///
/// # Errors
///
/// Returns [`Error::Decode`] if the text is not valid JSON
pub fn parse_document(content: &str) -> Result<Value> {
    serde_json::from_str(content).map_err(Error::Decode)
}

/// Checks that run on the untyped document before decoding
fn validate_document(document: &Value) -> Result<()> {
    // Derived struct decoding would also accept a JSON array
    if !document.is_object() {
        return Err(Error::Decode(serde::de::Error::custom(
            "configuration document must be a JSON object",
        )));
    }

    check_executors(document)
}

fn log_decoded(config: &Config) {
    tracing::debug!(
        base_command = %config.base_command,
        executor = %config.executor,
        sub_commands = config.hooks.len(),
        hooks = config.total_hooks(),
        "Configuration decoded"
    );
}

/// Reject unknown executor kinds at the root and in every hook
///
/// Fields with the wrong JSON type are left for the typed decode to report.
fn check_executors(document: &Value) -> Result<()> {
    check_executor(document.get("executor"), || "executor".to_string())?;

    let Some(Value::Object(hooks)) = document.get("hooks") else {
        return Ok(());
    };

    for (sub_command, list) in hooks {
        let Value::Array(list) = list else {
            continue;
        };
        for (position, hook) in list.iter().enumerate() {
            check_executor(hook.get("executor"), || {
                format!("hooks[{sub_command:?}][{position}].executor")
            })?;
        }
    }

    Ok(())
}

fn check_executor(value: Option<&Value>, location: impl FnOnce() -> String) -> Result<()> {
    match value {
        Some(Value::String(kind)) if kind.parse::<ExecutorKind>().is_err() => {
            Err(Error::UnknownExecutor {
                location: location(),
                value: kind.clone(),
            })
        }
        _ => Ok(()),
    }
}
