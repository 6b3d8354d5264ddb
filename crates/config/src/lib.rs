//! Configuration management for proxybuild
//!
//! This crate handles:
//! - The configuration model (base command, hooks, conditions)
//! - Loading and validating JSON configuration documents
//! - Environment templating applied before a configuration is embedded

pub mod config;
pub mod loader;
pub mod templating;

// Re-export error types from core
pub use proxybuild_core::{Error, Result};

// Re-export main types
pub use config::{Conditions, Config, ErrorCondition, ExecutorKind, Hook, HookPhase};
pub use loader::parse_document;
pub use templating::{expand_references, template_document};
