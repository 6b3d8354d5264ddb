//! Core types and utilities for proxybuild
//!
//! This is the foundation crate that all other proxybuild crates depend on.
//! It provides:
//! - Base error types
//! - Host platform detection
//! - Capability traits (`EnvironmentSource`)
//!
//! This crate has no dependencies on other proxybuild crates.

pub mod error;
pub mod platform;
pub mod traits;

pub use error::{Error, Result};
pub use traits::{EnvironmentSource, ProcessEnvironment};
