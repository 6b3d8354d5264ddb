//! CLI command implementations
//!
//! This module contains all command implementations for the proxybuild CLI.

pub mod build;
pub mod run;
pub mod show;
