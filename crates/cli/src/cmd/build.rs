//! Build command implementation

use crate::command::Command;
use crate::error::Result;
use crate::package::{BuildRequest, package};
use clap::Args;
use owo_colors::OwoColorize;
use proxybuild_core::ProcessEnvironment;
use std::path::PathBuf;

/// Package a configuration into a standalone proxy executable
#[derive(Debug, Args)]
pub struct BuildCommand {
    /// Configuration file to embed
    #[arg(value_name = "CONFIG")]
    pub config: PathBuf,

    /// Target operating system (linux, darwin, windows)
    #[arg(long, value_name = "OS")]
    pub os: Option<String>,

    /// Target architecture (amd64, arm64, 386)
    #[arg(long, value_name = "ARCH")]
    pub arch: Option<String>,

    /// Output path (default: <base command>-proxy)
    #[arg(short, long, value_name = "NAME")]
    pub output: Option<PathBuf>,

    /// proxybuild source tree the executable is built from
    #[arg(long, env = "PROXYBUILD_SOURCE_ROOT", value_name = "DIR")]
    pub source_root: Option<PathBuf>,
}

impl BuildCommand {
    /// Packaging request for this invocation
    pub fn request(&self) -> BuildRequest {
        BuildRequest {
            config: self.config.clone(),
            os: self.os.clone(),
            arch: self.arch.clone(),
            output: self.output.clone(),
            source_root: self.source_root.clone(),
        }
    }
}

impl Command for BuildCommand {
    type Output = PathBuf;

    fn execute(&self) -> Result<PathBuf> {
        let output = package(&self.request(), &ProcessEnvironment)?;
        println!("{} {}", "Built".green().bold(), output.display());
        Ok(output)
    }
}
