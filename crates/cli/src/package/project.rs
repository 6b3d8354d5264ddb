//! Generated cargo project for a packaged proxy
//!
//! The project lives in a temporary directory and consists of the embedded
//! `config.json`, a `src/main.rs` that hands the process arguments to the
//! engine, and a manifest that depends on this workspace's crates by path.

use super::target::Target;
use crate::error::{CommandError, Result};
use minijinja::{Environment, context};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const MANIFEST_TEMPLATE: &str = include_str!("templates/Cargo.toml.j2");
const MAIN_TEMPLATE: &str = include_str!("templates/main.rs.j2");

/// A throwaway cargo project, removed when dropped
#[derive(Debug)]
pub struct GeneratedProject {
    dir: TempDir,
    package_name: String,
}

impl GeneratedProject {
    /// Write the project files for an embedded configuration document
    ///
    /// `source_root` is the proxybuild workspace the generated manifest
    /// depends on.
    pub fn create(config_json: &str, base_command: &str, source_root: &Path) -> Result<Self> {
        let dir = tempfile::Builder::new().prefix("proxybuild-").tempdir()?;
        let package_name = package_name(base_command);

        let manifest = render_manifest(&package_name, source_root)?;
        let main = render_main(&package_name, base_command)?;

        fs::create_dir_all(dir.path().join("src"))?;
        fs::write(dir.path().join("Cargo.toml"), manifest)?;
        fs::write(dir.path().join("config.json"), config_json)?;
        fs::write(dir.path().join("src").join("main.rs"), main)?;

        tracing::debug!(
            dir = %dir.path().display(),
            package = %package_name,
            "Generated proxy project"
        );

        Ok(Self { dir, package_name })
    }

    /// Project root
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Cargo package and binary name
    pub fn package_name(&self) -> &str {
        &self.package_name
    }

    /// Cargo target directory used for the build
    pub fn target_dir(&self) -> PathBuf {
        self.dir.path().join("target")
    }

    /// Where cargo places the release binary for `target`
    pub fn artifact(&self, target: &Target) -> PathBuf {
        let mut dir = self.target_dir();
        if let Some(triple) = target.triple {
            dir.push(triple);
        }
        dir.push("release");
        dir.push(format!("{}{}", self.package_name, target.exe_suffix()));
        dir
    }
}

/// Cargo package name derived from the base command
///
/// Lowercase ASCII letters, digits, `-` and `_` are kept; anything else
/// becomes `-`. The name always starts with a letter and ends in `-proxy`.
#[must_use]
pub fn package_name(base_command: &str) -> String {
    let stem = Path::new(base_command.trim())
        .file_stem()
        .and_then(|name| name.to_str())
        .unwrap_or_default();

    let sanitized: String = stem
        .chars()
        .map(|c| {
            let c = c.to_ascii_lowercase();
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '-' }
        })
        .collect();
    let sanitized = sanitized.trim_start_matches(|c: char| !c.is_ascii_alphabetic());

    if sanitized.is_empty() {
        "command-proxy".to_string()
    } else {
        format!("{sanitized}-proxy")
    }
}

fn environment() -> Result<Environment<'static>> {
    let mut env = Environment::new();
    env.set_keep_trailing_newline(true);

    for (name, source) in [("Cargo.toml", MANIFEST_TEMPLATE), ("main.rs", MAIN_TEMPLATE)] {
        env.add_template(name, source)
            .map_err(|source| CommandError::Render { name, source })?;
    }
    Ok(env)
}

/// Render the generated project's manifest
pub fn render_manifest(package_name: &str, source_root: &Path) -> Result<String> {
    let crate_path = |name: &str| -> Result<String> {
        let path = source_root.join("crates").join(name);
        // JSON string syntax is valid TOML basic string syntax
        Ok(serde_json::to_string(&path.to_string_lossy()).map_err(anyhow::Error::from)?)
    };

    let env = environment()?;
    let template = env
        .get_template("Cargo.toml")
        .map_err(|source| CommandError::Render { name: "Cargo.toml", source })?;
    template
        .render(context! {
            package_name => package_name,
            config_crate => crate_path("config")?,
            engine_crate => crate_path("engine")?,
        })
        .map_err(|source| CommandError::Render { name: "Cargo.toml", source })
}

/// Render the generated program
pub fn render_main(package_name: &str, base_command: &str) -> Result<String> {
    let env = environment()?;
    let template = env
        .get_template("main.rs")
        .map_err(|source| CommandError::Render { name: "main.rs", source })?;
    template
        .render(context! {
            package_name => package_name,
            base_command => base_command.replace(['\n', '\r', '`'], " "),
            generator_version => env!("CARGO_PKG_VERSION"),
        })
        .map_err(|source| CommandError::Render { name: "main.rs", source })
}
