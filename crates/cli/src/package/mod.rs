//! Packaging a configuration into a standalone proxy executable
//!
//! Pipeline: load and validate the configuration, substitute build-machine
//! environment references, generate a cargo project that embeds the result,
//! build it with `cargo build --release`, copy the binary to its output path.

pub mod project;
pub mod target;

use crate::error::{CommandError, Result};
use proxybuild_config::{Config, parse_document, template_document};
use proxybuild_core::EnvironmentSource;
use std::fs;
use std::path::{Path, PathBuf};

pub use project::GeneratedProject;
pub use target::{Target, output_path, target_triple};

/// Everything needed to package one configuration
#[derive(Debug, Clone, Default)]
pub struct BuildRequest {
    /// Configuration file to embed
    pub config: PathBuf,
    /// Target OS (`linux`, `darwin`, `windows`)
    pub os: Option<String>,
    /// Target architecture (`amd64`, `arm64`, `386`)
    pub arch: Option<String>,
    /// Output path; derived from the base command when absent
    pub output: Option<PathBuf>,
    /// proxybuild workspace the generated project builds against
    pub source_root: Option<PathBuf>,
}

/// Configuration ready to embed
#[derive(Debug)]
pub struct PreparedConfig {
    /// Validated configuration after templating
    pub config: Config,
    /// Pretty-printed JSON that gets embedded
    pub json: String,
    /// Number of string values changed by templating
    pub substitutions: usize,
}

/// Load, validate and template a configuration file
///
/// The document is validated before and after substitution so that neither
/// the file as written nor the embedded result can be malformed.
pub fn prepare_config(path: &Path, environment: &impl EnvironmentSource) -> Result<PreparedConfig> {
    let content = fs::read_to_string(path).map_err(|source| proxybuild_core::Error::ConfigRead {
        path: path.to_path_buf(),
        source,
    })?;

    let mut document = parse_document(&content)?;
    Config::from_document(&document)?;

    let substitutions = template_document(&mut document, &environment.utf8_snapshot());
    let config = Config::from_document(&document)?;
    let json = serde_json::to_string_pretty(&document).map_err(proxybuild_core::Error::Decode)?;

    tracing::debug!(substitutions, "Templated configuration");
    Ok(PreparedConfig {
        config,
        json,
        substitutions,
    })
}

/// Workspace root the generated project depends on
///
/// Defaults to the workspace this binary was built from.
pub fn resolve_source_root(explicit: Option<&Path>) -> Result<PathBuf> {
    let root = match explicit {
        Some(path) => path.to_path_buf(),
        None => Path::new(env!("CARGO_MANIFEST_DIR")).join("..").join(".."),
    };

    if !root.join("crates").join("engine").join("Cargo.toml").is_file() {
        return Err(CommandError::InvalidSourceRoot(root));
    }
    Ok(fs::canonicalize(&root)?)
}

/// Build a standalone proxy executable
///
/// Returns the path of the written executable.
#[tracing::instrument(skip(request, environment), fields(config = %request.config.display()))]
pub fn package(request: &BuildRequest, environment: &impl EnvironmentSource) -> Result<PathBuf> {
    let prepared = prepare_config(&request.config, environment)?;
    let target = Target::resolve(request.os.as_deref(), request.arch.as_deref())?;
    let output = output_path(
        &prepared.config.base_command,
        request.output.as_deref(),
        &target,
    );
    let source_root = resolve_source_root(request.source_root.as_deref())?;

    tracing::info!(
        os = target.os,
        arch = target.arch,
        triple = target.triple.unwrap_or("host"),
        output = %output.display(),
        "Packaging proxy"
    );

    let project =
        GeneratedProject::create(&prepared.json, &prepared.config.base_command, &source_root)?;
    cargo_build(&project, &target)?;

    let artifact = project.artifact(&target);
    if !artifact.is_file() {
        return Err(CommandError::ArtifactMissing(artifact));
    }

    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::copy(&artifact, &output)?;

    Ok(output)
}

/// Cargo arguments for building a generated project
fn cargo_args(project: &GeneratedProject, target: &Target) -> Vec<String> {
    let mut args = vec![
        "build".to_string(),
        "--release".to_string(),
        "--manifest-path".to_string(),
        project.path().join("Cargo.toml").to_string_lossy().into_owned(),
        "--target-dir".to_string(),
        project.target_dir().to_string_lossy().into_owned(),
    ];
    if let Some(triple) = target.triple {
        args.push("--target".to_string());
        args.push(triple.to_string());
    }
    args
}

/// Run `cargo build`, streaming its output to stderr
fn cargo_build(project: &GeneratedProject, target: &Target) -> Result<()> {
    let cargo = which::which("cargo")?;
    let args = cargo_args(project, target);

    tracing::debug!("Executing: {} {:?}", cargo.display(), args);

    let output = duct::cmd(&cargo, &args)
        .dir(project.path())
        .stdout_to_stderr()
        .unchecked()
        .run()?;

    if !output.status.success() {
        return Err(CommandError::BuildFailed(output.status));
    }
    Ok(())
}
