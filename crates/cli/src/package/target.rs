//! Packaging target selection and output naming
//!
//! Targets are named the way the `os_match` condition names platforms
//! (`linux`, `darwin`, `windows`; `amd64`, `arm64`, `386`). Rust spellings
//! are accepted as aliases.

use crate::error::{CommandError, Result};
use proxybuild_core::platform::CURRENT_PLATFORM;
use std::path::{Path, PathBuf};

/// Supported platforms and their Rust target triples
const TRIPLES: [(&str, &str, &str); 8] = [
    ("linux", "amd64", "x86_64-unknown-linux-gnu"),
    ("linux", "arm64", "aarch64-unknown-linux-gnu"),
    ("linux", "386", "i686-unknown-linux-gnu"),
    ("darwin", "amd64", "x86_64-apple-darwin"),
    ("darwin", "arm64", "aarch64-apple-darwin"),
    ("windows", "amd64", "x86_64-pc-windows-msvc"),
    ("windows", "arm64", "aarch64-pc-windows-msvc"),
    ("windows", "386", "i686-pc-windows-msvc"),
];

/// Platform an executable is built for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Target {
    /// OS identifier
    pub os: &'static str,
    /// Architecture identifier
    pub arch: &'static str,
    /// Rust target triple; `None` builds for the host toolchain's default
    pub triple: Option<&'static str>,
}

impl Target {
    /// Resolve the requested OS and architecture
    ///
    /// Missing halves default to the host. With neither given no explicit
    /// triple is passed to cargo.
    pub fn resolve(os: Option<&str>, arch: Option<&str>) -> Result<Self> {
        if os.is_none() && arch.is_none() {
            return Ok(Self {
                os: CURRENT_PLATFORM.os,
                arch: CURRENT_PLATFORM.arch,
                triple: None,
            });
        }

        let os = match os {
            Some(name) => normalize_os(name).ok_or_else(|| CommandError::UnsupportedOs(name.to_string()))?,
            None => CURRENT_PLATFORM.os,
        };
        let arch = match arch {
            Some(name) => {
                normalize_arch(name).ok_or_else(|| CommandError::UnsupportedArch(name.to_string()))?
            }
            None => CURRENT_PLATFORM.arch,
        };

        let triple = target_triple(os, arch).ok_or_else(|| CommandError::UnsupportedTarget {
            os: os.to_string(),
            arch: arch.to_string(),
        })?;

        Ok(Self {
            os,
            arch,
            triple: Some(triple),
        })
    }

    /// Whether executables for this target carry an `.exe` suffix
    #[must_use]
    pub fn is_windows(&self) -> bool {
        self.os == "windows"
    }

    /// File name suffix of executables for this target
    #[must_use]
    pub fn exe_suffix(&self) -> &'static str {
        if self.is_windows() { ".exe" } else { "" }
    }
}

/// Canonical OS identifier for a user-supplied name
fn normalize_os(name: &str) -> Option<&'static str> {
    match name.to_ascii_lowercase().as_str() {
        "linux" => Some("linux"),
        "darwin" | "macos" => Some("darwin"),
        "windows" => Some("windows"),
        _ => None,
    }
}

/// Canonical architecture identifier for a user-supplied name
fn normalize_arch(name: &str) -> Option<&'static str> {
    match name.to_ascii_lowercase().as_str() {
        "amd64" | "x86_64" => Some("amd64"),
        "arm64" | "aarch64" => Some("arm64"),
        "386" | "x86" | "i686" => Some("386"),
        _ => None,
    }
}

/// Rust target triple for a canonical OS/architecture pair
#[must_use]
pub fn target_triple(os: &str, arch: &str) -> Option<&'static str> {
    TRIPLES
        .iter()
        .find(|(o, a, _)| *o == os && *a == arch)
        .map(|(_, _, triple)| *triple)
}

/// Path the packaged executable is written to
///
/// An explicit output is used as given. Otherwise the name is the base
/// command's file name followed by `-proxy`, plus `.exe` for Windows targets.
#[must_use]
pub fn output_path(base_command: &str, explicit: Option<&Path>, target: &Target) -> PathBuf {
    if let Some(path) = explicit {
        return path.to_path_buf();
    }

    let stem = Path::new(base_command.trim())
        .file_name()
        .and_then(|name| name.to_str())
        .filter(|name| !name.is_empty())
        .unwrap_or("command");

    PathBuf::from(format!("{stem}-proxy{}", target.exe_suffix()))
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::panic)]
    use super::*;

    fn target(os: &str, arch: &str) -> Target {
        Target::resolve(Some(os), Some(arch)).unwrap()
    }

    #[test]
    fn test_triples_for_supported_pairs() {
        assert_eq!(target("linux", "amd64").triple, Some("x86_64-unknown-linux-gnu"));
        assert_eq!(target("darwin", "arm64").triple, Some("aarch64-apple-darwin"));
        assert_eq!(target("windows", "amd64").triple, Some("x86_64-pc-windows-msvc"));
        assert_eq!(target("linux", "386").triple, Some("i686-unknown-linux-gnu"));
    }

    #[test]
    fn test_rust_aliases() {
        let t = target("macos", "aarch64");
        assert_eq!((t.os, t.arch), ("darwin", "arm64"));

        let t = target("Linux", "X86_64");
        assert_eq!((t.os, t.arch), ("linux", "amd64"));
    }

    #[test]
    fn test_unknown_names_rejected() {
        assert!(matches!(
            Target::resolve(Some("plan9"), Some("amd64")),
            Err(CommandError::UnsupportedOs(name)) if name == "plan9"
        ));
        assert!(matches!(
            Target::resolve(Some("linux"), Some("mips")),
            Err(CommandError::UnsupportedArch(name)) if name == "mips"
        ));
    }

    #[test]
    fn test_unsupported_pair_rejected() {
        assert!(matches!(
            Target::resolve(Some("darwin"), Some("386")),
            Err(CommandError::UnsupportedTarget { .. })
        ));
    }

    #[test]
    fn test_host_default_has_no_triple() {
        let host = Target::resolve(None, None).unwrap();
        assert_eq!(host.os, CURRENT_PLATFORM.os);
        assert!(host.triple.is_none());
    }

    #[test]
    fn test_missing_half_defaults_to_host() {
        let t = Target::resolve(Some("windows"), None).unwrap();
        assert_eq!(t.os, "windows");
        assert_eq!(t.arch, CURRENT_PLATFORM.arch);
    }

    #[test]
    fn test_default_output_name() {
        let linux = target("linux", "amd64");
        let windows = target("windows", "amd64");

        assert_eq!(
            output_path("docker-compose", None, &linux),
            PathBuf::from("docker-compose-proxy")
        );
        assert_eq!(
            output_path("/usr/local/bin/git", None, &linux),
            PathBuf::from("git-proxy")
        );
        assert_eq!(
            output_path("docker-compose", None, &windows),
            PathBuf::from("docker-compose-proxy.exe")
        );
        assert_eq!(output_path("", None, &linux), PathBuf::from("command-proxy"));
    }

    #[test]
    fn test_explicit_output_kept() {
        let windows = target("windows", "amd64");
        assert_eq!(
            output_path("git", Some(Path::new("dist/g")), &windows),
            PathBuf::from("dist/g")
        );
    }
}
