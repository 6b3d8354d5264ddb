//! Host platform detection
//!
//! Platform identifiers follow the naming used by hook `os_match` conditions
//! and by build targets:
//! - macOS → `"darwin"` (kernel name)
//! - Linux → `"linux"`
//! - Windows → `"windows"`
//! - other systems keep the name Rust reports (`"freebsd"`, `"openbsd"`, ...)
//!
//! Architectures use the same convention: `"amd64"`, `"arm64"`, `"386"`.
//!
//! Platform info is cached on first access.

use std::sync::LazyLock;

/// Current platform information (cached)
///
/// # Example
/// ```
/// use proxybuild_core::platform::CURRENT_PLATFORM;
///
/// let label = format!("{}/{}", CURRENT_PLATFORM.os, CURRENT_PLATFORM.arch);
/// assert!(label.contains('/'));
/// ```
pub static CURRENT_PLATFORM: LazyLock<Platform> = LazyLock::new(Platform::detect);

/// Platform information
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Platform {
    /// OS: "darwin" (macOS), "linux", "windows", ...
    pub os: &'static str,
    /// CPU architecture: "amd64", "arm64", "386", ...
    pub arch: &'static str,
}

impl Platform {
    /// Detect the platform this binary was compiled for
    pub fn detect() -> Self {
        Self {
            os: os_identifier(std::env::consts::OS),
            arch: arch_identifier(std::env::consts::ARCH),
        }
    }

    /// Whether this is a Windows host
    #[must_use]
    pub fn is_windows(&self) -> bool {
        self.os == "windows"
    }
}

/// Translate a Rust `target_os` name into a platform identifier
#[must_use]
pub fn os_identifier(rust_os: &'static str) -> &'static str {
    match rust_os {
        "macos" => "darwin",
        other => other,
    }
}

/// Translate a Rust `target_arch` name into a platform identifier
#[must_use]
pub fn arch_identifier(rust_arch: &'static str) -> &'static str {
    match rust_arch {
        "x86_64" => "amd64",
        "aarch64" => "arm64",
        "x86" => "386",
        "powerpc64" => "ppc64",
        "loongarch64" => "loong64",
        other => other,
    }
}
