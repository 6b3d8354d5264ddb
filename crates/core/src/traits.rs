//! Capability traits for proxybuild components
//!
//! Access to process-global state goes through these traits so that the
//! engine can be driven by deterministic inputs in tests.

use indexmap::IndexMap;
use std::ffi::OsString;

/// Source of the ambient environment
///
/// Implemented by [`ProcessEnvironment`] for the real process environment and
/// by any closure returning a variable map.
///
/// # Examples
///
/// ```
/// use indexmap::IndexMap;
/// use proxybuild_core::EnvironmentSource;
/// use std::ffi::OsString;
///
/// let fixed = || IndexMap::from([(OsString::from("HOME"), OsString::from("/home/test"))]);
/// assert_eq!(fixed.snapshot()[&OsString::from("HOME")], "/home/test");
/// assert_eq!(fixed.utf8_snapshot()["HOME"], "/home/test");
/// ```
pub trait EnvironmentSource {
    /// Take a snapshot of all environment variables, in a stable order
    ///
    /// Names and values are kept as the platform reports them, including
    /// ones that are not valid UTF-8.
    fn snapshot(&self) -> IndexMap<OsString, OsString>;

    /// The variables whose name and value are both valid UTF-8
    fn utf8_snapshot(&self) -> IndexMap<String, String> {
        self.snapshot()
            .into_iter()
            .filter_map(|(key, value)| Some((key.into_string().ok()?, value.into_string().ok()?)))
            .collect()
    }
}

/// The environment of the current process
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnvironment;

impl EnvironmentSource for ProcessEnvironment {
    fn snapshot(&self) -> IndexMap<OsString, OsString> {
        std::env::vars_os().collect()
    }
}

/// Implement `EnvironmentSource` for closures
impl<F> EnvironmentSource for F
where
    F: Fn() -> IndexMap<OsString, OsString>,
{
    fn snapshot(&self) -> IndexMap<OsString, OsString> {
        self()
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::panic)]
    use super::*;
    use serial_test::serial;
    use std::ffi::OsStr;

    fn os(value: &str) -> OsString {
        OsString::from(value)
    }

    #[test]
    #[serial]
    fn test_process_environment_sees_variables() {
        temp_env::with_var("PROXYBUILD_TRAIT_TEST", Some("visible"), || {
            let env = ProcessEnvironment.snapshot();
            assert_eq!(
                env.get(OsStr::new("PROXYBUILD_TRAIT_TEST"))
                    .map(OsString::as_os_str),
                Some(OsStr::new("visible"))
            );
        });
    }

    #[test]
    #[serial]
    fn test_process_environment_unset_variable() {
        temp_env::with_var_unset("PROXYBUILD_TRAIT_TEST", || {
            assert!(
                !ProcessEnvironment
                    .snapshot()
                    .contains_key(OsStr::new("PROXYBUILD_TRAIT_TEST"))
            );
        });
    }

    #[test]
    fn test_closure_source() {
        let source = || {
            let mut vars = IndexMap::new();
            vars.insert(os("A"), os("1"));
            vars.insert(os("B"), os("2"));
            vars
        };

        let snapshot = source.snapshot();
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot.get_index(0), Some((&os("A"), &os("1"))));
        assert_eq!(source.utf8_snapshot().get_index(1), Some((&"B".to_string(), &"2".to_string())));
    }

    #[cfg(unix)]
    #[test]
    #[serial]
    fn test_process_environment_keeps_non_utf8_values() {
        use std::os::unix::ffi::OsStrExt;

        let raw = OsStr::from_bytes(b"caf\xe9");
        temp_env::with_var("PROXYBUILD_TRAIT_BYTES", Some(raw), || {
            let env = ProcessEnvironment.snapshot();
            assert_eq!(
                env.get(OsStr::new("PROXYBUILD_TRAIT_BYTES"))
                    .map(OsString::as_os_str),
                Some(raw)
            );
            assert!(!ProcessEnvironment
                .utf8_snapshot()
                .contains_key("PROXYBUILD_TRAIT_BYTES"));
        });
    }
}
