//! Run environment composition

use indexmap::IndexMap;
use std::ffi::OsString;

/// Compose the environment the base command runs with
///
/// Starts from the configuration's `env_vars` and overlays every ambient
/// variable on top, so the ambient value wins on a key collision. Ambient
/// names and values are carried as-is, including ones that are not valid
/// UTF-8. The result is a fresh map; neither input is modified.
///
/// # Examples
///
/// ```
/// use indexmap::IndexMap;
/// use proxybuild_engine::compose_environment;
/// use std::ffi::OsString;
///
/// let configured = IndexMap::from([
///     ("MODE".to_string(), "config".to_string()),
///     ("EXTRA".to_string(), "1".to_string()),
/// ]);
/// let ambient = IndexMap::from([(OsString::from("MODE"), OsString::from("ambient"))]);
///
/// let composed = compose_environment(&configured, ambient);
/// assert_eq!(composed[&OsString::from("MODE")], "ambient");
/// assert_eq!(composed[&OsString::from("EXTRA")], "1");
/// ```
#[must_use]
pub fn compose_environment(
    configured: &IndexMap<String, String>,
    ambient: IndexMap<OsString, OsString>,
) -> IndexMap<OsString, OsString> {
    let mut composed: IndexMap<OsString, OsString> = configured
        .iter()
        .map(|(key, value)| (OsString::from(key), OsString::from(value)))
        .collect();
    composed.extend(ambient);
    composed
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::panic)]
    use super::*;

    fn configured(entries: &[(&str, &str)]) -> IndexMap<String, String> {
        entries
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    fn ambient(entries: &[(&str, &str)]) -> IndexMap<OsString, OsString> {
        entries
            .iter()
            .map(|(k, v)| (OsString::from(k), OsString::from(v)))
            .collect()
    }

    #[test]
    fn test_ambient_wins_on_collision() {
        let composed = compose_environment(
            &configured(&[("PATH", "/config/bin"), ("A", "config")]),
            ambient(&[("PATH", "/usr/bin")]),
        );

        assert_eq!(composed[&OsString::from("PATH")], "/usr/bin");
        assert_eq!(composed[&OsString::from("A")], "config");
        assert_eq!(composed.len(), 2);
    }

    #[test]
    fn test_empty_inputs() {
        assert!(compose_environment(&IndexMap::new(), IndexMap::new()).is_empty());

        let only_ambient = compose_environment(&IndexMap::new(), ambient(&[("HOME", "/root")]));
        assert_eq!(only_ambient, ambient(&[("HOME", "/root")]));

        let only_config = compose_environment(&configured(&[("X", "1")]), IndexMap::new());
        assert_eq!(only_config, ambient(&[("X", "1")]));
    }

    #[test]
    fn test_configured_map_is_untouched() {
        let config = configured(&[("A", "1")]);
        let _ = compose_environment(&config, ambient(&[("A", "2"), ("B", "3")]));
        assert_eq!(config, configured(&[("A", "1")]));
    }

    #[cfg(unix)]
    #[test]
    fn test_non_utf8_ambient_value_is_kept() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let raw = OsStr::from_bytes(b"caf\xe9").to_os_string();
        let mut vars = IndexMap::new();
        vars.insert(OsString::from("LANG_BYTES"), raw.clone());

        let composed = compose_environment(&configured(&[("A", "1")]), vars);

        assert_eq!(composed.get(OsStr::new("LANG_BYTES")), Some(&raw));
        assert_eq!(composed.len(), 2);
    }
}
