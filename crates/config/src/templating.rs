//! Environment templating for configurations that get embedded
//!
//! Before a configuration is baked into a standalone executable, references
//! to the build machine's environment are substituted into its string values:
//!
//! - `$NAME` and `${NAME}` (Unix syntax)
//! - `%NAME%` (Windows syntax)
//!
//! `NAME` must match `[A-Za-z_][A-Za-z0-9_]*`. References to undefined
//! variables are left verbatim. Object keys are never rewritten.
//!
//! This is a build-time step only; nothing here runs while hooks execute.

use indexmap::IndexMap;
use serde_json::Value;
use std::borrow::Cow;

/// Substitute environment references in every string value of a document
///
/// Returns the number of string values that changed.
pub fn template_document(document: &mut Value, env: &IndexMap<String, String>) -> usize {
    match document {
        Value::String(text) => match expand_references(text, env) {
            Cow::Borrowed(_) => 0,
            Cow::Owned(expanded) => {
                *text = expanded;
                1
            }
        },
        Value::Array(items) => items.iter_mut().map(|item| template_document(item, env)).sum(),
        Value::Object(map) => map
            .values_mut()
            .map(|value| template_document(value, env))
            .sum(),
        Value::Null | Value::Bool(_) | Value::Number(_) => 0,
    }
}

/// Expand `$NAME`, `${NAME}` and `%NAME%` references in a string
///
/// Uses Cow to avoid allocation when nothing is substituted.
///
/// # Examples
///
/// ```
/// use indexmap::IndexMap;
/// use proxybuild_config::expand_references;
///
/// let env = IndexMap::from([("HOME".to_string(), "/home/me".to_string())]);
/// assert_eq!(expand_references("$HOME/bin", &env), "/home/me/bin");
/// assert_eq!(expand_references("%HOME%\\bin", &env), "/home/me\\bin");
/// assert_eq!(expand_references("$HOMEDIR", &env), "$HOMEDIR");
/// ```
pub fn expand_references<'a>(input: &'a str, env: &IndexMap<String, String>) -> Cow<'a, str> {
    if !input.contains(['$', '%']) {
        return Cow::Borrowed(input);
    }

    let bytes = input.as_bytes();
    let mut result = String::with_capacity(input.len());
    let mut last_end = 0;
    let mut i = 0;

    while i < bytes.len() {
        let reference = match bytes[i] {
            b'$' => dollar_reference(input, i),
            b'%' => percent_reference(input, i),
            _ => None,
        };

        if let Some((name, end)) = reference
            && let Some(value) = env.get(name)
        {
            result.push_str(&input[last_end..i]);
            result.push_str(value);
            last_end = end;
            i = end;
            continue;
        }

        i += 1;
    }

    if last_end == 0 {
        Cow::Borrowed(input)
    } else {
        result.push_str(&input[last_end..]);
        Cow::Owned(result)
    }
}

/// Parse `$NAME` or `${NAME}` at `start`, returning the name and the end offset
fn dollar_reference(input: &str, start: usize) -> Option<(&str, usize)> {
    let rest = &input[start + 1..];

    if let Some(braced) = rest.strip_prefix('{') {
        let close = braced.find('}')?;
        let name = &braced[..close];
        return is_name(name).then_some((name, start + 2 + close + 1));
    }

    let len = name_len(rest);
    (len > 0).then(|| (&rest[..len], start + 1 + len))
}

/// Parse `%NAME%` at `start`, returning the name and the end offset
fn percent_reference(input: &str, start: usize) -> Option<(&str, usize)> {
    let rest = &input[start + 1..];
    let close = rest.find('%')?;
    let name = &rest[..close];
    is_name(name).then_some((name, start + 1 + close + 1))
}

/// Length of the longest variable-name prefix of `s`
fn name_len(s: &str) -> usize {
    s.bytes()
        .enumerate()
        .take_while(|&(idx, b)| {
            b == b'_' || if idx == 0 { b.is_ascii_alphabetic() } else { b.is_ascii_alphanumeric() }
        })
        .count()
}

fn is_name(s: &str) -> bool {
    !s.is_empty() && name_len(s) == s.len()
}
