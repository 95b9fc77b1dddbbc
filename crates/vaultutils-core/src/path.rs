//! Slash-delimited secret paths.
//!
//! A valid path begins with the mount prefix (`secret/` unless configured
//! otherwise). The prefix is matched case-insensitively. Normalization
//! strips exactly one trailing `/`, so a folder name reported by a listing
//! (`y/`) joins to the same path as the bare name.

use std::fmt;

use crate::error::PathError;

/// The mount every path must live under unless a tool is told otherwise.
pub const DEFAULT_MOUNT_PREFIX: &str = "secret/";

/// A validated, normalized secret path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SecretPath(String);

impl SecretPath {
    /// Validate `raw` against `prefix` and normalize it.
    ///
    /// # Errors
    ///
    /// Returns [`PathError::MissingPrefix`] if `raw` does not start with
    /// `prefix` (ignoring ASCII case).
    pub fn parse(raw: &str, prefix: &str) -> Result<Self, PathError> {
        if !has_prefix(raw, prefix) {
            return Err(PathError::MissingPrefix {
                path: raw.to_owned(),
                prefix: prefix.to_owned(),
            });
        }
        Ok(Self(normalize(raw).to_owned()))
    }

    /// The path of child `key`, normalized.
    #[must_use]
    pub fn child(&self, key: &str) -> Self {
        Self(normalize(&format!("{}/{key}", self.0)).to_owned())
    }

    /// The part of the path after `prefix`, without leading or trailing `/`.
    ///
    /// Returns an empty string for the mount root itself.
    pub fn relative_to(&self, prefix: &str) -> &str {
        self.0
            .get(prefix.len()..)
            .unwrap_or_default()
            .trim_matches('/')
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SecretPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for SecretPath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Whether `raw` starts with `prefix`, ignoring ASCII case.
pub fn has_prefix(raw: &str, prefix: &str) -> bool {
    raw.get(..prefix.len())
        .is_some_and(|head| head.eq_ignore_ascii_case(prefix))
}

/// Prepend `prefix` to `raw` unless it is already there.
pub fn ensure_prefix(raw: &str, prefix: &str) -> String {
    if has_prefix(raw, prefix) {
        raw.to_owned()
    } else {
        format!("{prefix}{raw}")
    }
}

/// Whether a listed child key would join back onto its own parent.
pub(crate) fn is_degenerate_key(key: &str) -> bool {
    key.is_empty() || key == "/"
}

fn normalize(raw: &str) -> &str {
    raw.strip_suffix('/').unwrap_or(raw)
}
