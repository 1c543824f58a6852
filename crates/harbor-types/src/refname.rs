//! Reference names and git-style validation.
//!
//! Valid reference names:
//! - Must be non-empty
//! - Must not contain whitespace, `~`, `^`, `:`, `?`, `*`, `[`, `\`
//! - Must not contain `..` (double dot) or `@{`
//! - Must not start or end with `.` or `/`
//! - Must not end with `.lock`
//! - Must not contain consecutive slashes (`//`)
//! - Components between slashes must be non-empty and not start with `.`

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Characters that are forbidden anywhere in a reference name.
const FORBIDDEN_CHARS: &[char] = &[' ', '\t', '\n', '\r', '~', '^', ':', '?', '*', '[', '\\'];

/// A reference name, e.g. `refs/heads/main`.
///
/// The wire codecs treat names as opaque text; validation is for the party
/// composing updates, not the party relaying peer-reported outcomes.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RefName(String);

impl RefName {
    /// Wrap a name without validating it.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Wrap a name, rejecting invalid ones.
    pub fn validated(name: impl Into<String>) -> Result<Self, TypeError> {
        let name = Self(name.into());
        name.validate()?;
        Ok(name)
    }

    /// Check this name against the git-style rules above.
    pub fn validate(&self) -> Result<(), TypeError> {
        validate_ref_name(&self.0)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for RefName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for RefName {
    fn from(name: String) -> Self {
        Self(name)
    }
}

impl From<&str> for RefName {
    fn from(name: &str) -> Self {
        Self(name.to_string())
    }
}

impl AsRef<str> for RefName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Validate a reference name, returning `Ok(())` if valid.
pub fn validate_ref_name(name: &str) -> Result<(), TypeError> {
    let invalid = |reason: String| TypeError::InvalidRefName {
        name: name.to_string(),
        reason,
    };

    if name.is_empty() {
        return Err(invalid("name must not be empty".into()));
    }

    for ch in FORBIDDEN_CHARS {
        if name.contains(*ch) {
            return Err(invalid(format!("contains forbidden character: {ch:?}")));
        }
    }

    if name.contains("..") {
        return Err(invalid("must not contain '..'".into()));
    }

    if name.contains("@{") {
        return Err(invalid("must not contain '@{'".into()));
    }

    if name.starts_with('.') || name.ends_with('.') {
        return Err(invalid("must not start or end with '.'".into()));
    }

    if name.starts_with('/') || name.ends_with('/') {
        return Err(invalid("must not start or end with '/'".into()));
    }

    if name.ends_with(".lock") {
        return Err(invalid("must not end with '.lock'".into()));
    }

    if name.contains("//") {
        return Err(invalid("must not contain consecutive slashes '//'".into()));
    }

    for component in name.split('/') {
        if component.is_empty() {
            return Err(invalid("path components must not be empty".into()));
        }
        if component.starts_with('.') {
            return Err(invalid(format!(
                "component must not start with '.': {component:?}"
            )));
        }
    }

    Ok(())
}
