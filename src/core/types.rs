//! core::types
//!
//! Strong types for core domain concepts.
//!
//! # Types
//!
//! - [`EnvName`] - Validated environment name (derived from a file stem)
//!
//! # Validation
//!
//! These types enforce validity at construction time. Invalid values
//! cannot be represented, preventing entire classes of bugs.
//!
//! # Examples
//!
//! ```
//! use multilock::core::types::EnvName;
//!
//! let name = EnvName::new("base").unwrap();
//! assert_eq!(name.as_str(), "base");
//!
//! assert!(EnvName::new("").is_err());
//! assert!(EnvName::new("has space").is_err());
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from type validation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid environment name: {0}")]
    InvalidEnvName(String),
}

/// A validated environment name.
///
/// Environment names are derived from the stem of a requirements file
/// (`requirements/base.in` → `base`) and must be unique within a run.
///
/// Names must:
/// - Be non-empty
/// - Contain no whitespace
/// - Contain no path separators (`/`, `\`)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EnvName(String);

impl EnvName {
    /// Create a new environment name, validating it.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidEnvName` if the name is empty or
    /// contains whitespace or path separators.
    pub fn new(name: impl Into<String>) -> Result<Self, TypeError> {
        let name = name.into();
        if name.is_empty()
            || name.chars().any(char::is_whitespace)
            || name.contains('/')
            || name.contains('\\')
        {
            return Err(TypeError::InvalidEnvName(name));
        }
        Ok(Self(name))
    }

    /// Get the name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EnvName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for EnvName {
    type Error = TypeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<EnvName> for String {
    fn from(name: EnvName) -> Self {
        name.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_names_accepted() {
        for name in ["base", "test", "local", "py3.11", "dev-tools"] {
            assert!(EnvName::new(name).is_ok(), "{name} should be valid");
        }
    }

    #[test]
    fn invalid_names_rejected() {
        for name in ["", "has space", "a/b", "a\\b", "tab\tname"] {
            assert!(EnvName::new(name).is_err(), "{name:?} should be invalid");
        }
    }

    #[test]
    fn display_matches_as_str() {
        let name = EnvName::new("base").unwrap();
        assert_eq!(name.to_string(), name.as_str());
    }
}
