//! core::config::schema
//!
//! Configuration file schema types.
//!
//! # File Config
//!
//! An optional `multilock.toml` next to the requirements files carries
//! project-level defaults. CLI flags override file values.
//!
//! # Validation
//!
//! Values are validated after parsing: extensions must be bare (no dot),
//! environment names must be valid [`EnvName`]s, glob patterns must parse.

use glob::Pattern;
use serde::{Deserialize, Serialize};

use super::ConfigError;
use crate::core::types::EnvName;

/// Project configuration (`multilock.toml`).
///
/// # Example
///
/// ```toml
/// in_ext = "in"
/// out_ext = "txt"
/// compatible = ["ourorg-*"]
/// allow_post = ["local"]
/// prerelease = ["local"]
/// unsafe_packages = ["setuptools"]
/// forward = ["--no-emit-trusted-host"]
/// header = "Custom header text"
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    /// Input file extension (without dot)
    pub in_ext: Option<String>,

    /// Output file extension (without dot)
    pub out_ext: Option<String>,

    /// Glob patterns for internal packages pinned with `~=`
    pub compatible: Option<Vec<String>>,

    /// Environments allowed to keep post-release version suffixes
    pub allow_post: Option<Vec<EnvName>>,

    /// Environments compiled with pre-release versions allowed
    pub prerelease: Option<Vec<EnvName>>,

    /// Packages deduplicated without version conflict checking
    pub unsafe_packages: Option<Vec<String>>,

    /// Extra flags forwarded verbatim to the resolver
    pub forward: Option<Vec<String>>,

    /// Custom lockfile header text (fingerprint line is always prepended)
    pub header: Option<String>,
}

impl FileConfig {
    /// Validate the configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if any value is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for ext in [&self.in_ext, &self.out_ext].into_iter().flatten() {
            validate_extension(ext)?;
        }
        if let Some(patterns) = &self.compatible {
            for pattern in patterns {
                Pattern::new(pattern).map_err(|err| {
                    ConfigError::InvalidValue(format!("bad glob pattern '{pattern}': {err}"))
                })?;
            }
        }
        Ok(())
    }
}

/// Check that an extension is non-empty and carries no dot or separator.
pub(super) fn validate_extension(ext: &str) -> Result<(), ConfigError> {
    if ext.is_empty() || ext.contains('.') || ext.contains('/') || ext.contains('\\') {
        return Err(ConfigError::InvalidValue(format!(
            "invalid file extension '{ext}': must be a bare extension like 'in' or 'txt'"
        )));
    }
    Ok(())
}
