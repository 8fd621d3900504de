//! core::config
//!
//! Run options: schema, loading, and precedence.
//!
//! # Precedence
//!
//! Option values are resolved in this order (later overrides earlier):
//! 1. Built-in defaults (`in`/`txt` extensions, upgrade-all mode)
//! 2. `multilock.toml` in the requirements directory
//! 3. CLI flags (applied by the CLI layer)
//!
//! # Example
//!
//! ```no_run
//! use std::path::PathBuf;
//! use multilock::core::config::Options;
//!
//! let mut options = Options::new(PathBuf::from("requirements"));
//! options.load_file_config().unwrap();
//! println!("locking {}", options.glob_pattern());
//! ```

pub mod schema;

pub use schema::FileConfig;

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use super::dependency::PinPolicy;
use super::types::EnvName;

/// Name of the optional project configuration file.
pub const CONFIG_FILE_NAME: &str = "multilock.toml";

/// Boilerplate written below the fingerprint line of every lockfile.
pub const DEFAULT_HEADER: &str = "\
#
# This file is autogenerated by multilock.
# To update, run:
#
#    mlk lock
#";

/// Errors from configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file '{path}': {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("invalid config value: {0}")]
    InvalidValue(String),
}

/// How the resolver should treat already-pinned versions.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum UpgradeMode {
    /// Upgrade every package to its latest allowed version.
    #[default]
    All,
    /// Keep existing pins, only resolve what is missing.
    None,
    /// Upgrade only the named packages; environments whose lockfiles do
    /// not mention any of them are skipped entirely.
    Packages(Vec<String>),
}

/// Resolved options for one run.
///
/// Constructed with defaults, then layered with file config and CLI flags.
#[derive(Debug, Clone)]
pub struct Options {
    /// Directory containing the environment files.
    pub base_dir: PathBuf,
    /// Input file extension (without dot).
    pub in_ext: String,
    /// Output file extension (without dot).
    pub out_ext: String,
    /// Glob patterns designating internal packages.
    pub compatible_patterns: Vec<String>,
    /// Environments allowed to keep post-release suffixes.
    pub allow_post: BTreeSet<EnvName>,
    /// Environments compiled with `--pre`.
    pub prerelease: BTreeSet<EnvName>,
    /// Packages deduplicated without conflict checking.
    pub unsafe_packages: Vec<String>,
    /// Extra flags forwarded verbatim to the resolver.
    pub forward: Vec<String>,
    /// Custom header text, replacing [`DEFAULT_HEADER`].
    pub header: Option<String>,
    /// Upgrade behavior for this run.
    pub upgrade: UpgradeMode,
}

impl Options {
    /// Create options with built-in defaults for a requirements directory.
    pub fn new(base_dir: PathBuf) -> Self {
        Self {
            base_dir,
            in_ext: "in".to_string(),
            out_ext: "txt".to_string(),
            compatible_patterns: Vec::new(),
            allow_post: BTreeSet::new(),
            prerelease: BTreeSet::new(),
            unsafe_packages: Vec::new(),
            forward: Vec::new(),
            header: None,
            upgrade: UpgradeMode::default(),
        }
    }

    /// Load `multilock.toml` from the base directory, if present, and fold
    /// its values in. Missing file is not an error.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` for an unreadable or invalid file.
    pub fn load_file_config(&mut self) -> Result<(), ConfigError> {
        let path = self.base_dir.join(CONFIG_FILE_NAME);
        if !path.exists() {
            return Ok(());
        }
        let text = fs::read_to_string(&path).map_err(|source| ConfigError::ReadError {
            path: path.clone(),
            source,
        })?;
        let config: FileConfig = toml::from_str(&text).map_err(|err| ConfigError::ParseError {
            path: path.clone(),
            message: err.to_string(),
        })?;
        config.validate()?;
        self.apply_file_config(config);
        Ok(())
    }

    /// Fold parsed file config into these options.
    pub fn apply_file_config(&mut self, config: FileConfig) {
        if let Some(in_ext) = config.in_ext {
            self.in_ext = in_ext;
        }
        if let Some(out_ext) = config.out_ext {
            self.out_ext = out_ext;
        }
        if let Some(compatible) = config.compatible {
            self.compatible_patterns = compatible;
        }
        if let Some(allow_post) = config.allow_post {
            self.allow_post = allow_post.into_iter().collect();
        }
        if let Some(prerelease) = config.prerelease {
            self.prerelease = prerelease.into_iter().collect();
        }
        if let Some(unsafe_packages) = config.unsafe_packages {
            self.unsafe_packages = unsafe_packages;
        }
        if let Some(forward) = config.forward {
            self.forward = forward;
        }
        if let Some(header) = config.header {
            self.header = Some(header);
        }
    }

    /// Glob pattern matching every environment input file.
    pub fn glob_pattern(&self) -> String {
        self.base_dir
            .join(format!("*.{}", self.in_ext))
            .to_string_lossy()
            .into_owned()
    }

    /// Output file path for an input file path (extension swap).
    pub fn out_path(&self, in_path: &Path) -> PathBuf {
        in_path.with_extension(&self.out_ext)
    }

    /// Build the pin policy shared by every environment.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` for a malformed glob pattern.
    pub fn pin_policy(&self) -> Result<PinPolicy, ConfigError> {
        PinPolicy::new(&self.compatible_patterns, self.allow_post.iter().cloned()).map_err(|err| {
            ConfigError::InvalidValue(format!("bad compatible pattern: {err}"))
        })
    }

    /// Per-environment flags forwarded to the resolver.
    pub fn pin_options(&self, env: &EnvName) -> Vec<String> {
        let mut flags = Vec::new();
        match &self.upgrade {
            UpgradeMode::All => flags.push("--upgrade".to_string()),
            UpgradeMode::None => {}
            UpgradeMode::Packages(packages) => {
                flags.extend(
                    packages
                        .iter()
                        .map(|package| format!("--upgrade-package={package}")),
                );
            }
        }
        if self.prerelease.contains(env) {
            flags.push("--pre".to_string());
        }
        flags.extend(self.forward.iter().cloned());
        flags
    }

    /// Header text written below the fingerprint line.
    pub fn header_text(&self) -> &str {
        self.header.as_deref().unwrap_or(DEFAULT_HEADER)
    }
}
