//! core::dependency
//!
//! Single pinned-dependency line model.
//!
//! # Overview
//!
//! The external resolver emits lockfiles where each meaningful line pins one
//! package: `name==version  # via something`. This module parses such lines
//! into a [`Dependency`], applies pinning policy (compatible-release pins for
//! internal packages, post-release stripping), and serializes them back.
//!
//! Lines that do not match the pin shape (blank lines, comments, directives,
//! stray `-e` markers without a pin) pass through verbatim and are never
//! tracked as packages.
//!
//! # Invariants
//!
//! - A version stripped of its post-release suffix never regains it
//! - Parsing a serialized dependency yields the same package and version

use std::collections::BTreeSet;
use std::fmt;

use glob::{Pattern, PatternError};

use super::types::EnvName;

/// Column at which the pin segment is padded before the comment is appended.
const COMMENT_ALIGN: usize = 24;

/// Result of parsing one logical lockfile line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedLine {
    /// A pinned dependency line.
    Pin(Dependency),
    /// Any other line, preserved verbatim (trailing whitespace trimmed).
    Passthrough(String),
}

/// One resolved package pin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dependency {
    /// Package name, without any editable-install (`-e `) marker.
    pub package: String,
    /// Pinned version, whitespace-trimmed.
    pub version: String,
    /// Trailing comment starting with `#`, or empty.
    pub comment: String,
}

impl Dependency {
    /// Parse a logical line into a pin or a passthrough.
    ///
    /// Matches `<package>==<version> [# comment]`, with an optional leading
    /// `-e ` editable marker before the package token. Anything else is a
    /// [`ParsedLine::Passthrough`].
    pub fn parse(line: &str) -> ParsedLine {
        let trimmed = line.trim_end();
        match Self::parse_pin(trimmed.trim_start()) {
            Some(dep) => ParsedLine::Pin(dep),
            None => ParsedLine::Passthrough(trimmed.to_string()),
        }
    }

    fn parse_pin(text: &str) -> Option<Dependency> {
        // Editable-install marker is dropped from the pin on serialization.
        let text = text.strip_prefix("-e ").unwrap_or(text).trim_start();

        let (package, rest) = text.split_once("==")?;
        if package.is_empty()
            || package
                .chars()
                .any(|c| c.is_whitespace() || matches!(c, '=' | '<' | '>' | '!' | '~' | '#'))
        {
            return None;
        }

        let rest = rest.trim_start();
        let version_end = rest
            .find(|c: char| c.is_whitespace() || c == '#')
            .unwrap_or(rest.len());
        let version = &rest[..version_end];
        if version.is_empty() || version.contains('=') {
            return None;
        }

        let tail = rest[version_end..].trim_start();
        if !tail.is_empty() && !tail.starts_with('#') {
            return None;
        }

        Some(Dependency {
            package: package.to_string(),
            version: version.to_string(),
            comment: tail.trim_end().to_string(),
        })
    }

    /// Strip the post-release suffix (`.postN`) from the version when policy
    /// requires it: always for internal packages, otherwise only when the
    /// owning environment is not allowed to keep post-releases.
    ///
    /// Idempotent: a stripped version has no `.post` marker left.
    pub fn drop_post(&mut self, policy: &PinPolicy, env: &EnvName) {
        if policy.is_compatible(&self.package) || !policy.allows_post(env) {
            if let Some(index) = self.version.find(".post") {
                self.version.truncate(index);
            }
        }
    }

    /// Serialize the pin as a normalized lockfile line.
    ///
    /// Internal packages get a compatible-release pin (`~=`), everything
    /// else an exact pin (`==`). The pin segment is padded so comments line
    /// up across the file.
    pub fn serialize(&self, policy: &PinPolicy) -> String {
        let op = if policy.is_compatible(&self.package) {
            "~="
        } else {
            "=="
        };
        let pin = format!("{}{}{}", self.package, op, self.version);
        if self.comment.is_empty() {
            pin
        } else {
            format!("{:<width$}  {}", pin, self.comment, width = COMMENT_ALIGN)
                .trim_end()
                .to_string()
        }
    }
}

impl fmt::Display for Dependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}=={}", self.package, self.version)
    }
}

/// Pinning policy shared by every environment in a run.
///
/// Owns the glob patterns designating internal packages (pinned with `~=`)
/// and the set of environments allowed to keep post-release suffixes.
#[derive(Debug, Clone, Default)]
pub struct PinPolicy {
    compatible: Vec<Pattern>,
    allow_post: BTreeSet<EnvName>,
}

impl PinPolicy {
    /// Build a policy from glob patterns and the allow-post environment set.
    ///
    /// # Errors
    ///
    /// Returns the underlying [`PatternError`] for a malformed glob.
    pub fn new(
        compatible_patterns: &[String],
        allow_post: impl IntoIterator<Item = EnvName>,
    ) -> Result<Self, PatternError> {
        let compatible = compatible_patterns
            .iter()
            .map(|p| Pattern::new(&p.to_lowercase()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            compatible,
            allow_post: allow_post.into_iter().collect(),
        })
    }

    /// Whether a package is internal and should be loosely pinned.
    ///
    /// Matching is done on the lowercased package name.
    pub fn is_compatible(&self, package: &str) -> bool {
        let lowered = package.to_lowercase();
        self.compatible.iter().any(|p| p.matches(&lowered))
    }

    /// Whether an environment may keep post-release version suffixes.
    pub fn allows_post(&self, env: &EnvName) -> bool {
        self.allow_post.contains(env)
    }
}
