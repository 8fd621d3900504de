//! engine::staleness
//!
//! Fingerprints and incremental-mode staleness decisions.
//!
//! # Fingerprints
//!
//! Every generated lockfile starts with a fingerprint line, a content hash
//! of the trimmed bytes of its input file:
//!
//! ```text
//! # SHA256:9f86d081884c7d659a2feaa0c55ad015a3bf4f1b2b0b822cd15d6c15b0f00a08
//! ```
//!
//! `mlk verify` recomputes the fingerprint and compares it against the one
//! recorded in the lockfile to detect drift between declaration and pin.
//!
//! # Incremental mode
//!
//! When a run is restricted to upgrading named packages, an environment
//! whose lockfile mentions none of them is unaffected: the resolver is
//! skipped and its existing pins are re-read so descendants still see them.

use std::fs;
use std::io;
use std::path::Path;

use sha2::{Digest, Sha256};

use crate::core::config::UpgradeMode;
use crate::core::dependency::{Dependency, ParsedLine};

/// Prefix of the fingerprint line in generated lockfiles.
pub const FINGERPRINT_PREFIX: &str = "# SHA256:";

/// Compute the fingerprint line for an input file.
///
/// The hash covers the file's byte content with surrounding whitespace
/// trimmed, so editor-added trailing newlines do not invalidate lockfiles.
///
/// # Errors
///
/// Returns an [`io::Error`] if the input file cannot be read.
pub fn fingerprint_tag(in_path: &Path) -> io::Result<String> {
    let content = fs::read(in_path)?;
    let trimmed = trim_ascii(&content);
    let mut hasher = Sha256::new();
    hasher.update(trimmed);
    Ok(format!("{}{}", FINGERPRINT_PREFIX, hex::encode(hasher.finalize())))
}

fn trim_ascii(bytes: &[u8]) -> &[u8] {
    let start = bytes
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .unwrap_or(bytes.len());
    let end = bytes
        .iter()
        .rposition(|b| !b.is_ascii_whitespace())
        .map_or(start, |i| i + 1);
    &bytes[start..end]
}

/// Read the fingerprint recorded in a lockfile, if any.
///
/// The first line carrying the fingerprint prefix wins.
///
/// # Errors
///
/// Returns an [`io::Error`] if the lockfile cannot be read.
pub fn recorded_fingerprint(out_path: &Path) -> io::Result<Option<String>> {
    let text = fs::read_to_string(out_path)?;
    Ok(text
        .lines()
        .find(|line| line.starts_with(FINGERPRINT_PREFIX))
        .map(|line| line.trim_end().to_string()))
}

/// Whether a lockfile still matches its input file.
///
/// # Errors
///
/// Returns an [`io::Error`] if either file cannot be read.
pub fn verify_environment(in_path: &Path, out_path: &Path) -> io::Result<bool> {
    let current = fingerprint_tag(in_path)?;
    Ok(recorded_fingerprint(out_path)? == Some(current))
}

/// Whether an environment is affected by the current run.
///
/// Full and no-upgrade runs affect every environment. A run restricted to
/// named packages affects only environments whose existing lockfile pins
/// at least one of them; a missing lockfile always needs compiling.
///
/// # Errors
///
/// Returns an [`io::Error`] if an existing lockfile cannot be read.
pub fn affected(out_path: &Path, upgrade: &UpgradeMode) -> io::Result<bool> {
    let UpgradeMode::Packages(packages) = upgrade else {
        return Ok(true);
    };
    if !out_path.exists() {
        return Ok(true);
    }
    let text = fs::read_to_string(out_path)?;
    Ok(text.lines().any(|line| match Dependency::parse(line) {
        ParsedLine::Pin(dep) => packages.iter().any(|p| *p == dep.package),
        ParsedLine::Passthrough(_) => false,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn fingerprint_ignores_surrounding_whitespace() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.in");
        let b = dir.path().join("b.in");
        fs::write(&a, "six\npytest\n").unwrap();
        fs::write(&b, "\n  six\npytest  \n\n").unwrap();
        // Leading/trailing trim only; interior whitespace still matters.
        assert_eq!(fingerprint_tag(&a).unwrap(), fingerprint_tag(&b).unwrap());
    }

    #[test]
    fn fingerprint_is_content_sensitive() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.in");
        let b = dir.path().join("b.in");
        fs::write(&a, "six\n").unwrap();
        fs::write(&b, "six==1.0\n").unwrap();
        assert_ne!(fingerprint_tag(&a).unwrap(), fingerprint_tag(&b).unwrap());
    }

    #[test]
    fn verify_detects_drift() {
        let dir = tempfile::tempdir().unwrap();
        let in_path = dir.path().join("base.in");
        let out_path = dir.path().join("base.txt");
        fs::write(&in_path, "six\n").unwrap();
        let tag = fingerprint_tag(&in_path).unwrap();
        fs::write(&out_path, format!("{tag}\n#\nsix==1.16.0\n")).unwrap();
        assert!(verify_environment(&in_path, &out_path).unwrap());

        fs::write(&in_path, "six\nattrs\n").unwrap();
        assert!(!verify_environment(&in_path, &out_path).unwrap());
    }

    #[test]
    fn verify_fails_without_recorded_fingerprint() {
        let dir = tempfile::tempdir().unwrap();
        let in_path = dir.path().join("base.in");
        let out_path = dir.path().join("base.txt");
        fs::write(&in_path, "six\n").unwrap();
        fs::write(&out_path, "# no tag here\nsix==1.16.0\n").unwrap();
        assert!(!verify_environment(&in_path, &out_path).unwrap());
    }

    #[test]
    fn full_upgrade_affects_everything() {
        let missing = Path::new("/nonexistent/base.txt");
        assert!(affected(missing, &UpgradeMode::All).unwrap());
        assert!(affected(missing, &UpgradeMode::None).unwrap());
    }

    #[test]
    fn targeted_upgrade_skips_unrelated_lockfiles() {
        let dir = tempfile::tempdir().unwrap();
        let out_path = dir.path().join("base.txt");
        fs::write(&out_path, "# header\nsix==1.16.0\n").unwrap();

        let hit = UpgradeMode::Packages(vec!["six".to_string()]);
        let miss = UpgradeMode::Packages(vec!["attrs".to_string()]);
        assert!(affected(&out_path, &hit).unwrap());
        assert!(!affected(&out_path, &miss).unwrap());
    }

    #[test]
    fn targeted_upgrade_compiles_missing_lockfile() {
        let upgrade = UpgradeMode::Packages(vec!["six".to_string()]);
        assert!(affected(Path::new("/nonexistent/base.txt"), &upgrade).unwrap());
    }
}
