//! engine::verify
//!
//! Lockfile consistency checking.
//!
//! # Modes
//!
//! `mlk verify` recomputes the fingerprint of every environment's input
//! file and compares it against the fingerprint recorded in its lockfile.
//! A mismatch means the lockfile drifted from its declaration and needs
//! regenerating.
//!
//! Mismatches are collected per environment, never aborting the check for
//! the remaining environments; the overall result fails if any environment
//! fails.
//!
//! # Invariants
//!
//! - Never mutates any file
//! - Must be deterministic

use std::path::PathBuf;

use crate::core::config::Options;
use crate::core::types::EnvName;

use super::{discover, staleness, LockError};

/// Per-environment outcome of the consistency check.
#[derive(Debug)]
pub struct CheckReport {
    /// Environment name.
    pub env: EnvName,
    /// Input file the fingerprint was computed from.
    pub in_path: PathBuf,
    /// Lockfile the recorded fingerprint was read from.
    pub out_path: PathBuf,
    /// Whether the fingerprints agree.
    pub ok: bool,
    /// Diagnostic for a failed check.
    pub detail: Option<String>,
}

/// Result of checking every discovered environment.
#[derive(Debug)]
pub struct VerifyResult {
    /// One report per environment, in processing order.
    pub reports: Vec<CheckReport>,
}

impl VerifyResult {
    /// Whether every environment passed.
    pub fn ok(&self) -> bool {
        self.reports.iter().all(|report| report.ok)
    }
}

/// Check every environment's lockfile against its input file.
///
/// # Errors
///
/// Only discovery errors (bad glob, cyclic references) are fatal; a
/// missing or unreadable lockfile is reported as a per-environment
/// failure instead.
pub fn verify_environments(options: &Options) -> Result<VerifyResult, LockError> {
    let discovered = discover::discover(options)?;
    let mut reports = Vec::with_capacity(discovered.envs.len());
    for conf in discovered.envs {
        let out_path = options.out_path(&conf.in_path);
        let (ok, detail) = match staleness::verify_environment(&conf.in_path, &out_path) {
            Ok(true) => (true, None),
            Ok(false) => (
                false,
                Some(format!(
                    "{} was not compiled from {}",
                    out_path.display(),
                    conf.in_path.display()
                )),
            ),
            Err(err) => (false, Some(err.to_string())),
        };
        reports.push(CheckReport {
            env: conf.name,
            in_path: conf.in_path,
            out_path,
            ok,
            detail,
        });
    }
    Ok(VerifyResult { reports })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn options(dir: &TempDir) -> Options {
        Options::new(dir.path().to_path_buf())
    }

    fn lock_manually(dir: &TempDir, name: &str, in_content: &str) {
        let in_path = dir.path().join(format!("{name}.in"));
        fs::write(&in_path, in_content).unwrap();
        let tag = staleness::fingerprint_tag(&in_path).unwrap();
        fs::write(
            dir.path().join(format!("{name}.txt")),
            format!("{tag}\n#\nsome-pin==1.0\n"),
        )
        .unwrap();
    }

    #[test]
    fn all_fresh_lockfiles_pass() {
        let dir = TempDir::new().unwrap();
        lock_manually(&dir, "base", "six\n");
        lock_manually(&dir, "test", "-r base.in\npytest\n");

        let result = verify_environments(&options(&dir)).unwrap();
        assert!(result.ok());
        assert_eq!(result.reports.len(), 2);
    }

    #[test]
    fn drifted_input_fails_only_its_environment() {
        let dir = TempDir::new().unwrap();
        lock_manually(&dir, "base", "six\n");
        lock_manually(&dir, "test", "-r base.in\npytest\n");
        fs::write(dir.path().join("base.in"), "six\nattrs\n").unwrap();

        let result = verify_environments(&options(&dir)).unwrap();
        assert!(!result.ok());
        let base = result
            .reports
            .iter()
            .find(|r| r.env.as_str() == "base")
            .unwrap();
        assert!(!base.ok);
        assert!(base
            .detail
            .as_deref()
            .unwrap()
            .contains("was not compiled from"));
        let test = result
            .reports
            .iter()
            .find(|r| r.env.as_str() == "test")
            .unwrap();
        assert!(test.ok, "unrelated environment must still be checked and pass");
    }

    #[test]
    fn missing_lockfile_is_a_per_env_failure() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("base.in"), "six\n").unwrap();
        let result = verify_environments(&options(&dir)).unwrap();
        assert!(!result.ok());
        assert_eq!(result.reports.len(), 1);
        assert!(result.reports[0].detail.is_some());
    }
}
