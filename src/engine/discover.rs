//! engine::discover
//!
//! Environment discovery and ordering.
//!
//! # Overview
//!
//! Expands the input glob (`<base_dir>/*.in` by default), derives each
//! environment's name from its file stem, parses its direct references
//! (`-r other.in` / `--requirement other.in` lines), and returns the
//! environments in topological order: every environment appears after all
//! environments it references.
//!
//! A cycle or a reference to an undiscovered environment is a fatal
//! configuration error, detected before any resolver invocation.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use crate::core::config::{ConfigError, Options};
use crate::core::graph::EnvGraph;
use crate::core::types::EnvName;

use super::LockError;

/// One discovered environment, pre-resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvConfig {
    /// Name derived from the input file stem.
    pub name: EnvName,
    /// Path to the input requirements file.
    pub in_path: PathBuf,
    /// Names of directly referenced environments.
    pub refs: BTreeSet<EnvName>,
}

/// Result of discovery: ordered environments plus the reference graph.
#[derive(Debug)]
pub struct Discovered {
    /// Environments in topological processing order.
    pub envs: Vec<EnvConfig>,
    /// The validated reference graph.
    pub graph: EnvGraph,
}

/// Discover all environments under the configured glob and order them.
///
/// # Errors
///
/// Returns a [`LockError`] for an invalid glob, an unreadable input file,
/// a duplicate or invalid environment name, a dangling reference, or a
/// reference cycle.
pub fn discover(options: &Options) -> Result<Discovered, LockError> {
    let pattern = options.glob_pattern();
    let paths = glob::glob(&pattern)
        .map_err(|err| ConfigError::InvalidValue(format!("bad input glob '{pattern}': {err}")))?;

    let mut configs = Vec::new();
    for entry in paths {
        let in_path =
            entry.map_err(|err| ConfigError::InvalidValue(format!("glob error: {err}")))?;
        let name = env_name_for(&in_path)?;
        let refs = parse_references(&in_path)?
            .iter()
            .map(|token| ref_env_name(&in_path, token))
            .collect::<Result<BTreeSet<_>, _>>()?;
        configs.push(EnvConfig {
            name,
            in_path,
            refs,
        });
    }

    let mut graph = EnvGraph::new();
    for conf in &configs {
        graph.add_env(conf.name.clone(), conf.refs.clone())?;
    }

    let order = graph.topological_order()?;
    configs.sort_by_key(|conf| {
        order
            .iter()
            .position(|name| *name == conf.name)
            .unwrap_or(usize::MAX)
    });
    Ok(Discovered {
        envs: configs,
        graph,
    })
}

/// Parse the direct reference tokens of one input file.
///
/// Matches lines of the form `-r <path>` or `--requirement <path>`,
/// capturing the path token.
///
/// # Errors
///
/// Returns a [`LockError::Io`] if the file cannot be read.
pub fn parse_references(in_path: &Path) -> Result<Vec<String>, LockError> {
    let text = fs::read_to_string(in_path).map_err(|source| LockError::io(in_path, source))?;
    let mut refs = Vec::new();
    for line in text.lines() {
        let mut tokens = line.split_whitespace();
        if matches!(tokens.next(), Some("-r") | Some("--requirement")) {
            if let Some(path) = tokens.next() {
                refs.push(path.to_string());
            }
        }
    }
    Ok(refs)
}

fn env_name_for(in_path: &Path) -> Result<EnvName, LockError> {
    let stem = in_path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default();
    EnvName::new(stem)
        .map_err(|err| ConfigError::InvalidValue(format!("bad input file name: {err}")).into())
}

/// Environment name a reference token points at: the token's file stem.
fn ref_env_name(in_path: &Path, token: &str) -> Result<EnvName, LockError> {
    let stem = Path::new(token)
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default();
    EnvName::new(stem).map_err(|err| {
        ConfigError::InvalidValue(format!(
            "bad reference '{token}' in '{}': {err}",
            in_path.display()
        ))
        .into()
    })
}
