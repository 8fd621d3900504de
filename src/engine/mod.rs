//! engine
//!
//! Orchestrates the locking pipeline: Discover -> Resolve -> Rewrite.
//!
//! # Architecture
//!
//! The engine drives every environment through a uniform lifecycle:
//!
//! 1. **Discover**: Expand the input glob, parse references, order
//!    environments topologically
//! 2. **Resolve**: Invoke the external resolver for affected environments
//! 3. **Rewrite**: Normalize the resolver output line by line, dropping
//!    packages owned by ancestor environments, then inject `-r` references
//!    and the fingerprint header
//!
//! Environments are processed strictly sequentially in topological order:
//! conflict detection for an environment depends on the registry entries
//! finalized by every environment it references.
//!
//! # Invariants
//!
//! - No resolver is invoked before the whole graph is known to be acyclic
//! - A fatal error aborts the run immediately; already-written lockfiles
//!   are left on disk
//! - Skipped environments still register their packages for descendants

pub mod discover;
pub mod environment;
pub mod resolver;
pub mod staleness;
pub mod verify;

use std::path::PathBuf;

use thiserror::Error;

use crate::core::config::{ConfigError, Options};
use crate::core::graph::GraphError;
use crate::core::registry::{PackageRegistry, RegistryError};
use crate::ui::output::Verbosity;

use environment::Environment;
use resolver::Resolver;

/// Execution context shared by engine operations.
#[derive(Debug, Clone, Copy)]
pub struct Context {
    /// Output verbosity level.
    pub verbosity: Verbosity,
}

/// Errors from the locking pipeline.
#[derive(Debug, Error)]
pub enum LockError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Graph(#[from] GraphError),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error("failed to access '{path}': {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("resolver failed for {command} (exit code {code:?})")]
    ResolutionFailure {
        command: String,
        code: Option<i32>,
        stdout: String,
        stderr: String,
    },

    #[error(
        "package {package} was resolved to different versions in different \
         environments: {resolved} and {pinned}; please add constraints for \
         the package version"
    )]
    VersionConflict {
        package: String,
        pinned: String,
        resolved: String,
    },

    #[error("lockfile '{path}' ends with a continuation backslash")]
    TrailingContinuation { path: PathBuf },
}

impl LockError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Lock every discovered environment in topological order.
///
/// This is the whole pipeline: discovery, staleness checks, resolver
/// invocations, line rewriting, reference injection, and header
/// replacement. Returns the names of environments that were recompiled.
///
/// # Errors
///
/// Any [`LockError`] aborts the run immediately. Lockfiles written before
/// the failure are left in place.
pub fn lock_all(
    options: &Options,
    resolver: &dyn Resolver,
    ctx: &Context,
) -> Result<Vec<String>, LockError> {
    let policy = options.pin_policy()?;
    let discovered = discover::discover(options)?;
    let mut registry =
        PackageRegistry::new(discovered.graph, options.unsafe_packages.iter().cloned());

    let mut recompiled = Vec::new();
    for conf in discovered.envs {
        let mut env = Environment::new(conf, options);
        if env.maybe_create_lockfile(&mut registry, resolver, options, &policy, ctx)? {
            env.add_references(options)?;
            env.replace_header(&compose_header(&env, options)?)?;
            recompiled.push(env.name().to_string());
        }
    }
    Ok(recompiled)
}

/// Compose the lockfile header: fingerprint line first, boilerplate after.
///
/// Custom header lines are forced into comment form so the header/body
/// split stays stable across repeated runs.
fn compose_header(env: &Environment, options: &Options) -> Result<String, LockError> {
    let tag = staleness::fingerprint_tag(env.in_path())
        .map_err(|source| LockError::io(env.in_path(), source))?;
    let mut header = String::new();
    header.push_str(&tag);
    header.push('\n');
    for line in options.header_text().lines() {
        if line.starts_with('#') {
            header.push_str(line);
        } else {
            header.push_str("# ");
            header.push_str(line);
        }
        header.push('\n');
    }
    Ok(header)
}
