//! core::registry
//!
//! Cross-environment package registry and deduplication.
//!
//! # Overview
//!
//! One [`PackageRegistry`] exists per run. As each environment's lockfile is
//! finalized, its package→version mapping is registered; descendant
//! environments consult the registry to learn which packages an ancestor
//! already owns (and must therefore be suppressed) and to detect version
//! disagreements between layers.
//!
//! The registry is an explicit run-scoped object passed into each
//! environment's processing step, never process-wide state.
//!
//! # Invariants
//!
//! - An environment's packages are registered exactly once and never
//!   mutated afterwards
//! - A recorded version of `None` means "suppress without conflict
//!   checking" (configured unsafe packages)

use std::collections::{BTreeMap, BTreeSet};

use thiserror::Error;

use super::graph::{EnvGraph, GraphError};
use super::types::EnvName;

/// Errors from registry operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error(transparent)]
    Graph(#[from] GraphError),

    #[error("packages for environment {0} were already registered")]
    AlreadyRegistered(EnvName),
}

/// Package versions an environment must not re-pin, keyed by package name.
///
/// A `None` version suppresses the package without enforcing agreement.
pub type IgnoredPackages = BTreeMap<String, Option<String>>;

/// Run-scoped record of finalized package versions per environment.
#[derive(Debug, Default)]
pub struct PackageRegistry {
    graph: EnvGraph,
    packages: BTreeMap<EnvName, IgnoredPackages>,
    unsafe_packages: BTreeSet<String>,
}

impl PackageRegistry {
    /// Create a registry over a discovered reference graph.
    ///
    /// `unsafe_packages` are registered without a version, which disables
    /// conflict checking for them (they are still deduplicated).
    pub fn new(graph: EnvGraph, unsafe_packages: impl IntoIterator<Item = String>) -> Self {
        Self {
            graph,
            packages: BTreeMap::new(),
            unsafe_packages: unsafe_packages.into_iter().collect(),
        }
    }

    /// The reference graph this registry was built over.
    pub fn graph(&self) -> &EnvGraph {
        &self.graph
    }

    /// Transitive reference closure for an environment.
    pub fn recursive_refs(&self, env: &EnvName) -> Result<BTreeSet<EnvName>, GraphError> {
        self.graph.recursive_refs(env)
    }

    /// Union of package mappings registered by every transitive reference
    /// of `env`. Packages in this mapping must not be re-pinned by `env`.
    pub fn ignored_packages(&self, env: &EnvName) -> Result<IgnoredPackages, GraphError> {
        let mut ignored = IgnoredPackages::new();
        for reference in self.recursive_refs(env)? {
            if let Some(packages) = self.packages.get(&reference) {
                ignored.extend(packages.iter().map(|(k, v)| (k.clone(), v.clone())));
            }
        }
        Ok(ignored)
    }

    /// Record the finalized package→version mapping for an environment.
    ///
    /// Called exactly once per environment, after its lockfile is written
    /// (or re-read unchanged in incremental mode). Versions of packages
    /// configured as unsafe are discarded so descendants skip conflict
    /// checks for them.
    ///
    /// # Errors
    ///
    /// Returns `RegistryError::AlreadyRegistered` on a second call for the
    /// same environment.
    pub fn register_packages(
        &mut self,
        env: &EnvName,
        packages: BTreeMap<String, String>,
    ) -> Result<(), RegistryError> {
        if self.packages.contains_key(env) {
            return Err(RegistryError::AlreadyRegistered(env.clone()));
        }
        let recorded = packages
            .into_iter()
            .map(|(package, version)| {
                if self.unsafe_packages.contains(&package) {
                    (package, None)
                } else {
                    (package, Some(version))
                }
            })
            .collect();
        self.packages.insert(env.clone(), recorded);
        Ok(())
    }

    /// Registered packages for an environment, if finalized.
    pub fn packages_for(&self, env: &EnvName) -> Option<&IgnoredPackages> {
        self.packages.get(env)
    }
}
