//! core::graph
//!
//! Environment reference graph and topological ordering.
//!
//! # Architecture
//!
//! The reference graph is a DAG where:
//! - Nodes are discovered environments
//! - Edges point from an environment to the environments it references
//!   (a `test` environment referencing `base` extends it)
//!
//! # Invariants
//!
//! - Graph must be acyclic; a cycle is a fatal configuration error
//! - Every referenced environment must itself be discovered
//! - Ordering is deterministic: ties are broken by environment name

use std::collections::{BTreeMap, BTreeSet};

use thiserror::Error;

use super::types::EnvName;

/// Errors from reference graph operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum GraphError {
    #[error("circular reference detected involving environment: {0}")]
    CircularReference(EnvName),

    #[error("environment {env} references unknown environment: {reference}")]
    UnknownReference { env: EnvName, reference: EnvName },

    #[error("duplicate environment name: {0}")]
    DuplicateName(EnvName),
}

/// Node colors for the depth-first closure walk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    /// Currently on the walk stack.
    Gray,
    /// Fully expanded.
    Black,
}

/// The environment reference graph derived from discovered input files.
///
/// This is an in-memory representation computed once per run.
#[derive(Debug, Default)]
pub struct EnvGraph {
    /// Direct references for each environment.
    refs: BTreeMap<EnvName, BTreeSet<EnvName>>,
}

impl EnvGraph {
    /// Create an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an environment with its direct references.
    ///
    /// # Errors
    ///
    /// Returns `GraphError::DuplicateName` if the environment was already
    /// added; names must be unique within a run.
    pub fn add_env(&mut self, name: EnvName, refs: BTreeSet<EnvName>) -> Result<(), GraphError> {
        if self.refs.contains_key(&name) {
            return Err(GraphError::DuplicateName(name));
        }
        self.refs.insert(name, refs);
        Ok(())
    }

    /// Get the direct references of an environment.
    pub fn direct_refs(&self, name: &EnvName) -> Option<&BTreeSet<EnvName>> {
        self.refs.get(name)
    }

    /// All environment names in the graph.
    pub fn envs(&self) -> impl Iterator<Item = &EnvName> {
        self.refs.keys()
    }

    /// Compute the transitive reference closure of an environment.
    ///
    /// The result excludes the environment itself.
    ///
    /// # Errors
    ///
    /// Returns `GraphError::CircularReference` if the walk revisits an
    /// environment still on the stack, and `GraphError::UnknownReference`
    /// if a referenced environment was never discovered.
    pub fn recursive_refs(&self, name: &EnvName) -> Result<BTreeSet<EnvName>, GraphError> {
        let mut marks = BTreeMap::new();
        let mut closure = BTreeSet::new();
        self.expand(name, name, &mut marks, &mut closure)?;
        closure.remove(name);
        Ok(closure)
    }

    fn expand(
        &self,
        origin: &EnvName,
        current: &EnvName,
        marks: &mut BTreeMap<EnvName, Mark>,
        closure: &mut BTreeSet<EnvName>,
    ) -> Result<(), GraphError> {
        match marks.get(current) {
            Some(Mark::Gray) => return Err(GraphError::CircularReference(current.clone())),
            Some(Mark::Black) => return Ok(()),
            None => {}
        }
        let refs = self
            .refs
            .get(current)
            .ok_or_else(|| GraphError::UnknownReference {
                env: origin.clone(),
                reference: current.clone(),
            })?;

        marks.insert(current.clone(), Mark::Gray);
        closure.insert(current.clone());
        for reference in refs {
            self.expand(origin, reference, marks, closure)?;
        }
        marks.insert(current.clone(), Mark::Black);
        Ok(())
    }

    /// Compute a topological processing order.
    ///
    /// Every environment appears strictly after all environments it
    /// references, directly or transitively. Kahn's algorithm over the
    /// name-sorted ready set keeps the order deterministic.
    ///
    /// # Errors
    ///
    /// Returns `GraphError::CircularReference` for a cyclic graph and
    /// `GraphError::UnknownReference` for a dangling reference.
    pub fn topological_order(&self) -> Result<Vec<EnvName>, GraphError> {
        for (env, refs) in &self.refs {
            for reference in refs {
                if !self.refs.contains_key(reference) {
                    return Err(GraphError::UnknownReference {
                        env: env.clone(),
                        reference: reference.clone(),
                    });
                }
            }
        }

        let mut pending: BTreeMap<&EnvName, BTreeSet<&EnvName>> = self
            .refs
            .iter()
            .map(|(env, refs)| (env, refs.iter().collect()))
            .collect();
        let mut order = Vec::with_capacity(self.refs.len());

        while !pending.is_empty() {
            // BTreeMap iteration makes the first ready node the smallest name.
            let ready = pending
                .iter()
                .find(|(_, refs)| refs.is_empty())
                .map(|(env, _)| *env);
            let Some(env) = ready else {
                // Every pending env still waits on another pending env.
                let stuck = pending.keys().next().expect("pending is non-empty");
                return Err(GraphError::CircularReference((*stuck).clone()));
            };
            pending.remove(env);
            for refs in pending.values_mut() {
                refs.remove(env);
            }
            order.push(env.clone());
        }
        Ok(order)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env(name: &str) -> EnvName {
        EnvName::new(name).unwrap()
    }

    fn refs(names: &[&str]) -> BTreeSet<EnvName> {
        names.iter().map(|n| env(n)).collect()
    }

    fn chain() -> EnvGraph {
        // base <- test <- local
        let mut graph = EnvGraph::new();
        graph.add_env(env("base"), refs(&[])).unwrap();
        graph.add_env(env("test"), refs(&["base"])).unwrap();
        graph.add_env(env("local"), refs(&["test"])).unwrap();
        graph
    }

    #[test]
    fn empty_graph_orders_empty() {
        let graph = EnvGraph::new();
        assert!(graph.topological_order().unwrap().is_empty());
    }

    #[test]
    fn duplicate_name_rejected() {
        let mut graph = EnvGraph::new();
        graph.add_env(env("base"), refs(&[])).unwrap();
        assert_eq!(
            graph.add_env(env("base"), refs(&[])),
            Err(GraphError::DuplicateName(env("base")))
        );
    }

    #[test]
    fn recursive_refs_are_transitive() {
        let graph = chain();
        assert_eq!(graph.recursive_refs(&env("local")).unwrap(), refs(&["base", "test"]));
        assert_eq!(graph.recursive_refs(&env("test")).unwrap(), refs(&["base"]));
        assert_eq!(graph.recursive_refs(&env("base")).unwrap(), refs(&[]));
    }

    #[test]
    fn recursive_refs_exclude_self() {
        let graph = chain();
        assert!(!graph.recursive_refs(&env("local")).unwrap().contains(&env("local")));
    }

    #[test]
    fn cycle_detected_in_closure() {
        let mut graph = EnvGraph::new();
        graph.add_env(env("a"), refs(&["b"])).unwrap();
        graph.add_env(env("b"), refs(&["a"])).unwrap();
        assert!(matches!(
            graph.recursive_refs(&env("a")),
            Err(GraphError::CircularReference(_))
        ));
    }

    #[test]
    fn cycle_detected_in_topological_order() {
        let mut graph = EnvGraph::new();
        graph.add_env(env("a"), refs(&["b"])).unwrap();
        graph.add_env(env("b"), refs(&["c"])).unwrap();
        graph.add_env(env("c"), refs(&["a"])).unwrap();
        assert!(matches!(
            graph.topological_order(),
            Err(GraphError::CircularReference(_))
        ));
    }

    #[test]
    fn unknown_reference_detected() {
        let mut graph = EnvGraph::new();
        graph.add_env(env("test"), refs(&["base"])).unwrap();
        assert_eq!(
            graph.topological_order(),
            Err(GraphError::UnknownReference {
                env: env("test"),
                reference: env("base"),
            })
        );
    }

    #[test]
    fn order_places_refs_first() {
        let graph = chain();
        let order = graph.topological_order().unwrap();
        assert_eq!(order, vec![env("base"), env("test"), env("local")]);
    }

    #[test]
    fn order_is_deterministic_for_diamond() {
        // base <- {test, docs} <- local
        let mut graph = EnvGraph::new();
        graph.add_env(env("base"), refs(&[])).unwrap();
        graph.add_env(env("test"), refs(&["base"])).unwrap();
        graph.add_env(env("docs"), refs(&["base"])).unwrap();
        graph.add_env(env("local"), refs(&["test", "docs"])).unwrap();

        let order = graph.topological_order().unwrap();
        assert_eq!(order, vec![env("base"), env("docs"), env("test"), env("local")]);
        assert_eq!(order, graph.topological_order().unwrap());
    }
}
