//! Multilock - a lockfile compiler for layered requirements files
//!
//! Multilock turns a directory of abstract requirements files (`base.in`,
//! `test.in`, `local.in`, ...) into fully pinned lockfiles, preserving the
//! layering between them: an environment that references another never
//! re-pins a package its ancestor already owns, and a package shared between
//! environments must resolve to the same version everywhere.
//!
//! # Architecture
//!
//! The codebase follows a strict layered architecture:
//!
//! - [`cli`] - Command-line interface layer (parses args, delegates to engine)
//! - [`engine`] - Orchestrates Discover → Resolve → Rewrite for each environment
//! - [`core`] - Domain types, dependency line model, reference graph,
//!   package registry, configuration, and lockfile verification
//! - [`ui`] - User-facing output utilities
//!
//! # Correctness Invariants
//!
//! Multilock maintains the following invariants:
//!
//! 1. Environments are processed in topological order of their references
//! 2. A package pinned by an ancestor environment is never re-pinned by a
//!    descendant; a version disagreement aborts the run
//! 3. The reference graph must be acyclic; a cycle aborts before any
//!    resolver invocation
//! 4. Every generated lockfile embeds a fingerprint of its source file

pub mod cli;
pub mod core;
pub mod engine;
pub mod ui;
