//! core
//!
//! Core domain types and operations for Multilock.
//!
//! # Modules
//!
//! - [`types`] - Strong types: EnvName
//! - [`dependency`] - Single pinned-dependency line model
//! - [`graph`] - Environment reference graph and topological ordering
//! - [`registry`] - Cross-environment package registry and deduplication
//! - [`config`] - Configuration schema and loading
//!
//! # Design Principles
//!
//! - Strong typing prevents invalid states at compile time
//! - All policy decisions (pin operator, post-release stripping,
//!   deduplication) are pure functions of explicit inputs
//! - All verification is deterministic

pub mod config;
pub mod dependency;
pub mod graph;
pub mod registry;
pub mod types;
