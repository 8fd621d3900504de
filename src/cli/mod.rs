//! cli
//!
//! Command-line interface layer for Multilock.
//!
//! # Responsibilities
//!
//! - Parse command-line arguments and global flags
//! - Resolve run options (defaults, config file, flags)
//! - Delegate to command handlers
//!
//! # Architecture
//!
//! The CLI layer is thin. It parses arguments via clap, merges them with
//! the optional `multilock.toml`, and dispatches to the [`crate::engine`]
//! for execution.

pub mod args;
pub mod commands;

pub use args::{Cli, Command};

use std::fs;

use anyhow::{Context as _, Result};

use crate::core::config::{Options, UpgradeMode};
use crate::core::types::EnvName;
use crate::engine::Context;
use crate::ui::output::Verbosity;

/// Run the CLI application.
///
/// This is the main entry point called from `main.rs`.
pub fn run() -> Result<()> {
    let cli = Cli::parse_args();
    let options = resolve_options(&cli)?;
    let ctx = Context {
        verbosity: Verbosity::from_flags(cli.quiet, cli.debug),
    };

    match cli.command {
        Some(Command::Verify) => commands::verify(&options, &ctx),
        None => commands::lock(&options, &ctx),
    }
}

/// Merge defaults, `multilock.toml`, and CLI flags into run options.
fn resolve_options(cli: &Cli) -> Result<Options> {
    let mut options = Options::new(cli.directory.clone());
    options
        .load_file_config()
        .context("failed to load multilock.toml")?;

    if let Some(in_ext) = &cli.in_ext {
        options.in_ext = in_ext.clone();
    }
    if let Some(out_ext) = &cli.out_ext {
        options.out_ext = out_ext.clone();
    }
    if !cli.compatible.is_empty() {
        options.compatible_patterns = cli.compatible.clone();
    }
    if !cli.allow_post.is_empty() {
        options.allow_post = parse_env_names(&cli.allow_post)?;
    }
    if !cli.prerelease.is_empty() {
        options.prerelease = parse_env_names(&cli.prerelease)?;
    }
    if !cli.unsafe_packages.is_empty() {
        options.unsafe_packages = cli.unsafe_packages.clone();
    }
    if !cli.forward.is_empty() {
        options.forward = cli.forward.clone();
    }
    if let Some(header_path) = &cli.header {
        let text = fs::read_to_string(header_path)
            .with_context(|| format!("failed to read header file '{}'", header_path.display()))?;
        options.header = Some(text);
    }

    options.upgrade = if !cli.upgrade_packages.is_empty() {
        UpgradeMode::Packages(cli.upgrade_packages.clone())
    } else if cli.no_upgrade {
        UpgradeMode::None
    } else {
        UpgradeMode::All
    };
    Ok(options)
}

fn parse_env_names(names: &[String]) -> Result<std::collections::BTreeSet<EnvName>> {
    names
        .iter()
        .map(|name| {
            EnvName::new(name.clone()).with_context(|| format!("invalid environment name '{name}'"))
        })
        .collect()
}
