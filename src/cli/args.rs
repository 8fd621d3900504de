//! cli::args
//!
//! Command-line argument definitions using clap derive.
//!
//! # Global Flags
//!
//! These flags are available on all commands:
//! - `--help` / `-h`: Show help
//! - `--version`: Show version
//! - `--directory <path>` / `-d`: Requirements directory
//! - `--in-ext` / `--out-ext`: File extensions
//! - `--debug`: Enable debug output
//! - `--quiet` / `-q`: Minimal output

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Multilock - lock layered requirements files into pinned lockfiles
///
/// Without a subcommand, compiles every discovered environment in
/// topological order of its references.
#[derive(Parser, Debug)]
#[command(name = "mlk")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Directory containing the environment files
    #[arg(short, long, global = true, default_value = "requirements")]
    pub directory: PathBuf,

    /// Input file extension (without dot)
    #[arg(long, global = true, value_name = "EXT")]
    pub in_ext: Option<String>,

    /// Output file extension (without dot)
    #[arg(long, global = true, value_name = "EXT")]
    pub out_ext: Option<String>,

    /// Enable debug output
    #[arg(long, global = true)]
    pub debug: bool,

    /// Minimal output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Upgrade all packages to their latest allowed versions (default)
    #[arg(long, overrides_with = "no_upgrade")]
    pub upgrade: bool,

    /// Keep versions already pinned in existing lockfiles
    #[arg(long)]
    pub no_upgrade: bool,

    /// Upgrade only the given package (repeatable); environments whose
    /// lockfiles do not mention any of them are skipped
    #[arg(short = 'P', long = "upgrade-package", value_name = "PACKAGE")]
    pub upgrade_packages: Vec<String>,

    /// Glob pattern for internal packages pinned with ~= (repeatable)
    #[arg(short = 'c', long = "compatible", value_name = "PATTERN")]
    pub compatible: Vec<String>,

    /// Environment allowed to keep post-release versions (repeatable)
    #[arg(long = "allow-post", value_name = "ENV")]
    pub allow_post: Vec<String>,

    /// Environment compiled with pre-release versions allowed (repeatable)
    #[arg(long = "prerelease", value_name = "ENV")]
    pub prerelease: Vec<String>,

    /// Package deduplicated across environments without version
    /// conflict checking (repeatable)
    #[arg(long = "unsafe-package", value_name = "PACKAGE")]
    pub unsafe_packages: Vec<String>,

    /// Extra flag forwarded verbatim to the resolver (repeatable)
    #[arg(long = "forward", value_name = "FLAG", allow_hyphen_values = true)]
    pub forward: Vec<String>,

    /// File with custom lockfile header text
    #[arg(long, value_name = "FILE")]
    pub header: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Parser::parse()
    }
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Check that every lockfile still matches its input file
    ///
    /// Recomputes each environment's fingerprint and compares it against
    /// the one recorded in the lockfile header. Exits non-zero if any
    /// environment drifted, after checking all of them.
    Verify,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn defaults_to_lock_mode() {
        let cli = Cli::try_parse_from(["mlk"]).unwrap();
        assert!(cli.command.is_none());
        assert_eq!(cli.directory, PathBuf::from("requirements"));
    }

    #[test]
    fn parses_repeatable_flags() {
        let cli = Cli::try_parse_from([
            "mlk",
            "-P",
            "six",
            "-P",
            "attrs",
            "-c",
            "ourorg-*",
            "--forward",
            "--no-emit-trusted-host",
        ])
        .unwrap();
        assert_eq!(cli.upgrade_packages, vec!["six", "attrs"]);
        assert_eq!(cli.compatible, vec!["ourorg-*"]);
        assert_eq!(cli.forward, vec!["--no-emit-trusted-host"]);
    }

    #[test]
    fn parses_verify_subcommand() {
        let cli = Cli::try_parse_from(["mlk", "verify", "-d", "reqs"]).unwrap();
        assert!(matches!(cli.command, Some(Command::Verify)));
        assert_eq!(cli.directory, PathBuf::from("reqs"));
    }
}
