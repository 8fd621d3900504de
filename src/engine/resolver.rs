//! engine::resolver
//!
//! External resolver invocation.
//!
//! # Design
//!
//! The resolver is an opaque subprocess with a file-in/file-out contract:
//! given an input requirements file and an output path, it writes a pinned
//! lockfile and exits zero, or exits non-zero with diagnostics on stderr.
//!
//! Orchestration logic depends only on the [`Resolver`] trait, so tests can
//! substitute an in-memory fake that writes canned pins.

use std::fmt;
use std::io;
use std::path::Path;
use std::process::Command;

use crate::core::config::Options;
use crate::core::types::EnvName;

/// Captured result of one resolver invocation.
#[derive(Debug, Clone)]
pub struct ToolOutput {
    /// Exit code, if the process terminated normally.
    pub code: Option<i32>,
    /// Whether the process exited with status zero.
    pub success: bool,
    /// Captured standard output.
    pub stdout: String,
    /// Captured standard error.
    pub stderr: String,
}

/// A fully composed resolver command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolverCommand {
    /// Program to invoke.
    pub program: String,
    /// Arguments, in order.
    pub args: Vec<String>,
}

impl ResolverCommand {
    /// Compose the pin command for one environment.
    ///
    /// The shape is `pip-compile --no-header --verbose --rebuild
    /// [pin options] --output-file OUT IN`. `--rebuild` forces the
    /// resolver to ignore its own cache, so the output reflects the
    /// current index state rather than a stale wheel cache.
    pub fn pin(options: &Options, env: &EnvName, in_path: &Path, out_path: &Path) -> Self {
        let mut args = vec![
            "--no-header".to_string(),
            "--verbose".to_string(),
            "--rebuild".to_string(),
        ];
        args.extend(options.pin_options(env));
        args.push("--output-file".to_string());
        args.push(out_path.to_string_lossy().into_owned());
        args.push(in_path.to_string_lossy().into_owned());
        Self {
            program: "pip-compile".to_string(),
            args,
        }
    }
}

impl fmt::Display for ResolverCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// Synchronous "run external tool" capability.
///
/// The call blocks until the tool exits and both output streams are fully
/// captured. There is no timeout: a hanging resolver hangs the run.
pub trait Resolver {
    /// Run the command to completion.
    ///
    /// # Errors
    ///
    /// Returns an [`io::Error`] if the process could not be spawned.
    fn run(&self, command: &ResolverCommand) -> io::Result<ToolOutput>;
}

/// The real resolver: spawns the command as a subprocess.
#[derive(Debug, Default)]
pub struct SubprocessResolver;

impl Resolver for SubprocessResolver {
    fn run(&self, command: &ResolverCommand) -> io::Result<ToolOutput> {
        let output = Command::new(&command.program).args(&command.args).output()?;
        Ok(ToolOutput {
            code: output.status.code(),
            success: output.status.success(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::UpgradeMode;
    use std::path::PathBuf;

    #[test]
    fn pin_command_shape() {
        let mut options = Options::new(PathBuf::from("req"));
        options.upgrade = UpgradeMode::None;
        let env = EnvName::new("base").unwrap();
        let command = ResolverCommand::pin(
            &options,
            &env,
            Path::new("req/base.in"),
            Path::new("req/base.txt"),
        );
        assert_eq!(command.program, "pip-compile");
        assert_eq!(
            command.args,
            vec![
                "--no-header",
                "--verbose",
                "--rebuild",
                "--output-file",
                "req/base.txt",
                "req/base.in",
            ]
        );
        assert_eq!(
            command.to_string(),
            "pip-compile --no-header --verbose --rebuild --output-file req/base.txt req/base.in"
        );
    }

    #[test]
    fn subprocess_resolver_captures_output() {
        let command = ResolverCommand {
            program: "sh".to_string(),
            args: vec!["-c".to_string(), "echo out; echo err >&2; exit 3".to_string()],
        };
        let output = SubprocessResolver.run(&command).unwrap();
        assert!(!output.success);
        assert_eq!(output.code, Some(3));
        assert_eq!(output.stdout.trim(), "out");
        assert_eq!(output.stderr.trim(), "err");
    }
}
