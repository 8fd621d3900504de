//! engine::environment
//!
//! Drives one environment through the locking lifecycle.
//!
//! # Lifecycle
//!
//! 1. Compute the ignore mapping from the registry (packages owned by
//!    ancestor environments)
//! 2. If the environment is unaffected by the current run, re-read its
//!    existing lockfile and register its pins without writing anything
//! 3. Otherwise invoke the external resolver, then rewrite its output line
//!    by line: join continuation-wrapped lines, drop ignored packages
//!    (with version conflict detection), apply post-release policy, and
//!    serialize normalized pins
//! 4. Inject `-r` references to direct ancestors and replace the header
//!    with the fingerprint line plus boilerplate
//!
//! # Invariants
//!
//! - The header/body split is identical on read and write, so repeated
//!   runs never corrupt a previously written file
//! - Packages are registered exactly once, after finalization

use std::collections::BTreeMap;
use std::fs;
use std::mem;
use std::path::{Path, PathBuf};

use crate::core::config::Options;
use crate::core::dependency::{Dependency, ParsedLine, PinPolicy};
use crate::core::registry::{IgnoredPackages, PackageRegistry};
use crate::core::types::EnvName;
use crate::ui::output;

use super::discover::EnvConfig;
use super::resolver::{Resolver, ResolverCommand};
use super::staleness;
use super::{Context, LockError};

/// One environment being locked.
#[derive(Debug)]
pub struct Environment {
    name: EnvName,
    in_path: PathBuf,
    out_path: PathBuf,
    refs: Vec<EnvName>,
    packages: BTreeMap<String, String>,
}

impl Environment {
    /// Build an environment from its discovered config.
    pub fn new(conf: EnvConfig, options: &Options) -> Self {
        let out_path = options.out_path(&conf.in_path);
        Self {
            name: conf.name,
            in_path: conf.in_path,
            out_path,
            refs: conf.refs.into_iter().collect(),
            packages: BTreeMap::new(),
        }
    }

    /// Environment name.
    pub fn name(&self) -> &EnvName {
        &self.name
    }

    /// Input requirements file path.
    pub fn in_path(&self) -> &Path {
        &self.in_path
    }

    /// Generated lockfile path.
    pub fn out_path(&self) -> &Path {
        &self.out_path
    }

    /// Lock this environment unless it is unaffected by the current run.
    ///
    /// Returns whether the lockfile was recompiled. Either way the
    /// environment's packages end up registered for descendants.
    ///
    /// # Errors
    ///
    /// Fails on resolver failure, version conflict with an ancestor, or
    /// file access errors. All are fatal to the run.
    pub fn maybe_create_lockfile(
        &mut self,
        registry: &mut PackageRegistry,
        resolver: &dyn Resolver,
        options: &Options,
        policy: &PinPolicy,
        ctx: &Context,
    ) -> Result<bool, LockError> {
        let refs = registry.recursive_refs(&self.name)?;
        output::print(
            format!(
                "Locking {} to {}. References: {:?}",
                self.in_path.display(),
                self.out_path.display(),
                refs.iter().map(EnvName::as_str).collect::<Vec<_>>(),
            ),
            ctx.verbosity,
        );
        let ignore = registry.ignored_packages(&self.name)?;

        let affected = staleness::affected(&self.out_path, &options.upgrade)
            .map_err(|source| LockError::io(&self.out_path, source))?;
        if !affected {
            output::warn(
                format!("{} is unaffected, reusing existing pins", self.name),
                ctx.verbosity,
            );
            self.fix_lockfile(&ignore, registry, policy, false)?;
            return Ok(false);
        }

        let command = ResolverCommand::pin(options, &self.name, &self.in_path, &self.out_path);
        output::debug(format!("running {}", command), ctx.verbosity);
        let result = resolver
            .run(&command)
            .map_err(|err| LockError::ResolutionFailure {
                command: command.to_string(),
                code: None,
                stdout: String::new(),
                stderr: err.to_string(),
            })?;
        if !result.success {
            output::error(format!("ERROR executing {}", command));
            output::error(format!("Exit code: {:?}", result.code));
            output::error(&result.stdout);
            output::error(&result.stderr);
            return Err(LockError::ResolutionFailure {
                command: command.to_string(),
                code: result.code,
                stdout: result.stdout,
                stderr: result.stderr,
            });
        }

        self.fix_lockfile(&ignore, registry, policy, true)?;
        Ok(true)
    }

    /// Run every logical line of the lockfile through [`Self::fix_pin`],
    /// optionally write the result back, and register the package mapping.
    fn fix_lockfile(
        &mut self,
        ignore: &IgnoredPackages,
        registry: &mut PackageRegistry,
        policy: &PinPolicy,
        write: bool,
    ) -> Result<(), LockError> {
        let text = fs::read_to_string(&self.out_path)
            .map_err(|source| LockError::io(&self.out_path, source))?;
        let mut fixed = Vec::new();
        for line in concat_lines(&text, &self.out_path)? {
            if let Some(fixed_line) = self.fix_pin(&line, ignore, policy)? {
                fixed.push(fixed_line);
            }
        }
        if write {
            let mut content = fixed.join("\n");
            content.push('\n');
            fs::write(&self.out_path, content)
                .map_err(|source| LockError::io(&self.out_path, source))?;
        }
        registry.register_packages(&self.name, mem::take(&mut self.packages))?;
        Ok(())
    }

    /// Normalize one logical line.
    ///
    /// Pins owned by an ancestor environment are dropped (`None`), after
    /// checking that the freshly resolved version agrees with the version
    /// the ancestor registered. Everything else is tracked, stripped of
    /// post-release suffixes per policy, and re-serialized.
    fn fix_pin(
        &mut self,
        line: &str,
        ignore: &IgnoredPackages,
        policy: &PinPolicy,
    ) -> Result<Option<String>, LockError> {
        match Dependency::parse(line) {
            ParsedLine::Pin(mut dep) => {
                if let Some(recorded) = ignore.get(&dep.package) {
                    // A recorded None disables conflict detection.
                    if let Some(pinned) = recorded {
                        if dep.version != *pinned {
                            return Err(LockError::VersionConflict {
                                package: dep.package,
                                pinned: pinned.clone(),
                                resolved: dep.version,
                            });
                        }
                    }
                    return Ok(None);
                }
                self.packages
                    .insert(dep.package.clone(), dep.version.clone());
                dep.drop_post(policy, &self.name);
                Ok(Some(dep.serialize(policy)))
            }
            ParsedLine::Passthrough(text) => Ok(Some(text)),
        }
    }

    /// Insert `-r` lines pointing at the lockfiles of direct ancestors.
    ///
    /// References land between the header and the body, sorted by
    /// environment name. No-op for an environment without references.
    ///
    /// # Errors
    ///
    /// Returns a [`LockError::Io`] if the lockfile cannot be rewritten.
    pub fn add_references(&self, options: &Options) -> Result<(), LockError> {
        if self.refs.is_empty() {
            return Ok(());
        }
        let mut names: Vec<_> = self.refs.iter().collect();
        names.sort();

        let text = fs::read_to_string(&self.out_path)
            .map_err(|source| LockError::io(&self.out_path, source))?;
        let (header, body) = split_header(&text);
        let mut content = header;
        for name in names {
            content.push_str(&format!("-r {}.{}\n", name, options.out_ext));
        }
        content.push_str(&body);
        fs::write(&self.out_path, content).map_err(|source| LockError::io(&self.out_path, source))
    }

    /// Replace the lockfile's leading comment block with `header_text`.
    ///
    /// # Errors
    ///
    /// Returns a [`LockError::Io`] if the lockfile cannot be rewritten.
    pub fn replace_header(&self, header_text: &str) -> Result<(), LockError> {
        let text = fs::read_to_string(&self.out_path)
            .map_err(|source| LockError::io(&self.out_path, source))?;
        let (_, body) = split_header(&text);
        let mut content = header_text.to_string();
        if !content.is_empty() && !content.ends_with('\n') {
            content.push('\n');
        }
        content.push_str(&body);
        fs::write(&self.out_path, content).map_err(|source| LockError::io(&self.out_path, source))
    }
}

/// Split a file into its leading comment header and the rest.
///
/// The header is the maximal run of `#`-prefixed lines from the top; the
/// first non-comment line ends it permanently, so comments appearing after
/// body content stay in the body. Read and write use this exact split.
pub fn split_header(text: &str) -> (String, String) {
    let mut boundary = 0;
    for line in text.split_inclusive('\n') {
        if line.starts_with('#') {
            boundary += line.len();
        } else {
            break;
        }
    }
    let (header, body) = text.split_at(boundary);
    (header.to_string(), body.to_string())
}

/// Join lines soft-wrapped with a trailing backslash into logical lines.
///
/// # Errors
///
/// Returns [`LockError::TrailingContinuation`] if the file ends mid-wrap.
pub fn concat_lines(text: &str, path: &Path) -> Result<Vec<String>, LockError> {
    let mut logical = Vec::new();
    let mut parts: Vec<String> = Vec::new();
    for line in text.lines() {
        let line = line.trim();
        if let Some(stripped) = line.strip_suffix('\\') {
            parts.push(stripped.trim_end().to_string());
        } else {
            parts.push(line.to_string());
            logical.push(parts.join(" "));
            parts.clear();
        }
    }
    if !parts.is_empty() {
        return Err(LockError::TrailingContinuation {
            path: path.to_path_buf(),
        });
    }
    Ok(logical)
}
