//! cli::commands::lock
//!
//! The default command: lock every environment.

use anyhow::{Context as _, Result};

use crate::core::config::Options;
use crate::engine::resolver::SubprocessResolver;
use crate::engine::{lock_all, Context};
use crate::ui::output;

/// Lock all discovered environments in topological order.
pub fn lock(options: &Options, ctx: &Context) -> Result<()> {
    let resolver = SubprocessResolver;
    let recompiled = lock_all(options, &resolver, ctx)
        .with_context(|| format!("failed to lock '{}'", options.base_dir.display()))?;

    if recompiled.is_empty() {
        output::print("All lockfiles are up to date", ctx.verbosity);
    } else {
        output::print(
            format!("Recompiled: {}", recompiled.join(", ")),
            ctx.verbosity,
        );
    }
    Ok(())
}
