//! cli::commands::verify_cmd
//!
//! The `verify` command: check lockfile fingerprints.

use anyhow::{bail, Result};

use crate::core::config::Options;
use crate::engine::verify::verify_environments;
use crate::engine::Context;
use crate::ui::output;

/// Check every lockfile against its input file and report per environment.
///
/// All environments are checked before the overall status is decided.
pub fn verify(options: &Options, ctx: &Context) -> Result<()> {
    let result = verify_environments(options)?;
    for report in &result.reports {
        if report.ok {
            output::print(
                format!(
                    "OK - {} was compiled from {}",
                    report.out_path.display(),
                    report.in_path.display()
                ),
                ctx.verbosity,
            );
        } else {
            let detail = report.detail.as_deref().unwrap_or("fingerprint mismatch");
            output::error(format!("{}: {}", report.env, detail));
        }
    }
    if !result.ok() {
        bail!("some lockfiles are out of date; re-run 'mlk' to regenerate them");
    }
    Ok(())
}
