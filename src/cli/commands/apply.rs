//! apply command - Converge declared repositories
//!
//! Runs one reconciliation cycle per repository. Failures are reported
//! per repository and do not stop the rest; the command fails at the end
//! if any cycle failed.

use std::path::PathBuf;

use anyhow::{bail, Result};
use serde::Serialize;

use super::{load_desired, load_settings, process_runner, verbosity};
use crate::engine::{
    run_cycle, ActionTaken, Context, Engine, ObservedState, ReconciliationResult,
};
use crate::ui::output;

/// One line of the JSON report.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub(crate) enum CycleReport {
    Done(ReconciliationResult),
    Failed {
        resource: String,
        path: PathBuf,
        error: String,
        transient: bool,
    },
}

/// Converge every selected repository.
pub fn apply(ctx: &Context, paths: &[PathBuf], dry_run: bool, json: bool) -> Result<()> {
    let verbosity = verbosity(ctx);
    let settings = load_settings()?;
    let desired = load_desired(ctx, &settings, paths)?;

    let runner = process_runner();
    let engine = Engine::new(&runner, &settings);

    let mut reports = Vec::with_capacity(desired.len());
    let mut failures = 0;

    for repo in &desired {
        match run_cycle(&engine, repo, dry_run) {
            Ok(result) => {
                if !json {
                    output::print(describe(&result, dry_run), verbosity);
                    if dry_run && result.state == ObservedState::DirtyBlocked {
                        output::warn(
                            format!(
                                "{} has local changes; the reset will fail unless force is set",
                                result.resource
                            ),
                            verbosity,
                        );
                    }
                }
                reports.push(CycleReport::Done(result));
            }
            Err(err) => {
                failures += 1;
                if !json {
                    output::error(&err);
                }
                reports.push(CycleReport::Failed {
                    resource: repo.resource_name(),
                    path: repo.path.clone(),
                    error: err.to_string(),
                    transient: err.is_transient(),
                });
            }
        }
    }

    if json {
        output::json(&reports)?;
    } else if failures == 0 && !desired.is_empty() && !dry_run {
        output::success(
            format!("{} repositories converged", desired.len()),
            verbosity,
        );
    }

    if failures > 0 {
        bail!("{} of {} repositories failed", failures, desired.len());
    }
    Ok(())
}

fn describe(result: &ReconciliationResult, dry_run: bool) -> String {
    if result.in_sync {
        return format!("{}: in sync ({})", result.resource, result.reported_status);
    }
    if dry_run {
        return format!("{}: would {}", result.resource, result.planned);
    }
    match result.action_taken {
        ActionTaken::None => format!("{}: nothing to do", result.resource),
        taken => format!("{}: {}", result.resource, taken),
    }
}
