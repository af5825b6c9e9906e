//! status command - Report repository state without changing it
//!
//! Runs query and insync for each repository. Revision targets refresh
//! remote-tracking refs so they can be resolved; the working tree, index
//! and HEAD are never touched.

use std::path::PathBuf;

use anyhow::{bail, Result};

use super::apply::CycleReport;
use super::{load_desired, load_settings, process_runner, verbosity};
use crate::engine::{run_cycle, Action, Context, Engine, ReconciliationResult};
use crate::ui::output;

/// Show the status of every selected repository.
pub fn status(ctx: &Context, paths: &[PathBuf], json: bool) -> Result<()> {
    let verbosity = verbosity(ctx);
    let settings = load_settings()?;
    let desired = load_desired(ctx, &settings, paths)?;

    let runner = process_runner();
    let engine = Engine::new(&runner, &settings);

    let mut reports = Vec::with_capacity(desired.len());
    let mut failures = 0;

    for repo in &desired {
        match run_cycle(&engine, repo, true) {
            Ok(result) => {
                if !json {
                    output::print(describe(&result), verbosity);
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
    }

    if failures > 0 {
        bail!("{} of {} repositories could not be inspected", failures, desired.len());
    }
    Ok(())
}

fn describe(result: &ReconciliationResult) -> String {
    if result.in_sync {
        return format!("{}: {} (in sync)", result.resource, result.reported_status);
    }
    let mut line = format!(
        "{}: {} [{}]",
        result.resource, result.reported_status, result.state
    );
    if result.planned != Action::None {
        line.push_str(&format!(", needs {}", result.planned));
    }
    line
}
