//! deps command - Print what each repository must wait for

use std::path::PathBuf;

use anyhow::Result;
use serde::Serialize;

use super::{load_desired, load_settings, verbosity};
use crate::core::desired::DependencyHints;
use crate::engine::Context;
use crate::ui::output;

#[derive(Debug, Serialize)]
struct DepsReport {
    resource: String,
    #[serde(flatten)]
    hints: DependencyHints,
}

/// Show dependency hints for every selected repository.
pub fn deps(ctx: &Context, paths: &[PathBuf], json: bool) -> Result<()> {
    let verbosity = verbosity(ctx);
    let settings = load_settings()?;
    let desired = load_desired(ctx, &settings, paths)?;

    if json {
        let reports: Vec<DepsReport> = desired
            .iter()
            .map(|d| DepsReport {
                resource: d.resource_name(),
                hints: d.dependency_hints(),
            })
            .collect();
        output::json(&reports)?;
        return Ok(());
    }

    for repo in &desired {
        let hints = repo.dependency_hints().to_string();
        let lines: Vec<&str> = hints.lines().collect();
        output::print(
            format!("{}\n{}", repo.resource_name(), output::format_list(&lines, "  ")),
            verbosity,
        );
    }
    Ok(())
}
