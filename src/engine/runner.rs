//! engine::runner
//!
//! One full reconciliation cycle for one repository.
//!
//! # Architecture
//!
//! ```text
//! Observe -> Query -> InSync? -> Plan -> [Apply] -> Return
//! ```
//!
//! The working copy is observed once; query, insync and plan all read
//! that single observation. In dry-run mode the planned action is
//! reported and nothing is applied.

use std::path::PathBuf;

use serde::Serialize;

use super::converge::{ActionTaken, Engine};
use super::plan::{classify, plan, Action, ObservedState};
use super::status::{insync, status_for, ReportedStatus};
use super::ConvergeError;
use crate::core::desired::DesiredState;

/// The outcome of one cycle, handed back to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReconciliationResult {
    /// e.g. `Repository[/opt/src/boxen]`
    pub resource: String,
    pub path: PathBuf,
    /// Status as reported before any action
    pub reported_status: ReportedStatus,
    pub in_sync: bool,
    pub state: ObservedState,
    pub planned: Action,
    pub action_taken: ActionTaken,
}

/// Run one cycle: query, compare, and correct unless in sync.
///
/// # Errors
///
/// Any observation or action failure. Nothing has been mutated when an
/// observation fails.
pub fn run_cycle(
    engine: &Engine<'_>,
    desired: &DesiredState,
    dry_run: bool,
) -> Result<ReconciliationResult, ConvergeError> {
    let resource = desired.resource_name();
    let observation = engine.observe(desired)?;

    let reported_status = status_for(&desired.ensure, &observation);
    let in_sync = insync(&desired.ensure, &reported_status);
    let state = classify(&desired.ensure, desired.force_on_dirty, &observation);
    let planned = if in_sync {
        Action::None
    } else {
        plan(&desired.ensure, &observation)
    };

    tracing::debug!(
        resource = %resource,
        status = %reported_status,
        in_sync,
        planned = %planned,
        "observed"
    );

    let action_taken = if dry_run {
        ActionTaken::None
    } else {
        engine.apply(desired, planned)?
    };

    Ok(ReconciliationResult {
        resource,
        path: desired.path.clone(),
        reported_status,
        in_sync,
        state,
        planned,
        action_taken,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::{RepositoryDecl, Settings};
    use crate::core::types::Ensure;
    use crate::git::mock::MockRunner;
    use tempfile::TempDir;

    fn desired(path: PathBuf, ensure: Ensure) -> DesiredState {
        let mut decl = RepositoryDecl::new(path, "boxen/boxen");
        decl.ensure = ensure;
        DesiredState::from_decl(&decl, &Settings::default()).unwrap()
    }

    #[test]
    fn absent_and_wanted_absent_is_in_sync() {
        let temp = TempDir::new().unwrap();
        let runner = MockRunner::new();
        let engine = Engine::new(&runner, &Settings::default());

        let result = run_cycle(&engine, &desired(temp.path().join("x"), Ensure::Absent), false)
            .unwrap();
        assert!(result.in_sync);
        assert_eq!(result.reported_status, ReportedStatus::Absent);
        assert_eq!(result.planned, Action::None);
        assert_eq!(result.action_taken, ActionTaken::None);
        assert_eq!(result.state, ObservedState::Absent);
    }

    #[test]
    fn missing_copy_is_cloned() {
        let temp = TempDir::new().unwrap();
        let runner = MockRunner::new();
        let engine = Engine::new(&runner, &Settings::default());

        let result = run_cycle(&engine, &desired(temp.path().join("x"), Ensure::Present), false)
            .unwrap();
        assert!(!result.in_sync);
        assert_eq!(result.planned, Action::Clone);
        assert_eq!(result.action_taken, ActionTaken::Cloned);
        assert_eq!(runner.subcommands(), vec!["clone"]);
    }

    #[test]
    fn dry_run_plans_without_acting() {
        let temp = TempDir::new().unwrap();
        let runner = MockRunner::new();
        let engine = Engine::new(&runner, &Settings::default());

        let result = run_cycle(&engine, &desired(temp.path().join("x"), Ensure::Present), true)
            .unwrap();
        assert_eq!(result.planned, Action::Clone);
        assert_eq!(result.action_taken, ActionTaken::None);
        assert!(runner.calls().is_empty());
    }

    #[test]
    fn serializes_for_json_output() {
        let temp = TempDir::new().unwrap();
        let runner = MockRunner::new();
        let engine = Engine::new(&runner, &Settings::default());

        let result = run_cycle(&engine, &desired(temp.path().join("x"), Ensure::Absent), true)
            .unwrap();
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["reported_status"], "absent");
        assert_eq!(json["planned"], "none");
        assert_eq!(json["action_taken"], "none");
        assert_eq!(json["state"], "absent");
    }
}
