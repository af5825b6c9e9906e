//! engine::plan
//!
//! The reconciliation transition table.
//!
//! # Architecture
//!
//! [`plan`] is the single source of truth for what a cycle does. Given
//! the desired `ensure` and an [`Observation`] of the working copy, it
//! picks exactly one [`Action`]:
//!
//! | Actual                               | Desired  | Action                   |
//! |--------------------------------------|----------|--------------------------|
//! | absent                               | absent   | none                     |
//! | absent                               | present  | clone                    |
//! | absent                               | revision | clone (then reset)       |
//! | exists, remote mismatch              | present  | update remote            |
//! | exists, remote mismatch              | revision | update remote then reset |
//! | exists, remote ok, revision mismatch | revision | reset                    |
//! | exists, remote ok, revision ok       | revision | none                     |
//! | exists, remote ok                    | present  | none                     |
//! | exists                               | absent   | destroy                  |
//!
//! # Invariants
//!
//! - Planning does not perform I/O
//! - Planning is deterministic

use std::fmt;

use serde::Serialize;

use super::inspect::ActualState;
use crate::core::types::{Ensure, Revision};

/// Inspection results compared against desired state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Observation {
    /// What is on disk
    pub actual: ActualState,
    /// Whether origin equals the resolved desired source
    pub remote_matches: bool,
    /// Resolved target revision; only looked up once the remote matches
    pub target: Option<Revision>,
}

impl Observation {
    /// An observation of a path with no working copy.
    pub fn absent() -> Self {
        Self {
            actual: ActualState::absent(),
            remote_matches: false,
            target: None,
        }
    }

    /// Whether HEAD equals the resolved target. `None` if no target was
    /// resolved.
    pub fn revision_matches(&self) -> Option<bool> {
        self.target
            .as_ref()
            .map(|target| self.actual.current_revision.as_ref() == Some(target))
    }
}

/// The corrective action for one cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Action {
    None,
    Clone,
    Destroy,
    UpdateRemote,
    UpdateRemoteThenReset,
    Reset,
}

impl Action {
    /// Whether the action changes anything on disk.
    pub fn is_mutating(&self) -> bool {
        !matches!(self, Action::None)
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Action::None => "none",
            Action::Clone => "clone",
            Action::Destroy => "destroy",
            Action::UpdateRemote => "update remote",
            Action::UpdateRemoteThenReset => "update remote, then reset to target",
            Action::Reset => "fetch and hard reset to target",
        };
        f.write_str(s)
    }
}

/// Pick the action that converges `observation` onto `ensure`.
pub fn plan(ensure: &Ensure, observation: &Observation) -> Action {
    if !observation.actual.exists {
        return match ensure {
            Ensure::Absent => Action::None,
            Ensure::Present | Ensure::Revision(_) => Action::Clone,
        };
    }

    match ensure {
        Ensure::Absent => Action::Destroy,
        Ensure::Present if observation.remote_matches => Action::None,
        Ensure::Present => Action::UpdateRemote,
        Ensure::Revision(_) if !observation.remote_matches => Action::UpdateRemoteThenReset,
        Ensure::Revision(_) => match observation.revision_matches() {
            Some(true) => Action::None,
            _ => Action::Reset,
        },
    }
}

/// The state of the managed resource, as observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ObservedState {
    /// No working copy
    Absent,
    /// A working copy whose remote and revision were not checked
    PresentUntracked,
    /// Satisfies the desired state
    InSync,
    /// Origin points somewhere else
    OutOfSyncRemote,
    /// HEAD is not the target revision
    OutOfSyncRevision,
    /// Revision differs but local changes may not be discarded
    DirtyBlocked,
}

impl fmt::Display for ObservedState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ObservedState::Absent => "absent",
            ObservedState::PresentUntracked => "present (unverified)",
            ObservedState::InSync => "in sync",
            ObservedState::OutOfSyncRemote => "remote out of sync",
            ObservedState::OutOfSyncRevision => "revision out of sync",
            ObservedState::DirtyBlocked => "blocked by local changes",
        };
        f.write_str(s)
    }
}

/// Classify an observation for reporting.
pub fn classify(ensure: &Ensure, force_on_dirty: bool, observation: &Observation) -> ObservedState {
    if !observation.actual.exists {
        return ObservedState::Absent;
    }

    match ensure {
        Ensure::Absent => ObservedState::PresentUntracked,
        _ if !observation.remote_matches => ObservedState::OutOfSyncRemote,
        Ensure::Present => ObservedState::InSync,
        Ensure::Revision(_) => match observation.revision_matches() {
            Some(true) => ObservedState::InSync,
            Some(false) if !observation.actual.is_clean() && !force_on_dirty => {
                ObservedState::DirtyBlocked
            }
            Some(false) => ObservedState::OutOfSyncRevision,
            None => ObservedState::PresentUntracked,
        },
    }
}
