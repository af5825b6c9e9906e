//! engine::inspect
//!
//! Reads the current state of a working copy.
//!
//! # Invariants
//!
//! - Inspection is read-only
//! - No command is run against a path that is not a working copy
//! - State is computed fresh on every call and never cached

use std::path::Path;

use serde::Serialize;

use crate::core::types::Revision;
use crate::git::{is_working_copy, Git, GitError};

/// What is on disk at a managed path.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ActualState {
    /// A directory containing a `.git` directory
    pub exists: bool,
    /// Configured origin URL; `None` if absent or unset
    pub current_remote: Option<String>,
    /// Resolved HEAD; `None` if absent or unborn
    pub current_revision: Option<Revision>,
    /// Pending local changes, one porcelain status line each
    pub changes: Vec<String>,
}

impl ActualState {
    /// The state of a path with no working copy.
    pub fn absent() -> Self {
        Self::default()
    }

    /// Whether the working tree has no pending changes. Meaningless when
    /// the working copy does not exist.
    pub fn is_clean(&self) -> bool {
        self.changes.is_empty()
    }
}

/// Inspect the working copy at `path`.
///
/// # Errors
///
/// Returns an error if a git read fails on an existing working copy.
pub fn inspect(git: &Git<'_>, path: &Path) -> Result<ActualState, GitError> {
    if !is_working_copy(path) {
        return Ok(ActualState::absent());
    }

    Ok(ActualState {
        exists: true,
        current_remote: git.remote_url(path)?,
        current_revision: git.head_revision(path)?,
        changes: git.status_porcelain(path)?,
    })
}
