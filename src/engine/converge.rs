//! engine::converge
//!
//! The corrective actions and the engine that dispatches them.
//!
//! # Actions
//!
//! - [`Engine::create`]: clone the resolved source into the path
//! - [`Engine::destroy`]: remove the working copy; idempotent
//! - [`Engine::ensure_remote`]: rewrite origin when it points elsewhere
//! - [`Engine::ensure_revision`]: hard reset to the resolved target,
//!   refusing to discard local changes unless forced
//!
//! `ensure_remote` and `ensure_revision` clone first when the path holds
//! no working copy. When both are needed, the remote is fixed before the
//! revision is resolved, since resolution fetches from origin.

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

use serde::Serialize;

use super::inspect::inspect;
use super::plan::{plan, Action, Observation};
use super::revision::resolve_target;
use super::status::{insync, status_for, ReportedStatus};
use super::ConvergeError;
use crate::core::config::Settings;
use crate::core::desired::DesiredState;
use crate::core::types::Ensure;
use crate::git::{is_working_copy, CommandRunner, Git};

/// What a sync actually did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ActionTaken {
    None,
    Cloned,
    Destroyed,
    RemoteUpdated,
    RevisionReset,
}

impl ActionTaken {
    /// Combine the outcomes of two steps, keeping the more significant.
    pub fn merge(self, other: ActionTaken) -> ActionTaken {
        if other.rank() > self.rank() {
            other
        } else {
            self
        }
    }

    fn rank(self) -> u8 {
        match self {
            ActionTaken::None => 0,
            ActionTaken::Destroyed => 1,
            ActionTaken::RemoteUpdated => 2,
            ActionTaken::RevisionReset => 3,
            ActionTaken::Cloned => 4,
        }
    }
}

impl fmt::Display for ActionTaken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ActionTaken::None => "none",
            ActionTaken::Cloned => "cloned",
            ActionTaken::Destroyed => "destroyed",
            ActionTaken::RemoteUpdated => "remoteUpdated",
            ActionTaken::RevisionReset => "revisionReset",
        };
        f.write_str(s)
    }
}

/// The convergence engine.
///
/// Holds only explicit settings; every cycle inspects the working copy
/// afresh.
pub struct Engine<'a> {
    runner: &'a dyn CommandRunner,
    git_bin: PathBuf,
}

impl fmt::Debug for Engine<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Engine")
            .field("git_bin", &self.git_bin)
            .finish()
    }
}

impl<'a> Engine<'a> {
    /// Create an engine running git through `runner`.
    pub fn new(runner: &'a dyn CommandRunner, settings: &Settings) -> Self {
        Self {
            runner,
            git_bin: settings.git_bin.clone(),
        }
    }

    fn git(&self, desired: &DesiredState) -> Git<'a> {
        Git::new(
            self.runner,
            self.git_bin.clone(),
            desired.run_as_user.clone(),
        )
    }

    // =========================================================================
    // Query
    // =========================================================================

    /// Inspect the working copy and compare it with `desired`.
    ///
    /// The target revision is resolved, which fetches from origin, only
    /// when a revision is wanted and origin already points at the desired
    /// source.
    ///
    /// # Errors
    ///
    /// Returns `Inspect` if reading the working copy fails, and any
    /// revision resolution error.
    pub fn observe(&self, desired: &DesiredState) -> Result<Observation, ConvergeError> {
        let git = self.git(desired);
        let resource = desired.resource_name();

        let actual = inspect(&git, &desired.path).map_err(|source| ConvergeError::Inspect {
            resource: resource.clone(),
            source,
        })?;
        if !actual.exists {
            return Ok(Observation::absent());
        }

        let wanted = desired.resolved_source();
        let remote_matches = wanted.is_some() && actual.current_remote == wanted;

        let target = match &desired.ensure {
            Ensure::Revision(spec) if remote_matches => {
                Some(resolve_target(&git, &desired.path, spec, &resource)?)
            }
            _ => None,
        };

        Ok(Observation {
            actual,
            remote_matches,
            target,
        })
    }

    /// The status the scheduler compares against the desired `ensure`.
    pub fn query(&self, desired: &DesiredState) -> Result<ReportedStatus, ConvergeError> {
        Ok(status_for(&desired.ensure, &self.observe(desired)?))
    }

    /// Whether `status` satisfies `desired`.
    pub fn insync(&self, desired: &DesiredState, status: &ReportedStatus) -> bool {
        insync(&desired.ensure, status)
    }

    // =========================================================================
    // Sync
    // =========================================================================

    /// Observe, plan and apply one corrective action.
    pub fn sync(&self, desired: &DesiredState) -> Result<ActionTaken, ConvergeError> {
        let observation = self.observe(desired)?;
        self.apply(desired, plan(&desired.ensure, &observation))
    }

    /// Apply a planned action.
    pub fn apply(&self, desired: &DesiredState, action: Action) -> Result<ActionTaken, ConvergeError> {
        match action {
            Action::None => Ok(ActionTaken::None),
            Action::Clone => {
                let cloned = self.create(desired)?;
                if desired.ensure.is_revision() {
                    Ok(cloned.merge(self.ensure_revision(desired)?))
                } else {
                    Ok(cloned)
                }
            }
            Action::Destroy => self.destroy(desired),
            Action::UpdateRemote => self.ensure_remote(desired),
            Action::UpdateRemoteThenReset => {
                let remote = self.ensure_remote(desired)?;
                Ok(remote.merge(self.ensure_revision(desired)?))
            }
            Action::Reset => self.ensure_revision(desired),
        }
    }

    /// Clone the resolved source into the desired path.
    ///
    /// # Errors
    ///
    /// Returns `Clone` with the captured output if git fails.
    pub fn create(&self, desired: &DesiredState) -> Result<ActionTaken, ConvergeError> {
        let resource = desired.resource_name();
        let source = desired
            .resolved_source()
            .ok_or_else(|| ConvergeError::MissingSource {
                resource: resource.clone(),
            })?;

        self.git(desired)
            .clone_into(
                &source,
                &desired.path,
                &desired.clone_config,
                &desired.extra_clone_args,
            )
            .map_err(|source| ConvergeError::Clone {
                resource: resource.clone(),
                source,
            })?;

        tracing::info!(resource = %resource, source = %source, "cloned");
        Ok(ActionTaken::Cloned)
    }

    /// Remove the working copy. A missing path is not an error.
    pub fn destroy(&self, desired: &DesiredState) -> Result<ActionTaken, ConvergeError> {
        match remove_path(&desired.path) {
            Ok(true) => {
                tracing::info!(resource = %desired.resource_name(), "removed working copy");
                Ok(ActionTaken::Destroyed)
            }
            Ok(false) => Ok(ActionTaken::None),
            Err(source) => Err(ConvergeError::Destroy {
                resource: desired.resource_name(),
                path: desired.path.clone(),
                source,
            }),
        }
    }

    /// Point origin at the resolved source, cloning if nothing is there.
    pub fn ensure_remote(&self, desired: &DesiredState) -> Result<ActionTaken, ConvergeError> {
        let git = self.git(desired);
        let resource = desired.resource_name();

        if !is_working_copy(&desired.path) {
            return self.create(desired);
        }

        let wanted = desired
            .resolved_source()
            .ok_or_else(|| ConvergeError::MissingSource {
                resource: resource.clone(),
            })?;
        let current = git
            .remote_url(&desired.path)
            .map_err(|source| ConvergeError::Inspect {
                resource: resource.clone(),
                source,
            })?;

        if current.as_deref() == Some(wanted.as_str()) {
            return Ok(ActionTaken::None);
        }

        git.set_remote_url(&desired.path, &wanted, current.is_some())
            .map_err(|source| ConvergeError::RemoteUpdate {
                resource: resource.clone(),
                source,
            })?;

        let previous = current.as_deref().unwrap_or("(none)");
        tracing::info!(
            resource = %resource,
            "origin changed from {} to {}",
            previous,
            wanted
        );
        Ok(ActionTaken::RemoteUpdated)
    }

    /// Hard reset to the target revision, cloning if nothing is there.
    ///
    /// Does nothing unless `ensure` names a revision. Untracked files count
    /// as local changes, so a forced reset also removes them.
    ///
    /// # Errors
    ///
    /// - `DirtyTree` if there are local changes and `force_on_dirty` is
    ///   off; nothing is fetched or changed
    /// - any revision resolution error
    /// - `Reset` if the reset or the clean fails
    pub fn ensure_revision(&self, desired: &DesiredState) -> Result<ActionTaken, ConvergeError> {
        let Ensure::Revision(spec) = &desired.ensure else {
            return Ok(ActionTaken::None);
        };

        let git = self.git(desired);
        let resource = desired.resource_name();
        let path = desired.path.as_path();

        let mut taken = ActionTaken::None;
        if !is_working_copy(path) {
            taken = self.create(desired)?;
        }

        let changes = git
            .status_porcelain(path)
            .map_err(|source| ConvergeError::Inspect {
                resource: resource.clone(),
                source,
            })?;
        if !changes.is_empty() && !desired.force_on_dirty {
            return Err(ConvergeError::DirtyTree { resource, changes });
        }

        let target = resolve_target(&git, path, spec, &resource)?;

        if !changes.is_empty() {
            tracing::warn!(
                resource = %resource,
                changes = changes.len(),
                "discarding local changes"
            );
        }

        git.reset_hard(path, &target)
            .map_err(|source| ConvergeError::Reset {
                resource: resource.clone(),
                source,
            })?;
        if !changes.is_empty() {
            git.clean_untracked(path)
                .map_err(|source| ConvergeError::Reset {
                    resource: resource.clone(),
                    source,
                })?;
        }

        tracing::info!(resource = %resource, target = %spec, revision = %target.short(12), "reset");
        Ok(taken.merge(ActionTaken::RevisionReset))
    }
}

/// Remove `path` whatever it is. Returns whether anything was removed.
fn remove_path(path: &Path) -> io::Result<bool> {
    let metadata = match std::fs::symlink_metadata(path) {
        Ok(metadata) => metadata,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(false),
        Err(err) => return Err(err),
    };

    let result = if metadata.is_dir() {
        std::fs::remove_dir_all(path)
    } else {
        std::fs::remove_file(path)
    };

    match result {
        Ok(()) => Ok(true),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(err) => Err(err),
    }
}
