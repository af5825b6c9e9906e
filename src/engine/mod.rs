//! engine
//!
//! Converges a working copy onto its desired state.
//!
//! # Architecture
//!
//! One reconciliation cycle follows the scheduler protocol:
//!
//! ```text
//! Observe -> Query -> InSync? -> [Plan -> Sync]
//! ```
//!
//! 1. **Observe**: [`inspect`] reads the working copy; [`revision`]
//!    resolves the target commit when one is wanted
//! 2. **Query**: [`status`] reduces the observation to a reported value
//! 3. **InSync**: [`status::insync`] compares the reported value with the
//!    desired `ensure`
//! 4. **Plan**: [`plan::plan`] picks exactly one corrective action
//! 5. **Sync**: [`converge::Engine`] applies it through the git interface
//!
//! # Invariants
//!
//! - Actual state is recomputed on every cycle and never cached
//! - At most one mutating git command per action, plus the fetch that
//!   precedes a reset
//! - Local modifications are discarded only when `force_on_dirty` is set
//! - A failing cycle leaves other repositories unaffected
//!
//! # Example
//!
//! ```ignore
//! use reposync::engine::{converge::Engine, runner::run_cycle};
//! use reposync::git::ProcessRunner;
//!
//! let runner = ProcessRunner::new(std::env::var("USER").ok());
//! let engine = Engine::new(&runner, &settings);
//! let result = run_cycle(&engine, &desired, false)?;
//! println!("{}: {}", result.resource, result.reported_status);
//! ```

pub mod converge;
pub mod inspect;
pub mod plan;
pub mod revision;
pub mod runner;
pub mod status;

pub use converge::{ActionTaken, Engine};
pub use inspect::{inspect, ActualState};
pub use plan::{classify, plan, Action, Observation, ObservedState};
pub use runner::{run_cycle, ReconciliationResult};
pub use status::{insync, ReportedStatus};

use std::path::PathBuf;

use thiserror::Error;

use crate::git::{CommandError, GitError};

/// Execution context for commands.
///
/// Contains global settings derived from CLI flags that affect command behavior.
#[derive(Debug, Clone, Default)]
pub struct Context {
    /// Working directory override.
    pub cwd: Option<PathBuf>,
    /// Manifest path override.
    pub manifest: Option<PathBuf>,
    /// Debug logging enabled.
    pub debug: bool,
    /// Quiet mode (minimal output).
    pub quiet: bool,
}

/// Errors from a reconciliation cycle.
///
/// Every variant names the resource it concerns.
#[derive(Debug, Error)]
pub enum ConvergeError {
    /// Cloning failed; the path may hold a partial checkout.
    #[error("{resource}: clone failed: {source}")]
    Clone {
        resource: String,
        source: CommandError,
    },

    /// Fetching from origin failed; worth retrying on a later cycle.
    #[error("{resource}: fetch from origin failed: {source}")]
    TransientFetch {
        resource: String,
        source: CommandError,
    },

    /// The target revision matches nothing on origin or locally.
    #[error("{resource}: cannot resolve revision '{target}'")]
    RevisionResolution { resource: String, target: String },

    /// Local changes block a revision change.
    #[error(
        "{resource} has local changes ({}); set force to discard them",
        summarize_changes(.changes)
    )]
    DirtyTree {
        resource: String,
        changes: Vec<String>,
    },

    /// Reading the working copy failed.
    #[error("{resource}: {source}")]
    Inspect {
        resource: String,
        source: GitError,
    },

    /// Rewriting the origin URL failed.
    #[error("{resource}: updating origin failed: {source}")]
    RemoteUpdate {
        resource: String,
        source: CommandError,
    },

    /// Resetting to the target revision failed.
    #[error("{resource}: reset failed: {source}")]
    Reset {
        resource: String,
        source: CommandError,
    },

    /// Removing the working copy failed.
    #[error("{resource}: cannot remove {}: {source}", .path.display())]
    Destroy {
        resource: String,
        path: PathBuf,
        source: std::io::Error,
    },

    /// An action needed a source but the desired state has none.
    #[error("You must specify a source for {resource}")]
    MissingSource { resource: String },
}

impl ConvergeError {
    /// Whether a later cycle may succeed without any change to the
    /// desired state.
    pub fn is_transient(&self) -> bool {
        matches!(self, ConvergeError::TransientFetch { .. })
    }

    /// The resource the error concerns.
    pub fn resource(&self) -> &str {
        match self {
            ConvergeError::Clone { resource, .. }
            | ConvergeError::TransientFetch { resource, .. }
            | ConvergeError::RevisionResolution { resource, .. }
            | ConvergeError::DirtyTree { resource, .. }
            | ConvergeError::Inspect { resource, .. }
            | ConvergeError::RemoteUpdate { resource, .. }
            | ConvergeError::Reset { resource, .. }
            | ConvergeError::Destroy { resource, .. }
            | ConvergeError::MissingSource { resource } => resource,
        }
    }
}

fn summarize_changes(changes: &[String]) -> String {
    match changes.len() {
        1 => "1 change".to_string(),
        n => format!("{} changes", n),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod converge_error {
        use super::*;

        fn failed() -> CommandError {
            CommandError::Failed {
                command: "git fetch".into(),
                exit_code: Some(128),
                output: "fatal: unable to access".into(),
            }
        }

        #[test]
        fn only_fetch_is_transient() {
            let fetch = ConvergeError::TransientFetch {
                resource: "Repository[/a]".into(),
                source: failed(),
            };
            assert!(fetch.is_transient());

            let reset = ConvergeError::Reset {
                resource: "Repository[/a]".into(),
                source: failed(),
            };
            assert!(!reset.is_transient());
        }

        #[test]
        fn dirty_message_suggests_force() {
            let err = ConvergeError::DirtyTree {
                resource: "Repository[/a]".into(),
                changes: vec![" M a".into(), "?? b".into()],
            };
            let msg = err.to_string();
            assert!(msg.starts_with("Repository[/a] has local changes (2 changes)"));
            assert!(msg.contains("force"));
        }

        #[test]
        fn resource_accessor() {
            let err = ConvergeError::RevisionResolution {
                resource: "Repository[/b]".into(),
                target: "nope".into(),
            };
            assert_eq!(err.resource(), "Repository[/b]");
            assert!(err.to_string().contains("'nope'"));
        }
    }

    #[test]
    fn context_defaults() {
        let ctx = Context::default();
        assert!(ctx.cwd.is_none());
        assert!(ctx.manifest.is_none());
        assert!(!ctx.debug);
        assert!(!ctx.quiet);
    }
}
