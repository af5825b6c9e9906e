//! git
//!
//! Single interface for all git operations.
//!
//! # Architecture
//!
//! This module is the **ONLY doorway** to git. Everything the engine
//! learns about a working copy, and every change it makes to one, flows
//! through [`Git`]. Git is driven through its command line via a
//! [`CommandRunner`], so the engine can be exercised against a
//! [`MockRunner`](mock::MockRunner) without touching the filesystem.
//!
//! # Responsibilities
//!
//! - Working-copy detection
//! - Reads: origin URL, HEAD revision, status, revision lookup
//! - Remote-tracking refresh (fetch)
//! - Mutations: clone, remote rewrite, hard reset
//!
//! # Invariants
//!
//! - Commands are argument vectors, never shell strings
//! - Every command runs with the configured git binary and identity
//! - All revisions returned are strong [`Revision`](crate::core::types::Revision)s

mod interface;
pub mod mock;
mod runner;

pub use interface::{is_working_copy, Git, GitError, REMOTE};
pub use runner::{
    render_command, shell_quote, CommandError, CommandOutput, CommandRunner, ProcessRunner,
    RunOptions,
};
