//! git::interface
//!
//! Git operations over the command runner.
//!
//! This module is the **single doorway** to git. Every read and write of a
//! working copy goes through [`Git`], which builds argument vectors, runs
//! them through a [`CommandRunner`], and normalizes results into strong
//! types.
//!
//! # Error Handling
//!
//! Expected "not found" exits (an unset config key, an unknown revision)
//! become `Ok(None)`. Everything else surfaces as a [`GitError`] carrying
//! the underlying [`CommandError`].
//!
//! # Example
//!
//! ```ignore
//! use reposync::git::{Git, ProcessRunner};
//! use std::path::Path;
//!
//! let runner = ProcessRunner::default();
//! let git = Git::new(&runner, "git", None);
//! let head = git.head_revision(Path::new("/opt/src/boxen"))?;
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use thiserror::Error;

use super::runner::{CommandError, CommandOutput, CommandRunner, RunOptions};
use crate::core::types::{Revision, TypeError};

/// Name of the remote the engine manages.
pub const REMOTE: &str = "origin";

/// Errors from git read operations.
#[derive(Debug, Error)]
pub enum GitError {
    /// The underlying command failed.
    #[error(transparent)]
    Command(#[from] CommandError),

    /// A command succeeded but printed something unexpected.
    #[error("unexpected output from git {operation}: {message}")]
    UnexpectedOutput {
        /// What was being read
        operation: String,
        /// Description of the problem
        message: String,
    },
}

impl GitError {
    fn unexpected(operation: &str, err: TypeError) -> Self {
        GitError::UnexpectedOutput {
            operation: operation.to_string(),
            message: err.to_string(),
        }
    }
}

/// Whether `path` holds a working copy: a directory containing a `.git`
/// directory.
pub fn is_working_copy(path: &Path) -> bool {
    path.is_dir() && path.join(".git").is_dir()
}

/// The git interface.
///
/// Borrows a runner and carries the executable and identity every
/// command uses.
pub struct Git<'a> {
    runner: &'a dyn CommandRunner,
    git_bin: PathBuf,
    run_as: Option<String>,
}

impl std::fmt::Debug for Git<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Git")
            .field("git_bin", &self.git_bin)
            .field("run_as", &self.run_as)
            .finish()
    }
}

impl<'a> Git<'a> {
    /// Create a git interface.
    pub fn new(
        runner: &'a dyn CommandRunner,
        git_bin: impl Into<PathBuf>,
        run_as: Option<String>,
    ) -> Self {
        Self {
            runner,
            git_bin: git_bin.into(),
            run_as,
        }
    }

    // =========================================================================
    // Plumbing
    // =========================================================================

    fn argv(&self, args: &[&str]) -> Vec<String> {
        let mut argv = Vec::with_capacity(args.len() + 1);
        argv.push(self.git_bin.to_string_lossy().into_owned());
        argv.extend(args.iter().map(|a| a.to_string()));
        argv
    }

    fn run_in(&self, dir: &Path, args: &[&str]) -> Result<CommandOutput, CommandError> {
        let options = RunOptions::in_dir(dir).as_user(self.run_as.clone());
        self.runner.run(&self.argv(args), &options)
    }

    /// Run a query whose exit code 1 means "nothing there".
    fn query_in(&self, dir: &Path, args: &[&str]) -> Result<Option<String>, GitError> {
        match self.run_in(dir, args) {
            Ok(out) => {
                let value = out.stdout.trim();
                Ok((!value.is_empty()).then(|| value.to_string()))
            }
            Err(err) if err.exit_code() == Some(1) => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// The configured URL of the managed remote, if any.
    pub fn remote_url(&self, path: &Path) -> Result<Option<String>, GitError> {
        let key = format!("remote.{}.url", REMOTE);
        self.query_in(path, &["config", "--get", &key])
    }

    /// The commit HEAD points at, or `None` for an unborn branch.
    pub fn head_revision(&self, path: &Path) -> Result<Option<Revision>, GitError> {
        self.rev_parse_commit(path, "HEAD")
    }

    /// Resolve `spec` to a commit, or `None` if nothing matches.
    pub fn rev_parse_commit(&self, path: &Path, spec: &str) -> Result<Option<Revision>, GitError> {
        let peeled = format!("{}^{{commit}}", spec);
        self.query_in(path, &["rev-parse", "--verify", "--quiet", &peeled])?
            .map(|id| Revision::new(id).map_err(|e| GitError::unexpected("rev-parse", e)))
            .transpose()
    }

    /// Porcelain status lines; empty means a clean tree.
    ///
    /// Untracked files count as changes.
    pub fn status_porcelain(&self, path: &Path) -> Result<Vec<String>, GitError> {
        let out = self.run_in(path, &["status", "--porcelain", "--untracked-files=normal"])?;
        Ok(out
            .stdout
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(str::to_string)
            .collect())
    }

    // =========================================================================
    // Remote-tracking refresh
    // =========================================================================

    /// Fetch branches and tags from the managed remote.
    pub fn fetch(&self, path: &Path) -> Result<(), CommandError> {
        self.run_in(path, &["fetch", "--prune", "--tags", "--force", REMOTE])
            .map(|_| ())
    }

    /// Recreate `refs/remotes/origin/HEAD` from the remote's default branch.
    pub fn set_remote_head_auto(&self, path: &Path) -> Result<(), CommandError> {
        self.run_in(path, &["remote", "set-head", REMOTE, "--auto"])
            .map(|_| ())
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// The argument vector for cloning `source` into `path`.
    ///
    /// Order: `-c key=value` overrides, extra tokens, source, path.
    pub fn clone_argv(
        &self,
        source: &str,
        path: &Path,
        config: &BTreeMap<String, String>,
        extra: &[String],
    ) -> Vec<String> {
        let mut argv = self.argv(&["clone"]);
        for (key, value) in config {
            argv.push("-c".to_string());
            argv.push(format!("{}={}", key, value));
        }
        argv.extend(extra.iter().cloned());
        argv.push(source.to_string());
        argv.push(path.to_string_lossy().into_owned());
        argv
    }

    /// Clone `source` into `path`. Runs without a working directory since
    /// the clone creates it.
    pub fn clone_into(
        &self,
        source: &str,
        path: &Path,
        config: &BTreeMap<String, String>,
        extra: &[String],
    ) -> Result<CommandOutput, CommandError> {
        let options = RunOptions::default().as_user(self.run_as.clone());
        self.runner
            .run(&self.clone_argv(source, path, config, extra), &options)
    }

    /// Point the managed remote at `url`, adding it if it does not exist.
    pub fn set_remote_url(&self, path: &Path, url: &str, exists: bool) -> Result<(), CommandError> {
        let verb = if exists { "set-url" } else { "add" };
        self.run_in(path, &["remote", verb, REMOTE, url]).map(|_| ())
    }

    /// Move HEAD, index and working tree to `revision`, discarding changes
    /// to tracked files.
    pub fn reset_hard(&self, path: &Path, revision: &Revision) -> Result<(), CommandError> {
        self.run_in(path, &["reset", "--hard", "--quiet", revision.as_str()])
            .map(|_| ())
    }

    /// Delete untracked files and directories. Ignored files stay.
    pub fn clean_untracked(&self, path: &Path) -> Result<(), CommandError> {
        self.run_in(path, &["clean", "-fd", "--quiet"]).map(|_| ())
    }
}
