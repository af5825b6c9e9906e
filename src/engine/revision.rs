//! engine::revision
//!
//! Maps a symbolic revision specifier to a concrete commit.
//!
//! # Resolution Order
//!
//! After refreshing remote-tracking refs from origin:
//! 1. `latest` / `default` resolve to `refs/remotes/origin/HEAD`, which
//!    is re-read from the remote every time since fetch never moves it
//! 2. Otherwise `refs/remotes/origin/<spec>` is tried first, so a branch
//!    name tracks the remote tip and never a stale local branch
//! 3. Finally `<spec>` itself: tags, commit ids, any rev expression
//!
//! Retries are the caller's business; a failed fetch is reported as
//! transient and nothing else is attempted.

use std::path::Path;

use crate::core::types::Revision;
use crate::git::{Git, REMOTE};

use super::ConvergeError;

/// Specifiers that mean "the remote's default branch".
pub const DEFAULT_BRANCH_ALIASES: [&str; 2] = ["latest", "default"];

/// Fetch from origin, then resolve `spec` to a commit.
///
/// # Errors
///
/// - `TransientFetch` if the fetch fails
/// - `RevisionResolution` if nothing matches `spec`
/// - `Inspect` if a lookup fails for any other reason
pub fn resolve_target(
    git: &Git<'_>,
    path: &Path,
    spec: &str,
    resource: &str,
) -> Result<Revision, ConvergeError> {
    git.fetch(path)
        .map_err(|source| ConvergeError::TransientFetch {
            resource: resource.to_string(),
            source,
        })?;

    let found = if DEFAULT_BRANCH_ALIASES.contains(&spec) {
        resolve_default_branch(git, path, resource)?
    } else {
        let remote_branch = format!("refs/remotes/{}/{}", REMOTE, spec);
        match lookup(git, path, &remote_branch, resource)? {
            Some(rev) => Some(rev),
            None => lookup(git, path, spec, resource)?,
        }
    };

    found.ok_or_else(|| ConvergeError::RevisionResolution {
        resource: resource.to_string(),
        target: spec.to_string(),
    })
}

fn resolve_default_branch(
    git: &Git<'_>,
    path: &Path,
    resource: &str,
) -> Result<Option<Revision>, ConvergeError> {
    tracing::debug!(resource, "refreshing origin/HEAD from the remote");
    git.set_remote_head_auto(path)
        .map_err(|source| ConvergeError::TransientFetch {
            resource: resource.to_string(),
            source,
        })?;
    let head_ref = format!("refs/remotes/{}/HEAD", REMOTE);
    lookup(git, path, &head_ref, resource)
}

fn lookup(
    git: &Git<'_>,
    path: &Path,
    spec: &str,
    resource: &str,
) -> Result<Option<Revision>, ConvergeError> {
    git.rev_parse_commit(path, spec)
        .map_err(|source| ConvergeError::Inspect {
            resource: resource.to_string(),
            source,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::git::mock::MockRunner;

    const SHA: &str = "fedcba9876543210fedcba9876543210fedcba98";
    const RESOURCE: &str = "Repository[/repo]";

    fn resolve(runner: &MockRunner, spec: &str) -> Result<Revision, ConvergeError> {
        let git = Git::new(runner, "git", None);
        resolve_target(&git, Path::new("/repo"), spec, RESOURCE)
    }

    #[test]
    fn branch_resolves_against_remote_first() {
        let runner = MockRunner::new();
        runner.push_ok(""); // fetch
        runner.push_ok(format!("{SHA}\n"));

        let rev = resolve(&runner, "main").unwrap();
        assert_eq!(rev.as_str(), SHA);

        let calls = runner.calls();
        assert_eq!(calls[0].args()[0], "fetch");
        assert_eq!(
            calls[1].args(),
            ["rev-parse", "--verify", "--quiet", "refs/remotes/origin/main^{commit}"]
        );
        assert_eq!(calls.len(), 2);
    }

    #[test]
    fn falls_back_to_plain_spec() {
        let runner = MockRunner::new();
        runner.push_ok(""); // fetch
        runner.push_failure(1, ""); // not a remote branch
        runner.push_ok(format!("{SHA}\n"));

        let rev = resolve(&runner, "v1.0.0").unwrap();
        assert_eq!(rev.as_str(), SHA);
        assert_eq!(
            runner.calls()[2].args(),
            ["rev-parse", "--verify", "--quiet", "v1.0.0^{commit}"]
        );
    }

    #[test]
    fn unknown_spec_is_resolution_error() {
        let runner = MockRunner::new();
        runner.push_ok("");
        runner.push_failure(1, "");
        runner.push_failure(1, "");

        let err = resolve(&runner, "nope").unwrap_err();
        assert!(matches!(
            err,
            ConvergeError::RevisionResolution { ref target, .. } if target == "nope"
        ));
    }

    #[test]
    fn fetch_failure_is_transient() {
        let runner = MockRunner::new();
        runner.push_failure(128, "fatal: unable to access remote");

        let err = resolve(&runner, "main").unwrap_err();
        assert!(err.is_transient());
        assert_eq!(runner.calls().len(), 1);
    }

    #[test]
    fn latest_refreshes_origin_head_first() {
        let runner = MockRunner::new();
        runner.push_ok(""); // fetch
        runner.push_ok(""); // remote set-head --auto
        runner.push_ok(format!("{SHA}\n"));

        assert_eq!(resolve(&runner, "latest").unwrap().as_str(), SHA);
        let calls = runner.calls();
        assert_eq!(calls[1].args(), ["remote", "set-head", "origin", "--auto"]);
        assert_eq!(
            calls[2].args(),
            ["rev-parse", "--verify", "--quiet", "refs/remotes/origin/HEAD^{commit}"]
        );
    }

    #[test]
    fn default_is_an_alias_for_latest() {
        let runner = MockRunner::new();
        runner.push_ok("");
        runner.push_ok("");
        runner.push_ok(format!("{SHA}\n"));

        assert_eq!(resolve(&runner, "default").unwrap().as_str(), SHA);
        assert_eq!(runner.subcommands(), vec!["fetch", "remote", "rev-parse"]);
    }

    #[test]
    fn set_head_failure_is_transient() {
        let runner = MockRunner::new();
        runner.push_ok("");
        runner.push_failure(128, "fatal: could not read from remote");

        let err = resolve(&runner, "latest").unwrap_err();
        assert!(err.is_transient());
        assert_eq!(runner.calls().len(), 2);
    }
}
