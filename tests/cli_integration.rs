//! Integration tests for the reposync binary.
//!
//! These tests exercise the full CLI against real git repositories.
//! Each test points `REPOSYNC_CONFIG` at its own config file so the
//! invoking user's configuration never leaks in.

use std::path::{Path, PathBuf};
use std::process::Command as StdCommand;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

/// A temp directory with a global config file and a manifest.
struct Sandbox {
    dir: TempDir,
}

impl Sandbox {
    fn new(config: &str) -> Self {
        let dir = TempDir::new().expect("failed to create temp dir");
        std::fs::write(dir.path().join("config.toml"), config).unwrap();
        Self { dir }
    }

    fn path(&self) -> &Path {
        self.dir.path()
    }

    fn join(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    fn write_manifest(&self, body: &str) {
        std::fs::write(self.join("reposync.toml"), body).unwrap();
    }

    /// The binary, run from the sandbox with its config.
    fn reposync(&self) -> Command {
        let mut cmd = Command::cargo_bin("reposync").unwrap();
        cmd.current_dir(self.path())
            .env("REPOSYNC_CONFIG", self.join("config.toml"))
            .env_remove("RUST_LOG");
        cmd
    }
}

/// Create an origin repository with one commit, returning its path.
fn make_origin(parent: &Path) -> PathBuf {
    let origin = parent.join("origin");
    std::fs::create_dir(&origin).unwrap();
    for args in [
        &["init", "-q"][..],
        &["symbolic-ref", "HEAD", "refs/heads/main"],
        &["config", "user.email", "test@example.com"],
        &["config", "user.name", "Test User"],
        &["config", "commit.gpgsign", "false"],
    ] {
        git(&origin, args);
    }
    std::fs::write(origin.join("README.md"), "# origin\n").unwrap();
    git(&origin, &["add", "README.md"]);
    git(&origin, &["commit", "-q", "-m", "Initial commit"]);
    origin
}

fn git(dir: &Path, args: &[&str]) {
    let status = StdCommand::new("git")
        .args(args)
        .current_dir(dir)
        .status()
        .expect("git command failed");
    assert!(status.success(), "git {:?} failed", args);
}

fn toml_path(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "\\\\")
}

// =============================================================================
// resolve
// =============================================================================

#[test]
fn resolve_uses_https_by_default() {
    let sandbox = Sandbox::new("");
    sandbox
        .reposync()
        .args(["resolve", "boxen/boxen"])
        .assert()
        .success()
        .stdout("https://github.com/boxen/boxen\n");
}

#[test]
fn resolve_uses_configured_protocol() {
    let sandbox = Sandbox::new("protocol = \"ssh\"\n");
    sandbox
        .reposync()
        .args(["resolve", "boxen/boxen"])
        .assert()
        .success()
        .stdout("git@github.com:boxen/boxen.git\n");
}

#[test]
fn resolve_flag_overrides_config() {
    let sandbox = Sandbox::new("protocol = \"ssh\"\n");
    sandbox
        .reposync()
        .args(["resolve", "boxen/boxen", "--protocol", "git"])
        .assert()
        .success()
        .stdout("git://github.com/boxen/boxen\n");
}

#[test]
fn resolve_leaves_full_locations_alone() {
    let sandbox = Sandbox::new("");
    sandbox
        .reposync()
        .args(["resolve", "https://example.com/x.git", "--protocol", "ssh"])
        .assert()
        .success()
        .stdout("https://example.com/x.git\n");
}

#[test]
fn resolve_rejects_unknown_protocol() {
    let sandbox = Sandbox::new("");
    sandbox
        .reposync()
        .args(["resolve", "boxen/boxen", "--protocol", "ftp"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid protocol"));
}

#[test]
fn invalid_global_config_fails() {
    let sandbox = Sandbox::new("colour = \"blue\"\n");
    sandbox
        .reposync()
        .args(["resolve", "boxen/boxen"])
        .assert()
        .failure()
        .stderr(predicate::str::starts_with("error: Failed to load config"));
}

// =============================================================================
// apply / status
// =============================================================================

#[test]
fn apply_clones_then_status_reports_in_sync() {
    let sandbox = Sandbox::new("");
    let origin = make_origin(sandbox.path());
    let target = sandbox.join("src/app");
    sandbox.write_manifest(&format!(
        "[[repository]]\npath = \"{}\"\nsource = \"{}\"\n",
        toml_path(&target),
        toml_path(&origin),
    ));

    sandbox
        .reposync()
        .args(["apply", "--dry-run"])
        .assert()
        .success()
        .stdout(predicate::str::contains("would clone"));
    assert!(!target.exists());

    sandbox
        .reposync()
        .arg("apply")
        .assert()
        .success()
        .stdout(predicate::str::contains("cloned"));
    assert!(target.join(".git").is_dir());

    let output = sandbox
        .reposync()
        .args(["status", "--json"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report[0]["in_sync"], true);
    assert_eq!(report[0]["reported_status"], "present");
    assert_eq!(report[0]["state"], "in-sync");
}

#[test]
fn apply_reports_failure_and_continues() {
    let sandbox = Sandbox::new("");
    let origin = make_origin(sandbox.path());
    let good = sandbox.join("good");
    sandbox.write_manifest(&format!(
        "[[repository]]\npath = \"{}\"\nsource = \"{}\"\n\n\
         [[repository]]\npath = \"{}\"\nsource = \"{}\"\n",
        toml_path(&sandbox.join("bad")),
        toml_path(&sandbox.join("missing-origin")),
        toml_path(&good),
        toml_path(&origin),
    ));

    sandbox
        .reposync()
        .arg("apply")
        .assert()
        .failure()
        .stderr(predicate::str::contains("clone failed"))
        .stderr(predicate::str::contains("1 of 2 repositories failed"));
    assert!(good.join(".git").is_dir());
}

#[test]
fn relative_path_is_rejected_before_any_cycle() {
    let sandbox = Sandbox::new("");
    let origin = make_origin(sandbox.path());
    sandbox.write_manifest(&format!(
        "[[repository]]\npath = \"{}\"\nsource = \"{}\"\n\n\
         [[repository]]\npath = \"relative\"\nsource = \"owner/name\"\n",
        toml_path(&sandbox.join("first")),
        toml_path(&origin),
    ));

    sandbox
        .reposync()
        .arg("apply")
        .assert()
        .failure()
        .stderr(predicate::str::contains(
            "Path must be absolute for Repository[relative]",
        ));
    assert!(!sandbox.join("first").exists());
}

#[test]
fn missing_manifest_fails() {
    let sandbox = Sandbox::new("");
    sandbox
        .reposync()
        .arg("status")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to load manifest"));
}

#[test]
fn manifest_flag_and_cwd_are_honored() {
    let sandbox = Sandbox::new("");
    std::fs::create_dir(sandbox.join("elsewhere")).unwrap();
    std::fs::write(
        sandbox.join("elsewhere/repos.toml"),
        "[[repository]]\npath = \"/opt/src/app\"\nensure = \"absent\"\n",
    )
    .unwrap();

    sandbox
        .reposync()
        .args(["--cwd", "elsewhere", "--manifest", "repos.toml", "deps"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Repository[/opt/src/app]"));
}

// =============================================================================
// deps
// =============================================================================

#[test]
fn deps_lists_parent_directories_and_user() {
    let sandbox = Sandbox::new("user = \"deploy\"\n");
    sandbox.write_manifest(
        "[[repository]]\npath = \"/opt/src/app\"\nsource = \"owner/app\"\n",
    );

    let output = sandbox.reposync().args(["deps", "--json"]).output().unwrap();
    assert!(output.status.success());
    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report[0]["resource"], "Repository[/opt/src/app]");
    assert_eq!(report[0]["command"], "git");
    assert_eq!(report[0]["directories"][0], "/opt");
    assert_eq!(report[0]["directories"][1], "/opt/src");
    assert_eq!(report[0]["user"], "deploy");
}

// =============================================================================
// meta
// =============================================================================

#[test]
fn help_describes_tool() {
    Command::cargo_bin("reposync")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("apply"))
        .stdout(predicate::str::contains("status"));
}

#[test]
fn version_flag_works() {
    Command::cargo_bin("reposync")
        .unwrap()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("reposync"));
}
