//! cli::commands
//!
//! Command dispatch and handlers.
//!
//! # Architecture
//!
//! Each command handler:
//! 1. Loads global configuration and the manifest
//! 2. Validates every declaration before any cycle runs
//! 3. Calls the engine once per repository
//! 4. Formats and displays output
//!
//! Handlers do NOT touch working copies directly.

mod apply;
mod deps;
mod resolve;
mod status;

pub use apply::apply;
pub use deps::deps;
pub use resolve::resolve;
pub use status::status;

use std::path::{Path, PathBuf};

use anyhow::{bail, Context as _, Result};

use crate::cli::args::Command;
use crate::core::config::{load_manifest, Config, ConfigSources, Settings, DEFAULT_MANIFEST};
use crate::core::desired::DesiredState;
use crate::engine::Context;
use crate::git::ProcessRunner;
use crate::ui::output::Verbosity;

/// Dispatch a command to its handler.
pub fn dispatch(command: Command, ctx: &Context) -> Result<()> {
    match command {
        Command::Apply {
            paths,
            dry_run,
            json,
        } => apply(ctx, &paths, dry_run, json),
        Command::Status { paths, json } => status(ctx, &paths, json),
        Command::Resolve { source, protocol } => resolve(ctx, &source, protocol),
        Command::Deps { paths, json } => deps(ctx, &paths, json),
    }
}

fn verbosity(ctx: &Context) -> Verbosity {
    Verbosity::from_flags(ctx.quiet, ctx.debug)
}

fn working_dir(ctx: &Context) -> Result<PathBuf> {
    match &ctx.cwd {
        Some(dir) => Ok(dir.clone()),
        None => std::env::current_dir().context("Failed to determine current directory"),
    }
}

/// Engine settings from the global config file, if any.
fn load_settings() -> Result<Settings> {
    let config = Config::load(&ConfigSources::from_env()).context("Failed to load config")?;
    if let Some(path) = config.loaded_from() {
        tracing::debug!(path = %path.display(), "loaded global config");
    }
    Ok(config.settings())
}

/// The runner for real git processes, aware of the invoking user.
fn process_runner() -> ProcessRunner {
    ProcessRunner::new(std::env::var("USER").ok())
}

/// Load the manifest and validate every declaration, keeping those
/// selected by `filter` (all if empty).
fn load_desired(ctx: &Context, settings: &Settings, filter: &[PathBuf]) -> Result<Vec<DesiredState>> {
    let cwd = working_dir(ctx)?;
    let manifest_path = match &ctx.manifest {
        Some(path) => cwd.join(path),
        None => cwd.join(DEFAULT_MANIFEST),
    };

    let manifest = load_manifest(&manifest_path)
        .with_context(|| format!("Failed to load manifest {}", manifest_path.display()))?;

    let mut desired = Vec::with_capacity(manifest.repositories.len());
    for decl in &manifest.repositories {
        desired.push(DesiredState::from_decl(decl, settings)?);
    }

    if filter.is_empty() {
        return Ok(desired);
    }

    let wanted: Vec<PathBuf> = filter.iter().map(|p| cwd.join(p)).collect();
    for path in &wanted {
        if !desired.iter().any(|d| same_path(&d.path, path)) {
            bail!("{} is not declared in {}", path.display(), manifest_path.display());
        }
    }

    Ok(desired
        .into_iter()
        .filter(|d| wanted.iter().any(|p| same_path(&d.path, p)))
        .collect())
}

fn same_path(a: &Path, b: &Path) -> bool {
    a.components().eq(b.components())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn ctx_in(dir: &Path) -> Context {
        Context {
            cwd: Some(dir.to_path_buf()),
            ..Context::default()
        }
    }

    fn write_manifest(dir: &Path, body: &str) {
        std::fs::write(dir.join(DEFAULT_MANIFEST), body).unwrap();
    }

    #[test]
    fn loads_and_validates_declarations() {
        let temp = TempDir::new().unwrap();
        write_manifest(
            temp.path(),
            r#"
[[repository]]
path = "/opt/src/a"
source = "owner/a"

[[repository]]
path = "/opt/src/b"
ensure = "absent"
"#,
        );

        let desired = load_desired(&ctx_in(temp.path()), &Settings::default(), &[]).unwrap();
        assert_eq!(desired.len(), 2);
        assert_eq!(
            desired[0].resolved_source().as_deref(),
            Some("https://github.com/owner/a")
        );
    }

    #[test]
    fn invalid_declaration_fails_whole_manifest() {
        let temp = TempDir::new().unwrap();
        write_manifest(
            temp.path(),
            r#"
[[repository]]
path = "/opt/src/a"
source = "owner/a"

[[repository]]
path = "relative"
source = "owner/b"
"#,
        );

        let err = load_desired(&ctx_in(temp.path()), &Settings::default(), &[]).unwrap_err();
        assert!(err.to_string().contains("Path must be absolute"));
    }

    #[test]
    fn filter_selects_declared_paths() {
        let temp = TempDir::new().unwrap();
        write_manifest(
            temp.path(),
            r#"
[[repository]]
path = "/opt/src/a"
source = "owner/a"

[[repository]]
path = "/opt/src/b"
source = "owner/b"
"#,
        );
        let ctx = ctx_in(temp.path());

        let desired =
            load_desired(&ctx, &Settings::default(), &[PathBuf::from("/opt/src/b/")]).unwrap();
        assert_eq!(desired.len(), 1);
        assert_eq!(desired[0].path, PathBuf::from("/opt/src/b"));

        assert!(load_desired(&ctx, &Settings::default(), &[PathBuf::from("/opt/src/c")]).is_err());
    }

    #[test]
    fn missing_manifest_is_an_error() {
        let temp = TempDir::new().unwrap();
        let err = load_desired(&ctx_in(temp.path()), &Settings::default(), &[]).unwrap_err();
        assert!(err.to_string().contains("Failed to load manifest"));
    }
}
