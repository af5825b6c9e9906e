//! core::config::schema
//!
//! Configuration and manifest schema types.
//!
//! # Global Config
//!
//! Located at (in order of precedence):
//! 1. `$REPOSYNC_CONFIG` if set
//! 2. `$XDG_CONFIG_HOME/reposync/config.toml`
//! 3. `~/.reposync/config.toml`
//!
//! # Manifest
//!
//! A manifest declares the repositories to converge, one
//! `[[repository]]` table each.
//!
//! # Validation
//!
//! Global config values are validated after parsing. Repository
//! declarations are validated when they are turned into a
//! [`DesiredState`](crate::core::desired::DesiredState).

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::ConfigError;
use crate::core::types::{Ensure, Protocol};

/// Global configuration (user scope).
///
/// # Example
///
/// ```toml
/// protocol = "ssh"
/// user = "deploy"
/// homebrew_prefix = "/opt/boxen/homebrew"
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct GlobalConfig {
    /// Explicit git executable
    pub git_bin: Option<PathBuf>,

    /// Default protocol for short-form sources
    pub protocol: Option<Protocol>,

    /// Default user to run git as
    pub user: Option<String>,

    /// Package prefix whose `bin/git` is used when `git_bin` is unset
    pub homebrew_prefix: Option<PathBuf>,
}

impl GlobalConfig {
    /// Validate the configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if any value is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(user) = &self.user {
            if user.trim().is_empty() {
                return Err(ConfigError::InvalidValue(
                    "user cannot be empty".to_string(),
                ));
            }
        }

        if let Some(git_bin) = &self.git_bin {
            if git_bin.as_os_str().is_empty() {
                return Err(ConfigError::InvalidValue(
                    "git_bin cannot be empty".to_string(),
                ));
            }
        }

        Ok(())
    }
}

/// A set of repository declarations.
///
/// # Example
///
/// ```toml
/// [[repository]]
/// path = "/opt/src/boxen"
/// source = "boxen/boxen"
/// ensure = "v2.1.0"
/// extra = ["--recursive"]
///
/// [repository.config]
/// "core.autocrlf" = "input"
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct Manifest {
    #[serde(rename = "repository")]
    pub repositories: Vec<RepositoryDecl>,
}

/// One declared repository, as written by the operator.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct RepositoryDecl {
    /// Where the working copy lives; must be absolute
    pub path: PathBuf,

    /// Short-form `owner/name` or a fully qualified location
    #[serde(default)]
    pub source: Option<String>,

    /// `present`, `absent`, or a revision specifier
    #[serde(default)]
    pub ensure: Ensure,

    /// Protocol for short-form expansion (defaults from global config)
    #[serde(default)]
    pub protocol: Option<String>,

    /// User to run git as (defaults from global config)
    #[serde(default)]
    pub user: Option<String>,

    /// Raw tokens appended to `git clone`
    #[serde(default)]
    pub extra: Vec<String>,

    /// `-c key=value` overrides applied at clone time
    #[serde(default)]
    pub config: BTreeMap<String, String>,

    /// Whether local changes may be discarded
    #[serde(default)]
    pub force: bool,
}

impl RepositoryDecl {
    /// A declaration with only a path and source; everything else defaulted.
    pub fn new(path: impl Into<PathBuf>, source: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            source: Some(source.into()),
            ensure: Ensure::Present,
            protocol: None,
            user: None,
            extra: Vec::new(),
            config: BTreeMap::new(),
            force: false,
        }
    }
}
