//! core::desired
//!
//! The validated desired state of one managed working copy.
//!
//! # Validation
//!
//! A [`RepositoryDecl`] becomes a [`DesiredState`] only after every field
//! has been checked. Invalid declarations fail with a
//! [`ConfigurationError`] before any reconciliation cycle starts; the
//! engine never sees them.
//!
//! # Example
//!
//! ```
//! use reposync::core::config::{RepositoryDecl, Settings};
//! use reposync::core::desired::DesiredState;
//!
//! let decl = RepositoryDecl::new("/opt/src/boxen", "boxen/boxen");
//! let desired = DesiredState::from_decl(&decl, &Settings::default()).unwrap();
//! assert_eq!(
//!     desired.resolved_source().as_deref(),
//!     Some("https://github.com/boxen/boxen")
//! );
//!
//! let relative = RepositoryDecl::new("src/boxen", "boxen/boxen");
//! assert!(DesiredState::from_decl(&relative, &Settings::default()).is_err());
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;

use super::config::{RepositoryDecl, Settings};
use super::source;
use super::types::{Ensure, Protocol, TypeError};

/// Invalid desired state.
///
/// Raised at validation time; never retried.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigurationError {
    #[error("Path must be absolute for {resource}")]
    RelativePath { resource: String },

    #[error("You must specify a source for {resource}")]
    MissingSource { resource: String },

    #[error("Source '{location}' for {resource} is a relative path; use an absolute path or a URL")]
    RelativeSource { resource: String, location: String },

    #[error("{resource}: {source}")]
    InvalidProtocol {
        resource: String,
        source: TypeError,
    },

    #[error("{resource}: invalid clone config key '{key}'")]
    InvalidConfigKey { resource: String, key: String },

    #[error("{resource}: user cannot be empty")]
    EmptyUser { resource: String },
}

/// Desired state for one reconciliation cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DesiredState {
    pub path: PathBuf,
    /// `None` only when `ensure` is `absent`
    pub source: Option<String>,
    pub protocol: Protocol,
    pub ensure: Ensure,
    pub run_as_user: Option<String>,
    pub extra_clone_args: Vec<String>,
    pub clone_config: BTreeMap<String, String>,
    pub force_on_dirty: bool,
}

impl DesiredState {
    /// Validate a declaration, filling defaults from `settings`.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigurationError` naming the resource for the first
    /// invalid field found.
    pub fn from_decl(
        decl: &RepositoryDecl,
        settings: &Settings,
    ) -> Result<Self, ConfigurationError> {
        let resource = resource_name(&decl.path);

        if !decl.path.is_absolute() {
            return Err(ConfigurationError::RelativePath { resource });
        }

        let protocol = match decl.protocol.as_deref() {
            Some(name) => Protocol::parse(name).map_err(|source| {
                ConfigurationError::InvalidProtocol {
                    resource: resource.clone(),
                    source,
                }
            })?,
            None => settings.default_protocol,
        };

        let source = decl
            .source
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string);
        match source.as_deref() {
            None if decl.ensure != Ensure::Absent => {
                return Err(ConfigurationError::MissingSource { resource });
            }
            Some(location) if source::is_relative_path(location) => {
                return Err(ConfigurationError::RelativeSource {
                    resource,
                    location: location.to_string(),
                });
            }
            _ => {}
        }

        for key in decl.config.keys() {
            if !is_valid_config_key(key) {
                return Err(ConfigurationError::InvalidConfigKey {
                    resource,
                    key: key.clone(),
                });
            }
        }

        let run_as_user = match decl.user.as_deref() {
            Some(user) if user.trim().is_empty() => {
                return Err(ConfigurationError::EmptyUser { resource });
            }
            Some(user) => Some(user.to_string()),
            None => settings.default_user.clone(),
        };

        let extra_clone_args = decl
            .extra
            .iter()
            .filter(|arg| !arg.is_empty())
            .cloned()
            .collect();

        Ok(Self {
            path: decl.path.clone(),
            source,
            protocol,
            ensure: decl.ensure.clone(),
            run_as_user,
            extra_clone_args,
            clone_config: decl.config.clone(),
            force_on_dirty: decl.force,
        })
    }

    /// The source expanded to a fully qualified location.
    pub fn resolved_source(&self) -> Option<String> {
        self.source
            .as_deref()
            .map(|s| source::resolve(s, self.protocol))
    }

    /// Display name used in errors and logs, e.g. `Repository[/opt/src/x]`.
    pub fn resource_name(&self) -> String {
        resource_name(&self.path)
    }

    /// What must be realized before this repository can be converged.
    pub fn dependency_hints(&self) -> DependencyHints {
        DependencyHints {
            command: "git".to_string(),
            directories: parent_directories(&self.path),
            user: self.run_as_user.clone(),
        }
    }
}

/// Ordering hints for the surrounding scheduler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DependencyHints {
    /// External command that must be installed
    pub command: String,
    /// Ancestor directories, outermost first, excluding `/`
    pub directories: Vec<PathBuf>,
    /// Identity the commands run as
    pub user: Option<String>,
}

impl fmt::Display for DependencyHints {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "command: {}", self.command)?;
        for dir in &self.directories {
            write!(f, "\ndirectory: {}", dir.display())?;
        }
        if let Some(user) = &self.user {
            write!(f, "\nuser: {}", user)?;
        }
        Ok(())
    }
}

fn resource_name(path: &Path) -> String {
    format!("Repository[{}]", path.display())
}

/// Proper ancestors of `path`, outermost first, without the root.
fn parent_directories(path: &Path) -> Vec<PathBuf> {
    let mut dirs: Vec<PathBuf> = path
        .ancestors()
        .skip(1)
        .filter(|p| p.parent().is_some() && !p.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .collect();
    dirs.reverse();
    dirs
}

/// Git config keys look like `section.key` or `section.sub.key`.
fn is_valid_config_key(key: &str) -> bool {
    !key.is_empty()
        && key.contains('.')
        && !key.starts_with('.')
        && !key.ends_with('.')
        && !key.contains('=')
        && !key.chars().any(char::is_whitespace)
}
