//! core::config
//!
//! Configuration schema and loading.
//!
//! # Overview
//!
//! Two files feed the engine:
//! - **Global config**: user-level defaults (git binary, protocol, user)
//! - **Manifest**: the repositories to converge
//!
//! Environment facts are read once, up front, into [`ConfigSources`] and
//! the resulting [`Settings`] are handed to the engine explicitly. Nothing
//! below the CLI looks at the process environment.
//!
//! # Global Config Locations
//!
//! Searched in order:
//! 1. `$REPOSYNC_CONFIG` if set
//! 2. `$XDG_CONFIG_HOME/reposync/config.toml`
//! 3. `~/.reposync/config.toml`
//!
//! # Example
//!
//! ```no_run
//! use reposync::core::config::{Config, ConfigSources};
//!
//! let config = Config::load(&ConfigSources::from_env()).unwrap();
//! let settings = config.settings();
//! println!("git: {}", settings.git_bin.display());
//! println!("protocol: {}", settings.default_protocol);
//! ```

pub mod schema;

pub use schema::{GlobalConfig, Manifest, RepositoryDecl};

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::core::types::Protocol;

/// Default manifest file name, relative to the working directory.
pub const DEFAULT_MANIFEST: &str = "reposync.toml";

/// Errors from configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file '{path}': {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("invalid config value: {0}")]
    InvalidValue(String),
}

/// Where to look for the global config file.
///
/// Captured from the environment once so loading stays deterministic
/// under test.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigSources {
    /// `$REPOSYNC_CONFIG`
    pub explicit: Option<PathBuf>,
    /// `$XDG_CONFIG_HOME`
    pub xdg_config_home: Option<PathBuf>,
    /// The user's home directory
    pub home: Option<PathBuf>,
}

impl ConfigSources {
    /// Capture the config search locations from the process environment.
    pub fn from_env() -> Self {
        Self {
            explicit: std::env::var_os("REPOSYNC_CONFIG").map(PathBuf::from),
            xdg_config_home: std::env::var_os("XDG_CONFIG_HOME").map(PathBuf::from),
            home: dirs::home_dir(),
        }
    }

    /// Candidate global config paths, in precedence order.
    pub fn candidates(&self) -> Vec<PathBuf> {
        let mut paths = Vec::new();
        if let Some(explicit) = &self.explicit {
            paths.push(explicit.clone());
        }
        if let Some(xdg) = &self.xdg_config_home {
            paths.push(xdg.join("reposync/config.toml"));
        }
        if let Some(home) = &self.home {
            paths.push(home.join(".reposync/config.toml"));
        }
        paths
    }
}

/// Engine-wide settings resolved from configuration.
///
/// Passed to the engine at construction; the engine never looks these up
/// on its own.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// The git executable to run
    pub git_bin: PathBuf,
    /// Protocol used when a declaration does not name one
    pub default_protocol: Protocol,
    /// User to run as when a declaration does not name one
    pub default_user: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            git_bin: PathBuf::from("git"),
            default_protocol: Protocol::default(),
            default_user: None,
        }
    }
}

/// Loaded global configuration.
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Global configuration
    pub global: GlobalConfig,
    /// Path to the global config file (if loaded)
    global_path: Option<PathBuf>,
}

impl Config {
    /// Load the global configuration from the first existing candidate.
    ///
    /// # Errors
    ///
    /// Returns an error if a config file exists but cannot be parsed or
    /// fails validation. A missing file is not an error.
    pub fn load(sources: &ConfigSources) -> Result<Config, ConfigError> {
        for path in sources.candidates() {
            if path.is_file() {
                let global: GlobalConfig = read_toml(&path)?;
                global.validate()?;
                return Ok(Config {
                    global,
                    global_path: Some(path),
                });
            }
        }

        Ok(Config::default())
    }

    /// Resolve engine settings, applying defaults.
    pub fn settings(&self) -> Settings {
        let git_bin = match (&self.global.git_bin, &self.global.homebrew_prefix) {
            (Some(bin), _) => bin.clone(),
            (None, Some(prefix)) => prefix.join("bin/git"),
            (None, None) => PathBuf::from("git"),
        };

        Settings {
            git_bin,
            default_protocol: self.global.protocol.unwrap_or_default(),
            default_user: self.global.user.clone(),
        }
    }

    /// Get the path to the loaded global config file.
    pub fn loaded_from(&self) -> Option<&Path> {
        self.global_path.as_deref()
    }
}

/// Read and parse a manifest file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or is not a valid manifest.
pub fn load_manifest(path: &Path) -> Result<Manifest, ConfigError> {
    read_toml(path)
}

fn read_toml<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
    let contents = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
        path: path.to_path_buf(),
        source: e,
    })?;

    toml::from_str(&contents).map_err(|e| ConfigError::ParseError {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sources_in(temp: &TempDir) -> ConfigSources {
        ConfigSources {
            explicit: None,
            xdg_config_home: Some(temp.path().join("xdg")),
            home: Some(temp.path().join("home")),
        }
    }

    #[test]
    fn load_empty_defaults() {
        let temp = TempDir::new().unwrap();
        let config = Config::load(&sources_in(&temp)).unwrap();

        assert!(config.loaded_from().is_none());
        let settings = config.settings();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.git_bin, PathBuf::from("git"));
        assert_eq!(settings.default_protocol, Protocol::Https);
    }

    #[test]
    fn explicit_path_wins() {
        let temp = TempDir::new().unwrap();
        let explicit = temp.path().join("custom.toml");
        fs::write(&explicit, "protocol = \"ssh\"").unwrap();

        let home_config = temp.path().join("home/.reposync/config.toml");
        fs::create_dir_all(home_config.parent().unwrap()).unwrap();
        fs::write(&home_config, "protocol = \"git\"").unwrap();

        let sources = ConfigSources {
            explicit: Some(explicit.clone()),
            ..sources_in(&temp)
        };
        let config = Config::load(&sources).unwrap();

        assert_eq!(config.loaded_from(), Some(explicit.as_path()));
        assert_eq!(config.settings().default_protocol, Protocol::Ssh);
    }

    #[test]
    fn xdg_before_home() {
        let temp = TempDir::new().unwrap();
        let xdg_config = temp.path().join("xdg/reposync/config.toml");
        fs::create_dir_all(xdg_config.parent().unwrap()).unwrap();
        fs::write(&xdg_config, "user = \"xdg-user\"").unwrap();

        let home_config = temp.path().join("home/.reposync/config.toml");
        fs::create_dir_all(home_config.parent().unwrap()).unwrap();
        fs::write(&home_config, "user = \"home-user\"").unwrap();

        let config = Config::load(&sources_in(&temp)).unwrap();
        assert_eq!(
            config.settings().default_user.as_deref(),
            Some("xdg-user")
        );
    }

    #[test]
    fn homebrew_prefix_selects_git() {
        let config = Config {
            global: GlobalConfig {
                homebrew_prefix: Some(PathBuf::from("/opt/boxen/homebrew")),
                ..Default::default()
            },
            global_path: None,
        };
        assert_eq!(
            config.settings().git_bin,
            PathBuf::from("/opt/boxen/homebrew/bin/git")
        );
    }

    #[test]
    fn explicit_git_bin_beats_prefix() {
        let config = Config {
            global: GlobalConfig {
                git_bin: Some(PathBuf::from("/usr/bin/git")),
                homebrew_prefix: Some(PathBuf::from("/opt/homebrew")),
                ..Default::default()
            },
            global_path: None,
        };
        assert_eq!(config.settings().git_bin, PathBuf::from("/usr/bin/git"));
    }

    #[test]
    fn invalid_protocol_is_parse_error() {
        let temp = TempDir::new().unwrap();
        let explicit = temp.path().join("config.toml");
        fs::write(&explicit, "protocol = \"ftp\"").unwrap();

        let sources = ConfigSources {
            explicit: Some(explicit),
            ..sources_in(&temp)
        };
        assert!(matches!(
            Config::load(&sources),
            Err(ConfigError::ParseError { .. })
        ));
    }

    #[test]
    fn load_manifest_missing_file() {
        let temp = TempDir::new().unwrap();
        let result = load_manifest(&temp.path().join("nope.toml"));
        assert!(matches!(result, Err(ConfigError::ReadError { .. })));
    }

    #[test]
    fn load_manifest_reads_repositories() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join(DEFAULT_MANIFEST);
        fs::write(
            &path,
            r#"
            [[repository]]
            path = "/opt/src/a"
            source = "owner/a"
            "#,
        )
        .unwrap();

        let manifest = load_manifest(&path).unwrap();
        assert_eq!(manifest.repositories.len(), 1);
        assert_eq!(manifest.repositories[0].source.as_deref(), Some("owner/a"));
    }
}
