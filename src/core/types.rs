//! core::types
//!
//! Strong types for core domain concepts.
//!
//! # Types
//!
//! - [`Protocol`] - Transport used to expand short-form sources
//! - [`Revision`] - Concrete, content-addressed commit identifier
//! - [`Ensure`] - Desired presence or pinned revision of a working copy
//!
//! # Validation
//!
//! These types enforce validity at construction time. Invalid values
//! cannot be represented, so the engine never has to re-check them.
//!
//! # Examples
//!
//! ```
//! use reposync::core::types::{Ensure, Protocol, Revision};
//!
//! let protocol: Protocol = "ssh".parse().unwrap();
//! assert_eq!(protocol, Protocol::Ssh);
//!
//! let rev = Revision::new("abc123def4567890abc123def4567890abc12345").unwrap();
//! assert_eq!(rev.short(7), "abc123d");
//!
//! assert_eq!(Ensure::parse("absent").unwrap(), Ensure::Absent);
//! assert!(Protocol::parse("ftp").is_err());
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from type validation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid protocol '{0}', must be one of: git, https, ssh")]
    InvalidProtocol(String),

    #[error("invalid revision id: {0}")]
    InvalidRevision(String),

    #[error("invalid ensure value: {0}")]
    InvalidEnsure(String),
}

/// Transport protocol for short-form source expansion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Protocol {
    Git,
    #[default]
    Https,
    Ssh,
}

impl Protocol {
    /// All accepted protocol names.
    pub const NAMES: [&'static str; 3] = ["git", "https", "ssh"];

    /// Parse a protocol name (case-sensitive, as written in manifests).
    pub fn parse(name: &str) -> Result<Self, TypeError> {
        match name {
            "git" => Ok(Protocol::Git),
            "https" => Ok(Protocol::Https),
            "ssh" => Ok(Protocol::Ssh),
            other => Err(TypeError::InvalidProtocol(other.to_string())),
        }
    }

    /// The protocol name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Protocol::Git => "git",
            Protocol::Https => "https",
            Protocol::Ssh => "ssh",
        }
    }
}

impl FromStr for Protocol {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Protocol {
    type Error = TypeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<Protocol> for String {
    fn from(protocol: Protocol) -> Self {
        protocol.as_str().to_string()
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A concrete commit identifier (SHA-1 or SHA-256).
///
/// Revisions are normalized to lowercase so that ids read back from
/// different git commands compare equal.
///
/// # Example
///
/// ```
/// use reposync::core::types::Revision;
///
/// let rev = Revision::new("ABC123DEF4567890ABC123DEF4567890ABC12345").unwrap();
/// assert_eq!(rev.as_str(), "abc123def4567890abc123def4567890abc12345");
/// assert!(Revision::new("main").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Revision(String);

impl Revision {
    /// Create a new validated revision id.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidRevision` if the string is not a full hex id.
    pub fn new(id: impl Into<String>) -> Result<Self, TypeError> {
        let id = id.into().trim().to_ascii_lowercase();
        Self::validate(&id)?;
        Ok(Self(id))
    }

    fn validate(id: &str) -> Result<(), TypeError> {
        // SHA-1 is 40 hex chars, SHA-256 is 64
        if id.len() != 40 && id.len() != 64 {
            return Err(TypeError::InvalidRevision(format!(
                "expected 40 or 64 hex characters, got {}",
                id.len()
            )));
        }
        if !id.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(TypeError::InvalidRevision(
                "revision id must be hexadecimal".into(),
            ));
        }
        Ok(())
    }

    /// Get an abbreviated form of the id.
    pub fn short(&self, len: usize) -> &str {
        let end = len.min(self.0.len());
        &self.0[..end]
    }

    /// Get the revision id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Revision {
    type Error = TypeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<Revision> for String {
    fn from(rev: Revision) -> Self {
        rev.0
    }
}

impl fmt::Display for Revision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Desired state of the managed working copy.
///
/// `present` and `absent` are sentinels; any other value is a symbolic
/// revision specifier (branch, tag, commit, or `latest`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Ensure {
    #[default]
    Present,
    Absent,
    Revision(String),
}

impl Ensure {
    /// Parse an ensure value.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidEnsure` for empty values, the reserved
    /// `needs-update` status, values containing whitespace, and values that
    /// would read as a command-line option.
    pub fn parse(value: &str) -> Result<Self, TypeError> {
        match value {
            "present" => Ok(Ensure::Present),
            "absent" => Ok(Ensure::Absent),
            "" => Err(TypeError::InvalidEnsure("value cannot be empty".into())),
            "needs-update" => Err(TypeError::InvalidEnsure(
                "'needs-update' is a reserved status, not a revision".into(),
            )),
            spec if spec.chars().any(char::is_whitespace) => Err(TypeError::InvalidEnsure(
                format!("'{spec}' cannot contain whitespace"),
            )),
            spec if spec.starts_with('-') => Err(TypeError::InvalidEnsure(format!(
                "'{spec}' cannot start with '-'"
            ))),
            spec => Ok(Ensure::Revision(spec.to_string())),
        }
    }

    /// The literal form, as the scheduler compares it.
    pub fn as_str(&self) -> &str {
        match self {
            Ensure::Present => "present",
            Ensure::Absent => "absent",
            Ensure::Revision(spec) => spec,
        }
    }

    /// Whether this names a revision rather than a presence sentinel.
    pub fn is_revision(&self) -> bool {
        matches!(self, Ensure::Revision(_))
    }
}

impl TryFrom<String> for Ensure {
    type Error = TypeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<Ensure> for String {
    fn from(ensure: Ensure) -> Self {
        ensure.as_str().to_string()
    }
}

impl fmt::Display for Ensure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
