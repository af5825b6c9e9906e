//! core::source
//!
//! Expansion of short-form repository sources.
//!
//! A short-form source is an `owner/name` pair (exactly one slash, no
//! leading `@`, no whitespace). It expands against github.com using the
//! requested protocol. Anything else (URLs, scp-style SSH specs, local
//! paths) is already fully qualified and passes through unchanged.
//!
//! # Example
//!
//! ```
//! use reposync::core::source::resolve;
//! use reposync::core::types::Protocol;
//!
//! assert_eq!(
//!     resolve("boxen/boxen", Protocol::Https),
//!     "https://github.com/boxen/boxen"
//! );
//! assert_eq!(
//!     resolve("boxen/boxen", Protocol::Ssh),
//!     "git@github.com:boxen/boxen.git"
//! );
//! assert_eq!(
//!     resolve("https://example.com/x.git", Protocol::Ssh),
//!     "https://example.com/x.git"
//! );
//! ```

use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;

use super::types::Protocol;

/// Host that short-form sources expand against.
pub const SHORT_FORM_HOST: &str = "github.com";

static SHORT_FORM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^@/\s]+/[^/\s]+$").expect("short-form pattern is a valid regex")
});

/// Whether `source` is an `owner/name` short form.
pub fn is_short_form(source: &str) -> bool {
    SHORT_FORM.is_match(source)
}

/// Whether `source` is a local path relative to the current directory.
///
/// Git records a relative clone source as an absolute path, so such a
/// source could never match the recorded remote. URLs (`scheme://`),
/// scp-style specs (a `:` before any `/`) and short forms are not paths.
pub fn is_relative_path(source: &str) -> bool {
    if is_short_form(source) || source.contains("://") {
        return false;
    }
    let scp_like = match (source.find(':'), source.find('/')) {
        (Some(colon), Some(slash)) => colon < slash,
        (Some(_), None) => true,
        _ => false,
    };
    !scp_like && !Path::new(source).is_absolute()
}

/// Expand `source` into a fully qualified remote location.
///
/// Pure; the protocol has already been validated by the time a source is
/// resolved.
pub fn resolve(source: &str, protocol: Protocol) -> String {
    if !is_short_form(source) {
        return source.to_string();
    }

    match protocol {
        Protocol::Git | Protocol::Https => {
            format!("{}://{}/{}", protocol.as_str(), SHORT_FORM_HOST, source)
        }
        Protocol::Ssh => format!("git@{}:{}.git", SHORT_FORM_HOST, source),
    }
}
