//! cli::args
//!
//! Command-line argument definitions using clap derive.
//!
//! # Global Flags
//!
//! These flags are available on all commands:
//! - `--help` / `-h`: Show help
//! - `--version`: Show version
//! - `--cwd <path>`: Run as if in that directory
//! - `--manifest <file>`: Manifest to read instead of `reposync.toml`
//! - `--debug`: Enable debug logging
//! - `--quiet` / `-q`: Minimal output

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::core::types::Protocol;

/// reposync - Converge git working copies onto declared state
#[derive(Parser, Debug)]
#[command(name = "reposync")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Run as if reposync was started in this directory
    #[arg(long, global = true)]
    pub cwd: Option<PathBuf>,

    /// Manifest file to read (default: reposync.toml)
    #[arg(long, global = true, value_name = "FILE")]
    pub manifest: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    /// Minimal output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Parser::parse()
    }
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Converge declared repositories onto their desired state
    #[command(
        name = "apply",
        long_about = "Converge declared repositories onto their desired state.\n\n\
            Each repository in the manifest gets one reconciliation cycle: its working \
            copy is inspected, compared with the declaration, and corrected if needed \
            by cloning, removing, rewriting origin, or resetting to the target revision.\n\n\
            Local changes are never discarded unless the declaration sets force = true. \
            A failure on one repository does not stop the others.",
        after_help = "\
EXAMPLES:
    # Converge everything in ./reposync.toml
    reposync apply

    # Preview what would change
    reposync apply --dry-run

    # Converge a single repository
    reposync apply /opt/src/boxen"
    )]
    Apply {
        /// Only these repository paths
        #[arg(value_name = "PATH")]
        paths: Vec<PathBuf>,

        /// Show what would be done without making changes
        #[arg(long)]
        dry_run: bool,

        /// Output results as JSON
        #[arg(long)]
        json: bool,
    },

    /// Report the state of declared repositories without changing them
    #[command(name = "status")]
    Status {
        /// Only these repository paths
        #[arg(value_name = "PATH")]
        paths: Vec<PathBuf>,

        /// Output results as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the fully qualified location for a source
    #[command(
        name = "resolve",
        after_help = "\
EXAMPLES:
    reposync resolve boxen/boxen
    reposync resolve boxen/boxen --protocol ssh"
    )]
    Resolve {
        /// Short form (owner/name) or a full location
        source: String,

        /// Protocol for short-form expansion (git, https, ssh)
        #[arg(long)]
        protocol: Option<Protocol>,
    },

    /// Print what each repository depends on
    #[command(name = "deps")]
    Deps {
        /// Only these repository paths
        #[arg(value_name = "PATH")]
        paths: Vec<PathBuf>,

        /// Output results as JSON
        #[arg(long)]
        json: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "reposync", "status", "--json", "--manifest", "m.toml", "-q",
        ])
        .unwrap();
        assert!(cli.quiet);
        assert_eq!(cli.manifest, Some(PathBuf::from("m.toml")));
        assert!(matches!(cli.command, Command::Status { json: true, .. }));
    }

    #[test]
    fn apply_collects_paths() {
        let cli = Cli::try_parse_from(["reposync", "apply", "--dry-run", "/a", "/b"]).unwrap();
        match cli.command {
            Command::Apply { paths, dry_run, .. } => {
                assert!(dry_run);
                assert_eq!(paths, vec![PathBuf::from("/a"), PathBuf::from("/b")]);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn resolve_parses_protocol() {
        let cli = Cli::try_parse_from(["reposync", "resolve", "a/b", "--protocol", "ssh"]).unwrap();
        assert!(matches!(
            cli.command,
            Command::Resolve {
                protocol: Some(Protocol::Ssh),
                ..
            }
        ));
    }

    #[test]
    fn resolve_rejects_unknown_protocol() {
        assert!(Cli::try_parse_from(["reposync", "resolve", "a/b", "--protocol", "ftp"]).is_err());
    }
}
