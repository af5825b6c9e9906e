//! ui
//!
//! User-facing output.
//!
//! # Modules
//!
//! - [`output`] - Output formatting and display
//!
//! # Design
//!
//! All user-facing output goes through this module so that `--quiet`
//! and `--json` are honored consistently. Diagnostics go through
//! `tracing` instead.

pub mod output;
