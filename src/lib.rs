//! reposync - Converge git working copies onto declared state
//!
//! reposync keeps a set of local git working copies matching a declaration:
//! present or absent, cloned from the right origin, and checked out at the
//! right revision. It is the engine behind a declarative `repository`
//! resource, usable as a library or through the `reposync` binary.
//!
//! # Architecture
//!
//! The codebase follows a strict layered architecture:
//!
//! - [`cli`] - Command-line interface layer (parses args, delegates to engine)
//! - [`engine`] - Observe → Query → InSync → Plan → Sync reconciliation cycle
//! - [`core`] - Domain types, source expansion, validation, and configuration
//! - [`git`] - Single interface for all git operations
//! - [`ui`] - User-facing output
//!
//! # Correctness Invariants
//!
//! reposync maintains the following invariants:
//!
//! 1. Invalid declarations are rejected before any cycle runs
//! 2. Actual state is inspected afresh on every cycle
//! 3. Each corrective action ends in a single mutating git command
//! 4. Local changes are discarded only with explicit consent (`force`)

pub mod cli;
pub mod core;
pub mod engine;
pub mod git;
pub mod ui;
