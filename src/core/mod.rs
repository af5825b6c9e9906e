//! core
//!
//! Core domain types, validation, and configuration.
//!
//! # Modules
//!
//! - [`types`] - Strong types: Protocol, Revision, Ensure
//! - [`source`] - Short-form source expansion
//! - [`desired`] - Validated desired state and dependency hints
//! - [`config`] - Global configuration and manifest loading
//!
//! # Design Principles
//!
//! - Strong typing prevents invalid states at compile time
//! - Validation happens once, before any reconciliation cycle
//! - Nothing in this layer runs external commands

pub mod config;
pub mod desired;
pub mod source;
pub mod types;
