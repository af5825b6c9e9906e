//! resolve command - Print the expanded location of a source

use anyhow::Result;

use super::load_settings;
use crate::core::source;
use crate::core::types::Protocol;
use crate::engine::Context;

/// Print where `source_arg` would be cloned from.
///
/// Without `--protocol`, the configured default applies.
pub fn resolve(_ctx: &Context, source_arg: &str, protocol: Option<Protocol>) -> Result<()> {
    let protocol = match protocol {
        Some(protocol) => protocol,
        None => load_settings()?.default_protocol,
    };

    println!("{}", source::resolve(source_arg.trim(), protocol));
    Ok(())
}
