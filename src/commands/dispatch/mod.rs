//! Command dispatch logic for notestore

use std::time::Instant;

use crate::cli::paths::resolve_config;
use crate::cli::Cli;
use notestore_core::error::Result;
use tracing::debug;

pub mod command;
mod commands;
mod macros;

pub(crate) use macros::trace_command;

use command::{Command, CommandContext, NoCommand};

pub fn run(cli: &Cli, start: Instant) -> Result<()> {
    let config = resolve_config(cli)?;

    debug!(
        elapsed = ?start.elapsed(),
        engine = %config.engine,
        timeout_ms = config.timeout_ms,
        "resolve_config"
    );

    let ctx = CommandContext::new(cli, config, start);

    match &cli.command {
        None => NoCommand.execute(&ctx),
        Some(cmd) => cmd.execute(&ctx),
    }
}
