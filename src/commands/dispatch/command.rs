//! Command trait and context for dispatching commands

use std::time::Instant;

use crate::cli::paths::config_file_hint;
use crate::cli::Cli;
use notestore_core::config::StoreConfig;
use notestore_core::db::NoteIndex;
use notestore_core::error::Result;

use super::trace_command;

/// Shared context for command execution
pub struct CommandContext<'a> {
    pub cli: &'a Cli,
    pub config: StoreConfig,
    pub start: Instant,
}

impl<'a> CommandContext<'a> {
    pub fn new(cli: &'a Cli, config: StoreConfig, start: Instant) -> Self {
        Self { cli, config, start }
    }

    /// Open the store, bringing its schema up to date
    pub fn open_index(&self) -> Result<NoteIndex> {
        self.config
            .require_store_path(config_file_hint(self.cli).as_deref())?;
        let index = NoteIndex::initialize(&self.config)?;
        trace_command!(self.cli, self.start, "open_index");
        Ok(index)
    }
}

/// Trait for commands that can be executed
pub trait Command {
    fn execute(&self, ctx: &CommandContext) -> Result<()>;
}

/// No-op command (when no subcommand is provided)
pub struct NoCommand;

impl Command for NoCommand {
    fn execute(&self, _ctx: &CommandContext) -> Result<()> {
        println!("notestore {}", env!("CARGO_PKG_VERSION"));
        println!();
        println!("A persistent SQLite index for notes, tags and frontmatter.");
        println!();
        println!("Run `notestore --help` for usage information.");
        Ok(())
    }
}
