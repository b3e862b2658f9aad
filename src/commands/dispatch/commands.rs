//! Command implementations for all notestore commands

use crate::cli::Commands;
use crate::commands::dispatch::command::{Command, CommandContext};
use crate::commands::{delete, import, init, show, status, touch, update};
use notestore_core::error::Result;

impl Command for Commands {
    fn execute(&self, ctx: &CommandContext) -> Result<()> {
        match self {
            Commands::Init => init::execute(ctx),
            Commands::Update { input } => update::execute(ctx, input),
            Commands::Import { input } => import::execute(ctx, input),
            Commands::Delete { path } => delete::execute(ctx, path),
            Commands::Touch { path } => touch::execute(ctx, path),
            Commands::Show { path } => show::execute(ctx, path),
            Commands::Status => status::execute(ctx),
        }
    }
}
