//! `notestore delete` command - remove a note and its relations

use notestore_core::error::{Result, StoreError};

use crate::commands::dispatch::command::CommandContext;
use crate::output_by_format_result;

/// Execute the delete command
pub fn execute(ctx: &CommandContext, path: &str) -> Result<()> {
    let index = ctx.open_index()?;
    index.delete_note(path).wait()?;
    index.shutdown()?;

    output_by_format_result!(ctx.cli.format,
        json => {
            let output = serde_json::json!({ "status": "ok", "deleted": path });
            println!("{}", serde_json::to_string_pretty(&output)?);
            Ok::<(), StoreError>(())
        },
        human => {
            if !ctx.cli.quiet {
                println!("Deleted {}", path);
            }
        }
    )?;

    Ok(())
}
