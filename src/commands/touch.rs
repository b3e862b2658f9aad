//! `notestore touch` command - stamp a note's last opened time

use notestore_core::error::{Result, StoreError};

use crate::commands::dispatch::command::CommandContext;
use crate::output_by_format_result;

/// Execute the touch command
pub fn execute(ctx: &CommandContext, path: &str) -> Result<()> {
    let index = ctx.open_index()?;
    if index.get_note(path)?.is_none() {
        return Err(StoreError::NoteNotFound {
            path: path.to_string(),
        });
    }

    index.update_last_opened(path).wait()?;
    let last_opened = index.get_note(path)?.and_then(|n| n.last_opened);
    index.shutdown()?;

    output_by_format_result!(ctx.cli.format,
        json => {
            let output = serde_json::json!({
                "status": "ok",
                "path": path,
                "last_opened": last_opened,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
            Ok::<(), StoreError>(())
        },
        human => {
            if !ctx.cli.quiet {
                println!("Touched {}", path);
            }
        }
    )?;

    Ok(())
}
