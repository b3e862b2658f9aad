//! `notestore status` command - schema version and note count

use notestore_core::db::CURRENT_VERSION;
use notestore_core::error::{Result, StoreError};

use crate::commands::dispatch::command::CommandContext;
use crate::output_by_format_result;

/// Execute the status command
pub fn execute(ctx: &CommandContext) -> Result<()> {
    let index = ctx.open_index()?;
    let version = index.schema_version()?;
    let notes = index.note_count()?;
    let store = index
        .store_path()
        .map(|p| p.display().to_string())
        .unwrap_or_default();
    index.shutdown()?;

    output_by_format_result!(ctx.cli.format,
        json => {
            let output = serde_json::json!({
                "store": store,
                "engine": ctx.config.engine.to_string(),
                "schema_version": version,
                "supported_version": CURRENT_VERSION,
                "notes": notes,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
            Ok::<(), StoreError>(())
        },
        human => {
            println!("Store: {}", store);
            println!("Engine: {}", ctx.config.engine);
            match version {
                Some(v) => println!("Schema version: {}", v),
                None => println!("Schema version: unknown"),
            }
            println!("Notes: {}", notes);
        }
    )?;

    Ok(())
}
