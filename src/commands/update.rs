//! `notestore update` command - upsert a batch of notes
//!
//! Input is one JSON record or an array of records. The whole batch is a
//! single transaction.

use notestore_core::error::{Result, StoreError};
use notestore_core::record::parse_records;

use crate::commands::dispatch::command::CommandContext;
use crate::commands::dispatch::trace_command;
use crate::commands::helpers::read_input;
use crate::output_by_format_result;

/// Execute the update command
pub fn execute(ctx: &CommandContext, input: &str) -> Result<()> {
    let records = parse_records(&read_input(input)?)
        .map_err(|e| match e {
            StoreError::Json(err) => StoreError::invalid_value("note records", err),
            other => other,
        })?;
    trace_command!(ctx.cli, ctx.start, "parse_records");

    let paths: Vec<String> = records.iter().map(|r| r.path.clone()).collect();

    let index = ctx.open_index()?;
    index.update_notes(records).wait()?;
    index.shutdown()?;
    trace_command!(ctx.cli, ctx.start, "update_notes");

    output_by_format_result!(ctx.cli.format,
        json => {
            let output = serde_json::json!({
                "status": "ok",
                "updated": paths.len(),
                "paths": paths,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
            Ok::<(), StoreError>(())
        },
        human => {
            if !ctx.cli.quiet {
                println!("Updated {} note(s)", paths.len());
            }
        }
    )?;

    Ok(())
}
