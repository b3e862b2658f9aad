//! `notestore init` command - create or upgrade the store schema
//!
//! Idempotent: a store already at the current version is left alone.

use notestore_core::error::{Result, StoreError};

use crate::commands::dispatch::command::CommandContext;
use crate::output_by_format_result;

/// Execute the init command
pub fn execute(ctx: &CommandContext) -> Result<()> {
    let index = ctx.open_index()?;
    let store = index
        .store_path()
        .map(|p| p.display().to_string())
        .unwrap_or_default();
    let report = index.schema_report().copied();
    index.shutdown()?;

    output_by_format_result!(ctx.cli.format,
        json => {
            let output = serde_json::json!({
                "status": "ok",
                "store": store,
                "schema": report,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
            Ok::<(), StoreError>(())
        },
        human => {
            match report {
                Some(report) => match report.from_version {
                    Some(from) if from != report.to_version => println!(
                        "Store at {} {} (schema {} -> {})",
                        store, report.status, from, report.to_version
                    ),
                    _ => println!(
                        "Store at {} {} (schema {})",
                        store, report.status, report.to_version
                    ),
                },
                None => println!("Store at {} opened without schema check", store),
            }
        }
    )?;

    Ok(())
}
