//! `notestore show` command - display a stored note

use std::collections::BTreeMap;

use notestore_core::error::{Result, StoreError};

use crate::commands::dispatch::command::CommandContext;
use crate::output_by_format_result;

/// Execute the show command
pub fn execute(ctx: &CommandContext, path: &str) -> Result<()> {
    let index = ctx.open_index()?;
    let note = index
        .get_note(path)?
        .ok_or_else(|| StoreError::NoteNotFound {
            path: path.to_string(),
        })?;
    let tags = index.tags_for(path)?;
    let frontmatter = index.frontmatter_for(path)?;
    index.shutdown()?;

    let tag_names: Vec<&str> = tags.iter().map(|t| t.tag_name.as_str()).collect();
    let fields: BTreeMap<&str, &str> = frontmatter
        .iter()
        .map(|f| (f.frontmatter_name.as_str(), f.frontmatter_value.as_str()))
        .collect();

    output_by_format_result!(ctx.cli.format,
        json => {
            let output = serde_json::json!({
                "note": note,
                "tags": tag_names,
                "frontmatter": fields,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
            Ok::<(), StoreError>(())
        },
        human => {
            println!("{}", note.path);
            println!("  title: {}", note.title);
            println!("  created: {}", note.created);
            println!("  last modified: {}", note.last_modified);
            if let Some(opened) = note.last_opened {
                println!("  last opened: {}", opened);
            }
            if !tag_names.is_empty() {
                println!("  tags: {}", tag_names.join(", "));
            }
            for (name, value) in &fields {
                println!("  {}: {}", name, value);
            }
        }
    )?;

    Ok(())
}
