//! `notestore import` command - stream newline-delimited records
//!
//! Each line is enqueued as its own update as soon as it is read. Ctrl-C
//! stops reading; updates already enqueued are still applied before exit.

use std::io::BufRead;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use notestore_core::error::{Result, StoreError};
use notestore_core::record::NoteRecord;

use crate::commands::dispatch::command::CommandContext;
use crate::commands::dispatch::trace_command;
use crate::commands::helpers::open_lines;
use crate::output_by_format_result;

fn parse_line(line: &str, line_no: usize) -> Result<NoteRecord> {
    let record: NoteRecord = serde_json::from_str(line)
        .map_err(|e| StoreError::invalid_value(&format!("record on line {}", line_no), e))?;
    record.validate()?;
    Ok(record)
}

/// Execute the import command
pub fn execute(ctx: &CommandContext, input: &str) -> Result<()> {
    let interrupted = Arc::new(AtomicBool::new(false));
    let interrupted_clone = Arc::clone(&interrupted);

    if let Err(e) = ctrlc::set_handler(move || {
        interrupted_clone.store(true, Ordering::SeqCst);
    }) {
        tracing::warn!(error = %e, "failed to install interrupt handler");
    }

    let reader = open_lines(input)?;
    let index = ctx.open_index()?;

    let mut pending = Vec::new();
    let mut stopped: Option<StoreError> = None;

    for (i, line) in reader.lines().enumerate() {
        if interrupted.load(Ordering::SeqCst) {
            tracing::info!(read = pending.len(), "import interrupted, draining queue");
            stopped = Some(StoreError::Interrupted);
            break;
        }

        let line = match line {
            Ok(line) => line,
            Err(e) => {
                stopped = Some(e.into());
                break;
            }
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        match parse_line(line, i + 1) {
            Ok(record) => {
                let path = record.path.clone();
                pending.push((path, index.update_note(record)));
            }
            Err(e) => {
                stopped = Some(e);
                break;
            }
        }
    }
    trace_command!(ctx.cli, ctx.start, "import_read");

    let total = pending.len();
    let mut failed = Vec::new();
    for (path, op) in pending {
        if let Err(e) = op.wait() {
            tracing::warn!(path = %path, error = %e, "import update failed");
            failed.push(path);
        }
    }
    index.shutdown()?;
    trace_command!(ctx.cli, ctx.start, "import_drain");

    let imported = total - failed.len();

    output_by_format_result!(ctx.cli.format,
        json => {
            let output = serde_json::json!({
                "status": if stopped.is_none() && failed.is_empty() { "ok" } else { "partial" },
                "imported": imported,
                "failed": failed,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
            Ok::<(), StoreError>(())
        },
        human => {
            if !ctx.cli.quiet {
                println!("Imported {} note(s)", imported);
            }
            for path in &failed {
                eprintln!("failed: {}", path);
            }
        }
    )?;

    if let Some(e) = stopped {
        return Err(e);
    }
    if !failed.is_empty() {
        return Err(StoreError::FailedOperation {
            operation: "import notes".to_string(),
            reason: format!("{} of {} updates failed", failed.len(), total),
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_line_reports_line_number() {
        let err = parse_line("{oops", 7).unwrap_err();
        assert!(err.to_string().contains("line 7"));
        assert_eq!(err.exit_code(), notestore_core::error::ExitCode::Usage);
    }

    #[test]
    fn test_parse_line_validates_path() {
        assert!(parse_line(r#"{"path":"","title":"x"}"#, 1).is_err());
        let record = parse_line(r##"{"path":"a.md","title":"A","tags":["#x"]}"##, 1).unwrap();
        assert_eq!(record.tags, vec!["#x".to_string()]);
    }
}
