//! Execution of SQL scripts against a store engine
//!
//! A [`CommandExecutor`] runs one script per call and either returns the
//! engine's text output or its result rows. Two backends exist:
//! [`EmbeddedExecutor`] keeps a `rusqlite` connection open for the lifetime
//! of the adapter; [`CliExecutor`] starts a `sqlite3` shell per call.

mod cli;
mod embedded;

use std::path::Path;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::config::{EngineKind, StoreConfig};
use crate::error::{Result, StoreError};

pub use cli::CliExecutor;
pub use embedded::EmbeddedExecutor;

/// How the engine's output is returned
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResultMode {
    /// Trimmed text as the engine printed it
    #[default]
    Text,
    /// Result rows as JSON objects keyed by column name
    Structured,
}

/// Per-call options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunOptions {
    pub timeout: Duration,
    pub result_mode: ResultMode,
}

impl RunOptions {
    pub fn text(timeout: Duration) -> Self {
        Self {
            timeout,
            result_mode: ResultMode::Text,
        }
    }

    pub fn structured(timeout: Duration) -> Self {
        Self {
            timeout,
            result_mode: ResultMode::Structured,
        }
    }

    pub(crate) fn timeout_ms(&self) -> u64 {
        u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX)
    }
}

/// Output of one engine call
#[derive(Debug, Clone, PartialEq)]
pub enum ExecOutput {
    Text(String),
    Rows(Vec<Value>),
}

impl ExecOutput {
    /// Text output; structured output is rendered back to JSON text
    pub fn into_text(self) -> String {
        match self {
            ExecOutput::Text(text) => text,
            ExecOutput::Rows(rows) => Value::Array(rows).to_string(),
        }
    }

    pub fn into_rows(self) -> Result<Vec<Value>> {
        match self {
            ExecOutput::Rows(rows) => Ok(rows),
            ExecOutput::Text(text) => parse_rows(&text),
        }
    }

    /// Decode every row into `T`
    pub fn decode<T: DeserializeOwned>(self) -> Result<Vec<T>> {
        let rows = self.into_rows()?;
        serde_json::from_value(Value::Array(rows)).map_err(StoreError::parse)
    }
}

/// Parse the JSON the `sqlite3` shell prints in `-json` mode.
///
/// Each statement that returns rows prints its own array; an empty string
/// means no statement returned rows.
pub fn parse_rows(text: &str) -> Result<Vec<Value>> {
    let mut rows = Vec::new();
    for chunk in serde_json::Deserializer::from_str(text).into_iter::<Vec<Value>>() {
        rows.extend(chunk.map_err(StoreError::parse)?);
    }
    Ok(rows)
}

/// Runs SQL scripts against a store.
///
/// Implementations are driven by a single thread at a time; see
/// [`crate::db::queue::WriteQueue`].
pub trait CommandExecutor: Send {
    fn run(&mut self, script: &str, options: &RunOptions) -> Result<ExecOutput>;

    /// Short description for logs
    fn describe(&self) -> String;
}

/// Build the executor selected by `config` for the store at `store_path`
pub fn open_executor(config: &StoreConfig, store_path: &Path) -> Result<Box<dyn CommandExecutor>> {
    match config.engine {
        EngineKind::Embedded => Ok(Box::new(
            EmbeddedExecutor::open(store_path)?.with_statement_logging(config.log_statements),
        )),
        EngineKind::Cli => Ok(Box::new(
            CliExecutor::new(&config.sqlite_program, store_path)
                .with_args(config.sqlite_args.iter().cloned())
                .with_exit_directive(&config.exit_directive)
                .with_preamble(Some(config.sqlite_preamble.as_str()).filter(|p| !p.is_empty()))
                .with_statement_logging(config.log_statements),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_rows_empty() {
        assert!(parse_rows("").unwrap().is_empty());
        assert!(parse_rows("  \n").unwrap().is_empty());
    }

    #[test]
    fn test_parse_rows_concatenated_arrays() {
        let rows = parse_rows("[{\"a\":1}]\n[{\"b\":2},{\"b\":3}]").unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[2]["b"], 3);
    }

    #[test]
    fn test_parse_rows_malformed() {
        assert!(matches!(
            parse_rows("[{\"a\":").unwrap_err(),
            StoreError::Parse { .. }
        ));
        assert!(matches!(
            parse_rows("version|4").unwrap_err(),
            StoreError::Parse { .. }
        ));
    }

    #[test]
    fn test_decode_rows() {
        #[derive(Debug, serde::Deserialize)]
        struct Count {
            count: i64,
        }

        let out = ExecOutput::Rows(vec![serde_json::json!({"count": 7})]);
        let decoded: Vec<Count> = out.decode().unwrap();
        assert_eq!(decoded[0].count, 7);

        let bad = ExecOutput::Rows(vec![serde_json::json!({"count": "seven"})]);
        assert!(matches!(
            bad.decode::<Count>().unwrap_err(),
            StoreError::Parse { .. }
        ));
    }

    #[cfg(unix)]
    #[test]
    fn test_cli_engine_sends_configured_preamble() {
        let shell = |preamble: &str| StoreConfig {
            engine: EngineKind::Cli,
            sqlite_program: "sh".to_string(),
            sqlite_args: vec!["-s".to_string(), "--".to_string()],
            exit_directive: "exit".to_string(),
            sqlite_preamble: preamble.to_string(),
            ..Default::default()
        };
        let opts = RunOptions::text(Duration::from_secs(5));

        let mut exec = open_executor(&shell("echo pre"), Path::new("store.db")).unwrap();
        assert_eq!(exec.run("echo ok", &opts).unwrap().into_text(), "pre\nok");

        let mut exec = open_executor(&shell(""), Path::new("store.db")).unwrap();
        assert_eq!(exec.run("echo ok", &opts).unwrap().into_text(), "ok");
    }
}
