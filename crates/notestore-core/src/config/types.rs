//! Configuration type definitions

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::StoreError;

/// Default engine call timeout in milliseconds
pub const DEFAULT_TIMEOUT_MS: u64 = 5000;

/// Store adapter configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Path of the SQLite store file
    #[serde(skip_serializing_if = "Option::is_none")]
    pub store_path: Option<PathBuf>,

    /// Engine backend used to execute statements
    #[serde(default)]
    pub engine: EngineKind,

    /// Program started by the `cli` engine
    #[serde(default = "default_sqlite_program")]
    pub sqlite_program: String,

    /// Arguments passed to the program before the store path
    #[serde(default = "default_sqlite_args")]
    pub sqlite_args: Vec<String>,

    /// Directive appended to every script sent to the `cli` engine
    #[serde(default = "default_exit_directive")]
    pub exit_directive: String,

    /// Statements sent ahead of every `cli` script; empty sends none
    #[serde(default = "default_sqlite_preamble")]
    pub sqlite_preamble: String,

    /// Per-call timeout in milliseconds
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Log every script at debug level
    #[serde(default)]
    pub log_statements: bool,

    /// Trust the store's schema and skip version checks on startup
    #[serde(default)]
    pub skip_schema_check: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            store_path: None,
            engine: EngineKind::default(),
            sqlite_program: default_sqlite_program(),
            sqlite_args: default_sqlite_args(),
            exit_directive: default_exit_directive(),
            sqlite_preamble: default_sqlite_preamble(),
            timeout_ms: default_timeout_ms(),
            log_statements: false,
            skip_schema_check: false,
        }
    }
}

impl StoreConfig {
    /// Per-call timeout as a duration
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Engine backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineKind {
    /// SQLite linked into the process, one persistent connection
    #[default]
    Embedded,
    /// One `sqlite3` shell process per call
    Cli,
}

impl FromStr for EngineKind {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "embedded" => Ok(EngineKind::Embedded),
            "cli" => Ok(EngineKind::Cli),
            other => Err(StoreError::invalid_value("engine", other)),
        }
    }
}

impl fmt::Display for EngineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineKind::Embedded => write!(f, "embedded"),
            EngineKind::Cli => write!(f, "cli"),
        }
    }
}

fn default_sqlite_program() -> String {
    "sqlite3".to_string()
}

fn default_sqlite_args() -> Vec<String> {
    vec!["-bail".to_string()]
}

fn default_exit_directive() -> String {
    ".exit".to_string()
}

fn default_sqlite_preamble() -> String {
    "PRAGMA foreign_keys = ON;".to_string()
}

fn default_timeout_ms() -> u64 {
    DEFAULT_TIMEOUT_MS
}
