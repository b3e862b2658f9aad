//! Error types and exit codes for notestore
//!
//! Exit codes:
//! - 0: Success
//! - 1: Generic failure (engine, I/O, timeouts)
//! - 2: Usage error (bad flags/args, invalid input records)
//! - 3: Data/store error (unusable store, missing note, broken migration registry)

mod macros;

use std::path::PathBuf;
use thiserror::Error;

/// Exit codes for the notestore CLI
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    /// Success (0)
    Success = 0,
    /// Generic failure (1)
    Failure = 1,
    /// Usage error - bad flags/args (2)
    Usage = 2,
    /// Data/store error (3)
    Data = 3,
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> i32 {
        code as i32
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        let code = match &err {
            rusqlite::Error::SqliteFailure(e, _) => Some(e.extended_code),
            _ => None,
        };
        StoreError::Process {
            code,
            stderr: err.to_string(),
        }
    }
}

/// Errors that can occur during notestore operations
#[derive(Error, Debug)]
pub enum StoreError {
    // Usage errors (exit code 2)
    #[error("unknown format: {0} (expected: human or json)")]
    UnknownFormat(String),

    #[error("{0}")]
    UsageError(String),

    #[error("invalid {context}: {value}")]
    InvalidValue { context: String, value: String },

    // Data/store errors (exit code 3)
    #[error("store path not configured (pass --db or set store_path in {config:?})")]
    StoreNotConfigured { config: Option<PathBuf> },

    #[error("invalid store: {reason}")]
    InvalidStore { reason: String },

    #[error("note not found: {path}")]
    NoteNotFound { path: String },

    #[error("missing migration step for schema version {version}")]
    MissingMigration { version: i64 },

    #[error("invalid migration registry: {reason}")]
    InvalidMigrations { reason: String },

    // Engine failures (exit code 1)
    #[error("engine call timed out after {timeout_ms} ms")]
    Timeout { timeout_ms: u64 },

    #[error("engine process failed (exit code {code:?}): {stderr}")]
    Process { code: Option<i32>, stderr: String },

    #[error("failed to parse engine output: {reason}")]
    Parse { reason: String },

    #[error("write queue is closed")]
    QueueClosed,

    #[error("interrupted")]
    Interrupted,

    // Generic failures (exit code 1)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("failed to {operation}: {reason}")]
    FailedOperation { operation: String, reason: String },

    #[error("{0}")]
    Other(String),
}

impl StoreError {
    /// Create an error for a failed database operation
    pub fn db_operation(operation: &str, error: impl std::fmt::Display) -> Self {
        StoreError::FailedOperation {
            operation: operation.to_string(),
            reason: error.to_string(),
        }
    }

    /// Create an error for an invalid value or configuration
    pub fn invalid_value(context: &str, value: impl std::fmt::Display) -> Self {
        StoreError::InvalidValue {
            context: context.to_string(),
            value: value.to_string(),
        }
    }

    /// Create an error for engine output that could not be decoded
    pub fn parse(reason: impl std::fmt::Display) -> Self {
        StoreError::Parse {
            reason: reason.to_string(),
        }
    }

    /// Whether the engine reported that the store file itself is unusable.
    ///
    /// Such stores are deleted and recreated during initialization.
    pub fn is_corruption(&self) -> bool {
        match self {
            StoreError::Process { stderr, .. } | StoreError::InvalidStore { reason: stderr } => {
                let lower = stderr.to_lowercase();
                lower.contains("not a database")
                    || lower.contains("malformed")
                    || lower.contains("corrupt")
            }
            _ => false,
        }
    }

    /// Get the appropriate exit code for this error
    pub fn exit_code(&self) -> ExitCode {
        match self {
            StoreError::UnknownFormat(_)
            | StoreError::UsageError(_)
            | StoreError::InvalidValue { .. } => ExitCode::Usage,

            StoreError::StoreNotConfigured { .. }
            | StoreError::InvalidStore { .. }
            | StoreError::NoteNotFound { .. }
            | StoreError::MissingMigration { .. }
            | StoreError::InvalidMigrations { .. } => ExitCode::Data,

            StoreError::Timeout { .. }
            | StoreError::Process { .. }
            | StoreError::Parse { .. }
            | StoreError::QueueClosed
            | StoreError::Interrupted
            | StoreError::Io(_)
            | StoreError::Json(_)
            | StoreError::Toml(_)
            | StoreError::FailedOperation { .. }
            | StoreError::Other(_) => ExitCode::Failure,
        }
    }

    /// Get the error type identifier
    fn error_type(&self) -> &'static str {
        match self {
            StoreError::UnknownFormat(_) => "unknown_format",
            StoreError::UsageError(_) => "usage_error",
            StoreError::InvalidValue { .. } => "invalid_value",
            StoreError::StoreNotConfigured { .. } => "store_not_configured",
            StoreError::InvalidStore { .. } => "invalid_store",
            StoreError::NoteNotFound { .. } => "note_not_found",
            StoreError::MissingMigration { .. } => "missing_migration",
            StoreError::InvalidMigrations { .. } => "invalid_migrations",
            StoreError::Timeout { .. } => "timeout",
            StoreError::Process { .. } => "process_error",
            StoreError::Parse { .. } => "parse_error",
            StoreError::QueueClosed => "queue_closed",
            StoreError::Interrupted => "interrupted",
            StoreError::Io(_) => "io_error",
            StoreError::Json(_) => "json_error",
            StoreError::Toml(_) => "toml_error",
            StoreError::FailedOperation { .. } => "failed_operation",
            StoreError::Other(_) => "other",
        }
    }

    /// Convert error to JSON representation for structured error output.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "error": {
                "code": self.exit_code() as i32,
                "type": self.error_type(),
                "message": self.to_string(),
            }
        })
    }
}

/// Result type alias for notestore operations
pub type Result<T> = std::result::Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes() {
        assert_eq!(
            StoreError::UsageError("bad".into()).exit_code(),
            ExitCode::Usage
        );
        assert_eq!(
            StoreError::MissingMigration { version: 3 }.exit_code(),
            ExitCode::Data
        );
        assert_eq!(
            StoreError::Timeout { timeout_ms: 10 }.exit_code(),
            ExitCode::Failure
        );
    }

    #[test]
    fn test_corruption_detection() {
        let err = StoreError::Process {
            code: Some(26),
            stderr: "Error: file is not a database".to_string(),
        };
        assert!(err.is_corruption());

        let err = StoreError::Process {
            code: Some(1),
            stderr: "no such table: note".to_string(),
        };
        assert!(!err.is_corruption());
        assert!(!StoreError::Timeout { timeout_ms: 1 }.is_corruption());
    }

    #[test]
    fn test_to_json_envelope() {
        let json = StoreError::Parse {
            reason: "expected value".into(),
        }
        .to_json();
        assert_eq!(json["error"]["type"], "parse_error");
        assert_eq!(json["error"]["code"], 1);
        assert!(json["error"]["message"]
            .as_str()
            .unwrap()
            .contains("expected value"));
    }
}
