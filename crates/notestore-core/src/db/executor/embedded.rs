//! In-process SQLite backend

use std::path::{Path, PathBuf};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam_channel::{bounded, RecvTimeoutError, Sender};
use rusqlite::fallible_iterator::FallibleIterator;
use rusqlite::types::ValueRef;
use rusqlite::{Batch, Connection, ErrorCode, InterruptHandle};
use serde_json::{Map, Value};

use super::{CommandExecutor, ExecOutput, ResultMode, RunOptions};
use crate::error::{Result, StoreError};
use crate::trace_time;

/// Executes scripts on one persistent connection
pub struct EmbeddedExecutor {
    conn: Connection,
    path: Option<PathBuf>,
    log_statements: bool,
}

impl std::fmt::Debug for EmbeddedExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmbeddedExecutor")
            .field("path", &self.path)
            .finish()
    }
}

impl EmbeddedExecutor {
    /// Open (or create) the store file
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;

        // Touches the file header, so a file that is not a database fails
        // here rather than on the first query
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "foreign_keys", true)?;

        Ok(Self {
            conn,
            path: Some(path.to_path_buf()),
            log_statements: false,
        })
    }

    /// Private in-memory store
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.pragma_update(None, "foreign_keys", true)?;
        Ok(Self {
            conn,
            path: None,
            log_statements: false,
        })
    }

    pub fn with_statement_logging(mut self, enabled: bool) -> Self {
        self.log_statements = enabled;
        self
    }

    fn execute(&self, script: &str, mode: ResultMode) -> rusqlite::Result<ExecOutput> {
        let mut lines = Vec::new();
        let mut rows = Vec::new();
        let mut batch = Batch::new(&self.conn, script);

        while let Some(mut stmt) = batch.next()? {
            let names: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
            let mut result = stmt.query([])?;

            while let Some(row) = result.next()? {
                match mode {
                    ResultMode::Text => {
                        let mut fields = Vec::with_capacity(names.len());
                        for i in 0..names.len() {
                            fields.push(render_text(row.get_ref(i)?));
                        }
                        lines.push(fields.join("|"));
                    }
                    ResultMode::Structured => {
                        let mut object = Map::with_capacity(names.len());
                        for (i, name) in names.iter().enumerate() {
                            object.insert(name.clone(), render_json(row.get_ref(i)?));
                        }
                        rows.push(Value::Object(object));
                    }
                }
            }
        }

        Ok(match mode {
            ResultMode::Text => ExecOutput::Text(lines.join("\n").trim().to_string()),
            ResultMode::Structured => ExecOutput::Rows(rows),
        })
    }

    /// A failed statement can leave the script's transaction open; the next
    /// script must start from autocommit.
    fn rollback_if_needed(&self) {
        if !self.conn.is_autocommit() {
            if let Err(e) = self.conn.execute_batch("ROLLBACK;") {
                tracing::warn!(error = %e, "failed to roll back after engine error");
            }
        }
    }
}

impl CommandExecutor for EmbeddedExecutor {
    fn run(&mut self, script: &str, options: &RunOptions) -> Result<ExecOutput> {
        let start = Instant::now();
        if self.log_statements {
            tracing::debug!(script, "embedded_script");
        }

        self.conn.busy_timeout(options.timeout)?;
        let watchdog = Watchdog::arm(self.conn.get_interrupt_handle(), options.timeout)?;
        let result = self.execute(script, options.result_mode);
        let fired = watchdog.disarm();

        trace_time!(start, "embedded_run");

        match result {
            Ok(output) => Ok(output),
            Err(e) => {
                self.rollback_if_needed();
                if fired || is_interrupt(&e) {
                    tracing::warn!(timeout_ms = options.timeout_ms(), "embedded call timed out");
                    Err(StoreError::Timeout {
                        timeout_ms: options.timeout_ms(),
                    })
                } else {
                    Err(e.into())
                }
            }
        }
    }

    fn describe(&self) -> String {
        match &self.path {
            Some(p) => format!("embedded sqlite at {}", p.display()),
            None => "embedded sqlite (in memory)".to_string(),
        }
    }
}

impl Drop for EmbeddedExecutor {
    fn drop(&mut self) {
        // Fold the WAL back into the main file so other readers see a
        // complete store once the adapter is gone
        if self.path.is_some() {
            let _ = self.conn.pragma_update(None, "wal_checkpoint", "TRUNCATE");
        }
    }
}

fn is_interrupt(err: &rusqlite::Error) -> bool {
    matches!(err, rusqlite::Error::SqliteFailure(e, _) if e.code == ErrorCode::OperationInterrupted)
}

fn render_text(value: ValueRef<'_>) -> String {
    match value {
        ValueRef::Null => String::new(),
        ValueRef::Integer(i) => i.to_string(),
        ValueRef::Real(f) => f.to_string(),
        ValueRef::Text(t) | ValueRef::Blob(t) => String::from_utf8_lossy(t).into_owned(),
    }
}

fn render_json(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::from(i),
        ValueRef::Real(f) => serde_json::Number::from_f64(f)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        ValueRef::Text(t) | ValueRef::Blob(t) => {
            Value::String(String::from_utf8_lossy(t).into_owned())
        }
    }
}

/// Interrupts the connection if a call outlives its timeout
struct Watchdog {
    done: Option<Sender<()>>,
    handle: JoinHandle<bool>,
}

impl Watchdog {
    fn arm(interrupt: InterruptHandle, timeout: Duration) -> Result<Self> {
        let (done, rx) = bounded::<()>(0);
        let handle = thread::Builder::new()
            .name("notestore-watchdog".to_string())
            .spawn(move || match rx.recv_timeout(timeout) {
                Err(RecvTimeoutError::Timeout) => {
                    interrupt.interrupt();
                    true
                }
                _ => false,
            })?;

        Ok(Self {
            done: Some(done),
            handle,
        })
    }

    /// Stop the watchdog; true if it interrupted the call
    fn disarm(mut self) -> bool {
        drop(self.done.take());
        self.handle.join().unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exec() -> EmbeddedExecutor {
        EmbeddedExecutor::open_in_memory().unwrap()
    }

    fn opts() -> RunOptions {
        RunOptions::text(Duration::from_secs(5))
    }

    #[test]
    fn test_text_mode_renders_rows() {
        let mut e = exec();
        let out = e
            .run(
                "CREATE TABLE t (a INTEGER, b TEXT, c REAL);\
                 INSERT INTO t VALUES (1, 'x', NULL), (2, 'y', 1.5);\
                 SELECT a, b, c FROM t ORDER BY a;",
                &opts(),
            )
            .unwrap();
        assert_eq!(out, ExecOutput::Text("1|x|\n2|y|1.5".to_string()));
    }

    #[test]
    fn test_structured_mode_collects_objects() {
        let mut e = exec();
        let out = e
            .run(
                "CREATE TABLE t (a INTEGER, b TEXT); INSERT INTO t VALUES (1, 'x'); SELECT a, b FROM t;",
                &RunOptions::structured(Duration::from_secs(5)),
            )
            .unwrap();
        assert_eq!(
            out,
            ExecOutput::Rows(vec![serde_json::json!({"a": 1, "b": "x"})])
        );
    }

    #[test]
    fn test_engine_error_is_process_error() {
        let mut e = exec();
        let err = e.run("SELECT * FROM missing;", &opts()).unwrap_err();
        match err {
            StoreError::Process { stderr, .. } => assert!(stderr.contains("missing")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_failed_script_rolls_back() {
        let mut e = exec();
        e.run("CREATE TABLE t (a INTEGER PRIMARY KEY);", &opts())
            .unwrap();
        let err = e.run(
            "BEGIN; INSERT INTO t VALUES (1); INSERT INTO t VALUES (1); COMMIT;",
            &opts(),
        );
        assert!(err.is_err());

        // The half-applied transaction is gone and a new one can start
        let out = e
            .run("BEGIN; SELECT COUNT(*) FROM t; COMMIT;", &opts())
            .unwrap();
        assert_eq!(out.into_text(), "0");
    }

    #[test]
    fn test_long_query_times_out() {
        let mut e = exec();
        let err = e
            .run(
                "WITH RECURSIVE c(x) AS (SELECT 1 UNION ALL SELECT x + 1 FROM c) \
                 SELECT COUNT(*) FROM c;",
                &RunOptions::text(Duration::from_millis(100)),
            )
            .unwrap_err();
        assert!(matches!(err, StoreError::Timeout { timeout_ms: 100 }));

        // Connection stays usable
        let out = e.run("SELECT 1;", &opts()).unwrap();
        assert_eq!(out.into_text(), "1");
    }

    #[test]
    fn test_not_a_database_is_corruption() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.db");
        std::fs::write(&path, b"this is definitely not a sqlite file, just text").unwrap();

        let err = EmbeddedExecutor::open(&path).unwrap_err();
        assert!(err.is_corruption(), "unexpected error: {err:?}");
    }
}
