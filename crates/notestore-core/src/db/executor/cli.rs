//! `sqlite3` shell backend: one process per call

use std::io::{ErrorKind, Read, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::thread::{self, JoinHandle};
use std::time::Instant;

use wait_timeout::ChildExt;

use super::{parse_rows, CommandExecutor, ExecOutput, ResultMode, RunOptions};
use crate::error::{Result, StoreError};
use crate::trace_time;

/// Sent before every script; foreign keys are a per-connection setting and
/// each process is a new connection
const DEFAULT_PREAMBLE: &str = "PRAGMA foreign_keys = ON;";

/// Starts the engine's command-line shell for every call
#[derive(Debug, Clone)]
pub struct CliExecutor {
    program: String,
    args: Vec<String>,
    store_path: PathBuf,
    exit_directive: String,
    preamble: Option<String>,
    log_statements: bool,
}

impl CliExecutor {
    pub fn new(program: impl Into<String>, store_path: &Path) -> Self {
        Self {
            program: program.into(),
            args: vec!["-bail".to_string()],
            store_path: store_path.to_path_buf(),
            exit_directive: ".exit".to_string(),
            preamble: Some(DEFAULT_PREAMBLE.to_string()),
            log_statements: false,
        }
    }

    /// Arguments placed before the store path
    pub fn with_args<I>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        self.args = args.into_iter().collect();
        self
    }

    pub fn with_exit_directive(mut self, directive: &str) -> Self {
        self.exit_directive = directive.to_string();
        self
    }

    /// Replace (or drop with `None`) the statements sent ahead of each script
    pub fn with_preamble(mut self, preamble: Option<&str>) -> Self {
        self.preamble = preamble.map(str::to_string);
        self
    }

    pub fn with_statement_logging(mut self, enabled: bool) -> Self {
        self.log_statements = enabled;
        self
    }

    fn input_for(&self, script: &str) -> Vec<u8> {
        let mut input = String::new();
        if let Some(preamble) = &self.preamble {
            input.push_str(preamble);
            input.push('\n');
        }
        input.push_str(script.trim_end());
        input.push('\n');
        input.push_str(&self.exit_directive);
        input.push('\n');
        input.into_bytes()
    }

    fn spawn(&self, mode: ResultMode) -> Result<Child> {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);
        if mode == ResultMode::Structured {
            cmd.arg("-json");
        }
        cmd.arg(&self.store_path)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        cmd.spawn().map_err(|e| StoreError::Process {
            code: None,
            stderr: format!("failed to start {}: {}", self.program, e),
        })
    }
}

impl CommandExecutor for CliExecutor {
    fn run(&mut self, script: &str, options: &RunOptions) -> Result<ExecOutput> {
        let start = Instant::now();
        if self.log_statements {
            tracing::debug!(script, program = %self.program, "cli_script");
        }

        let mut child = self.spawn(options.result_mode)?;
        let stdout = spawn_reader(child.stdout.take())?;
        let stderr = spawn_reader(child.stderr.take())?;
        spawn_writer(child.stdin.take(), self.input_for(script))?;

        let status = match child.wait_timeout(options.timeout)? {
            Some(status) => status,
            None => {
                // Reader threads are left to finish on their own; a killed
                // shell may leave children holding the pipes open
                let _ = child.kill();
                let _ = child.wait();
                tracing::warn!(
                    program = %self.program,
                    timeout_ms = options.timeout_ms(),
                    "engine process killed after timeout"
                );
                return Err(StoreError::Timeout {
                    timeout_ms: options.timeout_ms(),
                });
            }
        };

        let stdout = collect(stdout);
        let stderr = collect(stderr);
        trace_time!(start, "cli_run", code = status.code().unwrap_or(-1));

        let stderr = stderr.trim().to_string();
        if !status.success() || reports_bad_store(&stderr) {
            return Err(StoreError::Process {
                code: status.code(),
                stderr,
            });
        }
        if !stderr.is_empty() {
            tracing::debug!(stderr = %stderr, "engine wrote to stderr");
        }

        let text = stdout.trim();
        match options.result_mode {
            ResultMode::Text => Ok(ExecOutput::Text(text.to_string())),
            ResultMode::Structured => parse_rows(text).map(ExecOutput::Rows),
        }
    }

    fn describe(&self) -> String {
        format!("{} {}", self.program, self.store_path.display())
    }
}

/// The shell exits cleanly on some store-level failures and only says so
/// on stderr
fn reports_bad_store(stderr: &str) -> bool {
    let lower = stderr.to_lowercase();
    lower.contains("not a database") || lower.contains("malformed")
}

fn spawn_reader<R>(source: Option<R>) -> Result<Option<JoinHandle<String>>>
where
    R: Read + Send + 'static,
{
    let Some(mut source) = source else {
        return Ok(None);
    };
    let handle = thread::Builder::new()
        .name("notestore-cli-reader".to_string())
        .spawn(move || {
            let mut buf = Vec::new();
            let _ = source.read_to_end(&mut buf);
            String::from_utf8_lossy(&buf).into_owned()
        })?;
    Ok(Some(handle))
}

fn spawn_writer<W>(sink: Option<W>, input: Vec<u8>) -> Result<()>
where
    W: Write + Send + 'static,
{
    let Some(mut sink) = sink else {
        return Ok(());
    };
    thread::Builder::new()
        .name("notestore-cli-writer".to_string())
        .spawn(move || {
            // The exit status decides the outcome; a shell that stops
            // reading early closes the pipe
            if let Err(e) = sink.write_all(&input) {
                if e.kind() != ErrorKind::BrokenPipe {
                    tracing::debug!(error = %e, "failed to write script to engine");
                }
            }
        })?;
    Ok(())
}

fn collect(handle: Option<JoinHandle<String>>) -> String {
    handle
        .map(|h| h.join().unwrap_or_default())
        .unwrap_or_default()
}
