use assert_cmd::{cargo::cargo_bin_cmd, Command};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Get a Command for notestore with no config file or store from the
/// environment
pub fn notestore() -> Command {
    let mut cmd = cargo_bin_cmd!("notestore");
    cmd.env_remove("NOTESTORE_DB")
        .env_remove("NOTESTORE_CONFIG")
        .env_remove("NOTESTORE_LOG")
        .env_remove("RUST_LOG");
    cmd
}

/// A notestore command bound to `db`
pub fn notestore_at(db: &Path) -> Command {
    let mut cmd = notestore();
    cmd.arg("--db").arg(db);
    cmd
}

/// Temporary directory holding a store file path (not yet created)
pub fn temp_store() -> (TempDir, PathBuf) {
    let dir = tempfile::tempdir().expect("create temp dir");
    let db = dir.path().join("notes.db");
    (dir, db)
}

/// Parse a command's stdout as JSON
#[allow(dead_code)]
pub fn stdout_json(output: &std::process::Output) -> serde_json::Value {
    serde_json::from_slice(&output.stdout).expect("stdout is JSON")
}
