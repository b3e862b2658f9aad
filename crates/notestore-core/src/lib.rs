//! Notestore Core Library
//!
//! Persistent store adapter for notes: schema versioning, statement
//! generation and a serialized write queue over a SQLite engine.

pub mod config;
pub mod db;
pub mod error;
pub mod format;
pub mod logging;
pub mod record;
