//! CLI argument parsing for notestore
//!
//! Global flags select the store, engine and output; each subcommand maps to
//! one adapter operation.

pub mod format;
pub mod parse;
pub mod paths;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use notestore_core::config::EngineKind;
use notestore_core::format::OutputFormat;
use parse::{parse_engine, parse_format};

/// notestore - persistent SQLite index for notes, tags and frontmatter
#[derive(Parser, Debug)]
#[command(name = "notestore")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Store file (overrides `store_path` from the config file)
    #[arg(long, global = true, env = "NOTESTORE_DB")]
    pub db: Option<PathBuf>,

    /// Configuration file
    #[arg(long, global = true, env = "NOTESTORE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Engine backend: embedded or cli
    #[arg(long, global = true, value_parser = parse_engine)]
    pub engine: Option<EngineKind>,

    /// Per-call engine timeout in milliseconds
    #[arg(long, global = true, value_parser = clap::value_parser!(u64).range(1..))]
    pub timeout_ms: Option<u64>,

    /// Output format
    #[arg(long, global = true, value_parser = parse_format, default_value = "human")]
    pub format: OutputFormat,

    /// Suppress non-essential output
    #[arg(long, short, global = true)]
    pub quiet: bool,

    /// Enable debug logging
    #[arg(long, short, global = true)]
    pub verbose: bool,

    /// Log filter (e.g. `debug` or `notestore_core=trace`)
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create or upgrade the store schema
    Init,

    /// Upsert notes from a JSON record or array of records
    Update {
        /// Input file, or `-` for stdin
        #[arg(default_value = "-")]
        input: String,
    },

    /// Upsert notes from newline-delimited JSON, one update per line
    Import {
        /// Input file, or `-` for stdin
        #[arg(default_value = "-")]
        input: String,
    },

    /// Remove a note with its tags and frontmatter
    Delete {
        /// Note path
        path: String,
    },

    /// Record that a note was opened now
    Touch {
        /// Note path
        path: String,
    },

    /// Show a stored note
    Show {
        /// Note path
        path: String,
    },

    /// Show schema version and note count
    Status,
}
