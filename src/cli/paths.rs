//! Store configuration resolution for CLI commands
//!
//! The config file supplies defaults; `--db`, `--engine` and `--timeout-ms`
//! override it.

use std::path::PathBuf;

use notestore_core::config::{default_config_path, StoreConfig};
use notestore_core::error::Result;

use super::Cli;

/// Load the configuration named by `--config` (or the default file) and
/// apply command-line overrides.
pub fn resolve_config(cli: &Cli) -> Result<StoreConfig> {
    let mut config = StoreConfig::load_or_default(cli.config.as_deref())?;

    if let Some(db) = &cli.db {
        config.store_path = Some(db.clone());
    }
    if let Some(engine) = cli.engine {
        config.engine = engine;
    }
    if let Some(timeout_ms) = cli.timeout_ms {
        config.timeout_ms = timeout_ms;
    }

    Ok(config)
}

/// Config file reported when the store path is missing
pub fn config_file_hint(cli: &Cli) -> Option<PathBuf> {
    cli.config.clone().or_else(default_config_path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use notestore_core::config::EngineKind;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_flags_override_config_file() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("config.toml");
        fs::write(
            &config_path,
            "store_path = \"from-file.db\"\nengine = \"cli\"\ntimeout_ms = 900\n",
        )
        .unwrap();
        let config_arg = config_path.to_string_lossy().into_owned();
        let config_arg = config_arg.as_str();

        let cli = Cli::try_parse_from(["notestore", "--config", config_arg, "status"]).unwrap();
        let config = resolve_config(&cli).unwrap();
        assert_eq!(config.store_path, Some(PathBuf::from("from-file.db")));
        assert_eq!(config.engine, EngineKind::Cli);
        assert_eq!(config.timeout_ms, 900);

        let cli = Cli::try_parse_from([
            "notestore",
            "--config",
            config_arg,
            "--db",
            "flag.db",
            "--engine",
            "embedded",
            "--timeout-ms",
            "50",
            "status",
        ])
        .unwrap();
        let config = resolve_config(&cli).unwrap();
        assert_eq!(config.store_path, Some(PathBuf::from("flag.db")));
        assert_eq!(config.engine, EngineKind::Embedded);
        assert_eq!(config.timeout_ms, 50);
    }

    #[test]
    fn test_missing_config_file_is_an_error() {
        let cli = Cli::try_parse_from([
            "notestore",
            "--config",
            "/nonexistent/notestore.toml",
            "status",
        ])
        .unwrap();
        assert!(resolve_config(&cli).is_err());
    }
}
