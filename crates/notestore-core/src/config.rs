//! Store adapter configuration for notestore
//!
//! Configuration is read from a TOML file, by default
//! `<config dir>/notestore/config.toml`. Every field has a default, so an
//! empty file is a valid configuration.

pub mod types;

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Result, StoreError};

pub use types::{EngineKind, StoreConfig, DEFAULT_TIMEOUT_MS};

impl StoreConfig {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: StoreConfig = toml::from_str(&content)?;

        if config.timeout_ms == 0 {
            return Err(StoreError::invalid_value("timeout_ms", 0));
        }

        Ok(config)
    }

    /// Load configuration from `path`, or from the default location if it
    /// exists, or fall back to defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => Self::load(p),
            None => match default_config_path() {
                Some(p) if p.exists() => Self::load(&p),
                _ => Ok(Self::default()),
            },
        }
    }

    /// Save configuration to a file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| StoreError::Other(format!("failed to serialize config: {}", e)))?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, content)?;
        Ok(())
    }

    /// The configured store path, or an error naming where it was expected
    pub fn require_store_path(&self, config_file: Option<&Path>) -> Result<&Path> {
        self.store_path
            .as_deref()
            .ok_or_else(|| StoreError::StoreNotConfigured {
                config: config_file.map(Path::to_path_buf),
            })
    }
}

/// Default location of the configuration file
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("notestore").join("config.toml"))
}
