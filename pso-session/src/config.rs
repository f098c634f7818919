//! Server-side session configuration.
//!
//! ```toml
//! storage_root = "/var/lib/newserv"
//! level_table = "system/level-table.toml"
//!
//! [logging]
//! level = "info,pso_records=debug"
//! format = "json"
//!
//! [store]
//! save_to_filesystem = true
//! ```

use std::path::{Path, PathBuf};

use pso_records::StoreConfig;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SessionError};

/// Top-level session settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionConfig {
    /// Directory every record key is resolved against.
    #[serde(default = "default_storage_root")]
    pub storage_root: PathBuf,
    /// Optional base-stats table used for character creation.
    #[serde(default)]
    pub level_table: Option<PathBuf>,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Record store settings.
    #[serde(default)]
    pub store: StoreConfig,
}

/// Output format of the log subscriber.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Pretty,
    /// One JSON object per event.
    Json,
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LoggingConfig {
    /// `EnvFilter` directive string. `RUST_LOG` overrides it when set.
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Output format.
    #[serde(default)]
    pub format: LogFormat,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            storage_root: default_storage_root(),
            level_table: None,
            logging: LoggingConfig::default(),
            store: StoreConfig::default(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

impl SessionConfig {
    /// Parse settings from TOML.
    ///
    /// # Errors
    /// [`SessionError::Config`] if the TOML is invalid.
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        toml::from_str(toml_str).map_err(|e| SessionError::Config(e.to_string()))
    }

    /// Load settings from a TOML file.
    ///
    /// # Errors
    /// [`SessionError::Config`] if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| SessionError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml(&content)
    }
}

fn default_storage_root() -> PathBuf {
    PathBuf::from(".")
}

fn default_log_level() -> String {
    "info".to_string()
}
