//! Configuration for the record store.
//!
//! Maps directly to the `[store]` table of the server's TOML file.

use serde::{Deserialize, Serialize};

/// Record store settings, loadable from TOML.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StoreConfig {
    /// Directory prefix used for every record file key.
    #[serde(default = "default_player_dir")]
    pub player_dir: String,
    /// Byte budget of the shared file cache.
    #[serde(default = "default_cache_capacity")]
    pub cache_capacity_bytes: usize,
    /// Write saves through to durable storage. Disable for ephemeral or
    /// test sessions, which then persist to the cache only.
    #[serde(default = "default_true")]
    pub save_to_filesystem: bool,
    /// Accumulate wall-clock play time into player records on save.
    #[serde(default = "default_true")]
    pub update_play_time: bool,
    /// Language marker letter added to names imported from legacy clients.
    #[serde(default = "default_language_marker")]
    pub language_marker: char,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            player_dir: default_player_dir(),
            cache_capacity_bytes: default_cache_capacity(),
            save_to_filesystem: true,
            update_play_time: true,
            language_marker: default_language_marker(),
        }
    }
}

impl StoreConfig {
    /// Load configuration from a TOML string.
    ///
    /// # Errors
    /// Returns `RecordError::Config` if the TOML is invalid.
    pub fn from_toml(toml_str: &str) -> crate::error::Result<Self> {
        toml::from_str(toml_str).map_err(|e| crate::RecordError::Config(e.to_string()))
    }

    /// Load configuration from a TOML file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &std::path::Path) -> crate::error::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// An in-memory configuration: no durable writes, no play-time tracking.
    #[must_use]
    pub fn ephemeral() -> Self {
        Self {
            save_to_filesystem: false,
            update_play_time: false,
            ..Self::default()
        }
    }
}

// ---------------------------------------------------------------------------
// Serde default helpers
// ---------------------------------------------------------------------------

fn default_true() -> bool { true }
fn default_player_dir() -> String { "system/players".to_string() }
fn default_cache_capacity() -> usize { 300 * 1000 * 1000 }
fn default_language_marker() -> char { 'J' }
