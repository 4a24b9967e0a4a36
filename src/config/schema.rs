//! Configuration schema for labelcache
//!
//! Configuration is stored at `~/.config/labelcache/config.toml`

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General settings
    pub general: GeneralConfig,

    /// Cache settings
    pub cache: CacheConfig,
}

/// General application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Enable verbose logging
    pub verbose: bool,

    /// Log format: "text" or "json"
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            verbose: false,
            log_format: "text".to_string(),
        }
    }
}

/// Cache configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Object directory (default: <data dir>/labelcache/objects)
    pub directory: Option<PathBuf>,

    /// Number of objects the directory is sized for
    pub capacity_hint: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            directory: None,
            capacity_hint: 256,
        }
    }
}

impl CacheConfig {
    /// Configured directory, or the default under the user's data dir
    pub fn resolved_directory(&self) -> PathBuf {
        self.directory
            .clone()
            .unwrap_or_else(super::ConfigManager::default_cache_dir)
    }
}
