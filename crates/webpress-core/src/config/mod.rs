//! Configuration management for webpress.
//!
//! Configuration is loaded from a platform config directory with sensible
//! defaults, then overlaid with a small set of environment variables that
//! match how the service is deployed (`WEBPRESS_API_KEYS`,
//! `WEBPRESS_CACHE_DIR`, `WEBPRESS_PORT`). The resulting value is passed
//! explicitly into the normalizer, cache, and gate constructors — nothing
//! reads configuration ambiently at call time.

mod types;
mod validate;

pub use types::*;

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Root configuration structure for webpress.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// HTTP server settings
    pub server: ServerConfig,

    /// Encoding defaults
    pub encoding: EncodingConfig,

    /// Result cache settings
    pub cache: CacheConfig,

    /// Logging settings
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from the default location, apply env overrides.
    ///
    /// Returns default configuration if the file doesn't exist.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::default_path();
        let mut config = if path.exists() {
            Self::load_from(&path)?
        } else {
            Self::default()
        };
        config.overlay_env();
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Get the default config file path.
    ///
    /// Uses platform-appropriate directories, falling back to
    /// ~/.webpress/config.toml if directory detection fails.
    pub fn default_path() -> PathBuf {
        directories::ProjectDirs::from("com", "webpress", "webpress")
            .map(|dirs| dirs.config_dir().to_path_buf().join("config.toml"))
            .unwrap_or_else(|| {
                let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
                PathBuf::from(home).join(".webpress").join("config.toml")
            })
    }

    /// Overlay deployment environment variables onto the loaded file.
    fn overlay_env(&mut self) {
        if let Ok(keys) = std::env::var("WEBPRESS_API_KEYS") {
            self.server.api_keys = keys
                .split(',')
                .map(str::trim)
                .filter(|k| !k.is_empty())
                .map(String::from)
                .collect();
        }
        if let Ok(dir) = std::env::var("WEBPRESS_CACHE_DIR") {
            self.cache.dir = dir;
        }
        if let Ok(port) = std::env::var("WEBPRESS_PORT") {
            if let Ok(port) = port.parse() {
                self.server.port = port;
            }
        }
    }

    /// Get the resolved cache directory (with ~ expansion), if configured.
    pub fn cache_dir(&self) -> Option<PathBuf> {
        if self.cache.dir.is_empty() {
            return None;
        }
        let expanded = shellexpand::tilde(&self.cache.dir);
        Some(PathBuf::from(expanded.into_owned()))
    }

    /// Serialize the config to a pretty TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::ValidationError(e.to_string()))
    }
}
