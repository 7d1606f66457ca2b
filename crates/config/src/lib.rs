#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Configuration management for upstate
//!
//! This crate handles loading and merging configuration from:
//! - Default values (hard-coded)
//! - Configuration file (~/.config/upstate/config.toml)
//! - Environment variables
//! - CLI flags

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs;
use tracing::debug;
use upstate_errors::{ConfigError, Error};

/// Main configuration structure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub sync: SyncConfig,

    #[serde(default)]
    pub cache: CacheConfig,

    #[serde(default)]
    pub store: StoreConfig,

    #[serde(default)]
    pub rate: RateConfig,
}

/// Publishing from the receiving context
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncConfig {
    #[serde(default = "default_sync_interval_ms")]
    pub interval_ms: u64,
}

/// Grace period for finished transfers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "default_grace_secs")]
    pub grace_secs: u64,
    /// Extend the expiry on every lookup instead of counting from demotion
    #[serde(default = "default_sliding")]
    pub sliding: bool,
}

/// Keys shared by every storage tier
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default = "default_key_prefix")]
    pub key_prefix: String,
}

/// Transfer rate estimation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateConfig {
    #[serde(default = "default_window_ms")]
    pub window_ms: u64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_sync_interval_ms(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            grace_secs: default_grace_secs(),
            sliding: default_sliding(),
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            key_prefix: default_key_prefix(),
        }
    }
}

impl Default for RateConfig {
    fn default() -> Self {
        Self {
            window_ms: default_window_ms(),
        }
    }
}

// Default value functions for serde
fn default_sync_interval_ms() -> u64 {
    500
}

fn default_grace_secs() -> u64 {
    60
}

fn default_sliding() -> bool {
    true
}

fn default_key_prefix() -> String {
    "upstate_".to_string()
}

fn default_window_ms() -> u64 {
    1000
}

impl Config {
    /// Get the default config file path
    ///
    /// # Errors
    ///
    /// Returns an error if the system config directory cannot be determined.
    pub fn default_path() -> Result<PathBuf, Error> {
        let config_dir = dirs::config_dir().ok_or_else(|| ConfigError::NotFound {
            path: "config directory".to_string(),
        })?;
        Ok(config_dir.join("upstate").join("config.toml"))
    }

    /// Load configuration from file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, contains invalid TOML,
    /// or holds values that fail validation.
    pub async fn load_from_file(path: &Path) -> Result<Self, Error> {
        let contents = fs::read_to_string(path)
            .await
            .map_err(|_| ConfigError::NotFound {
                path: path.display().to_string(),
            })?;

        let config: Self = toml::from_str(&contents).map_err(|e| ConfigError::ParseError {
            message: e.to_string(),
        })?;
        config.validate()?;
        debug!(path = %path.display(), "loaded configuration");
        Ok(config)
    }

    /// Load configuration with fallback to defaults
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration file exists but cannot be read
    /// or contains invalid TOML syntax.
    pub async fn load() -> Result<Self, Error> {
        let config_path = Self::default_path()?;

        if fs::try_exists(&config_path).await.unwrap_or(false) {
            Self::load_from_file(&config_path).await
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from an optional path or use default
    ///
    /// # Errors
    ///
    /// Returns an error if the config file cannot be read or parsed
    pub async fn load_or_default(path: Option<&Path>) -> Result<Self, Error> {
        match path {
            Some(config_path) => Self::load_from_file(config_path).await,
            None => Self::load().await,
        }
    }

    /// Merge with environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if environment variables contain invalid values
    /// that cannot be parsed into the expected types.
    pub fn merge_env(&mut self) -> Result<(), Error> {
        // UPSTATE_SYNC_INTERVAL_MS
        if let Ok(interval) = std::env::var("UPSTATE_SYNC_INTERVAL_MS") {
            self.sync.interval_ms = parse_positive("UPSTATE_SYNC_INTERVAL_MS", interval)?;
        }

        // UPSTATE_CACHE_GRACE_SECS
        if let Ok(grace) = std::env::var("UPSTATE_CACHE_GRACE_SECS") {
            self.cache.grace_secs = grace.parse().map_err(|_| ConfigError::InvalidValue {
                field: "UPSTATE_CACHE_GRACE_SECS".to_string(),
                value: grace,
            })?;
        }

        // UPSTATE_CACHE_SLIDING
        if let Ok(sliding) = std::env::var("UPSTATE_CACHE_SLIDING") {
            self.cache.sliding = match sliding.as_str() {
                "true" | "1" | "yes" => true,
                "false" | "0" | "no" => false,
                _ => {
                    return Err(ConfigError::InvalidValue {
                        field: "UPSTATE_CACHE_SLIDING".to_string(),
                        value: sliding,
                    }
                    .into())
                }
            };
        }

        // UPSTATE_KEY_PREFIX
        if let Ok(prefix) = std::env::var("UPSTATE_KEY_PREFIX") {
            self.store.key_prefix = prefix;
        }

        Ok(())
    }

    /// Check values that deserialize fine but cannot be used
    ///
    /// # Errors
    ///
    /// Returns an error for a zero sync interval or rate window.
    pub fn validate(&self) -> Result<(), Error> {
        if self.sync.interval_ms == 0 {
            return Err(ConfigError::Invalid {
                message: "sync.interval_ms must be greater than zero".to_string(),
            }
            .into());
        }
        if self.rate.window_ms == 0 {
            return Err(ConfigError::Invalid {
                message: "rate.window_ms must be greater than zero".to_string(),
            }
            .into());
        }
        Ok(())
    }

    #[must_use]
    pub fn sync_interval(&self) -> Duration {
        Duration::from_millis(self.sync.interval_ms)
    }

    #[must_use]
    pub fn cache_grace(&self) -> Duration {
        Duration::from_secs(self.cache.grace_secs)
    }

    #[must_use]
    pub fn rate_window(&self) -> Duration {
        Duration::from_millis(self.rate.window_ms)
    }
}

fn parse_positive(field: &str, value: String) -> Result<u64, ConfigError> {
    match value.parse::<u64>() {
        Ok(parsed) if parsed > 0 => Ok(parsed),
        _ => Err(ConfigError::InvalidValue {
            field: field.to_string(),
            value,
        }),
    }
}
