//! Configuration system for Tourscout.
//!
//! Resolution order: environment variables → config file → defaults.
//!
//! Config file location:
//!   1. $TOURSCOUT_CONFIG (explicit override)
//!   2. $XDG_CONFIG_HOME/tourscout/config.toml
//!   3. ~/.config/tourscout/config.toml

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TourscoutConfig {
    pub gateway: GatewayConfig,
    pub search: SearchConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Base URL of the remote search API, without a trailing slash.
    pub base_url: String,
    /// Per-request timeout. 0 = no timeout.
    pub request_timeout_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Retries after a transient poll failure. 2 = three attempts per cycle.
    pub max_retries: u32,
    /// Fixed delay between transient-failure retries.
    pub retry_delay_ms: u64,
    /// Wait used when the server omits or garbles its `waitUntil` hint.
    pub default_wait_ms: u64,
    /// Upper bound on total search duration. 0 = unbounded.
    pub max_search_ms: u64,
}

// ── Defaults ──────────────────────────────────────────────────────────────────

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8080/api".to_string(),
            request_timeout_ms: 10_000,
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            max_retries: 2,
            retry_delay_ms: 3_000,
            default_wait_ms: 5_000,
            max_search_ms: 0,
        }
    }
}

impl GatewayConfig {
    pub fn request_timeout(&self) -> Option<Duration> {
        (self.request_timeout_ms > 0).then(|| Duration::from_millis(self.request_timeout_ms))
    }
}

impl SearchConfig {
    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    pub fn default_wait(&self) -> Duration {
        Duration::from_millis(self.default_wait_ms)
    }

    /// `None` when the search may run indefinitely.
    pub fn max_search(&self) -> Option<Duration> {
        (self.max_search_ms > 0).then(|| Duration::from_millis(self.max_search_ms))
    }
}

// ── Path helpers ──────────────────────────────────────────────────────────────

fn config_dir() -> PathBuf {
    std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| dirs_or_home().join(".config"))
        .join("tourscout")
}

fn dirs_or_home() -> PathBuf {
    std::env::var("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("/tmp"))
}

// ── Errors ────────────────────────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {0}: {1}")]
    ReadFailed(PathBuf, std::io::Error),
    #[error("failed to parse {0}: {1}")]
    ParseFailed(PathBuf, toml::de::Error),
    #[error("failed to write {0}: {1}")]
    WriteFailed(PathBuf, std::io::Error),
    #[error("failed to serialize: {0}")]
    SerializeFailed(toml::ser::Error),
}

// ── Loading ───────────────────────────────────────────────────────────────────

impl TourscoutConfig {
    /// Load config: env vars → file → defaults.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::file_path();
        let mut config = Self::load_from(&path)?;
        config.apply_env_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Load from an explicit path, falling back to defaults when it is absent.
    pub fn load_from(path: &std::path::Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(TourscoutConfig::default());
        }
        let text = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::ReadFailed(path.to_path_buf(), e))?;
        toml::from_str(&text).map_err(|e| ConfigError::ParseFailed(path.to_path_buf(), e))
    }

    /// Config file path.
    pub fn file_path() -> PathBuf {
        std::env::var("TOURSCOUT_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| config_dir().join("config.toml"))
    }

    /// Write default config if none exists. Returns the path.
    pub fn write_default_if_missing() -> Result<PathBuf, ConfigError> {
        let path = Self::file_path();
        if !path.exists() {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| ConfigError::WriteFailed(path.clone(), e))?;
            }
            let text = toml::to_string_pretty(&TourscoutConfig::default())
                .map_err(ConfigError::SerializeFailed)?;
            std::fs::write(&path, text).map_err(|e| ConfigError::WriteFailed(path.clone(), e))?;
        }
        Ok(path)
    }

    /// Apply TOURSCOUT_* overrides. `lookup` is `std::env::var` in production.
    fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(v) = lookup("TOURSCOUT_GATEWAY__BASE_URL") {
            self.gateway.base_url = v.trim_end_matches('/').to_string();
        }
        if let Some(v) = lookup("TOURSCOUT_GATEWAY__REQUEST_TIMEOUT_MS") {
            if let Ok(ms) = v.parse() {
                self.gateway.request_timeout_ms = ms;
            }
        }
        if let Some(v) = lookup("TOURSCOUT_SEARCH__MAX_RETRIES") {
            if let Ok(n) = v.parse() {
                self.search.max_retries = n;
            }
        }
        if let Some(v) = lookup("TOURSCOUT_SEARCH__RETRY_DELAY_MS") {
            if let Ok(ms) = v.parse() {
                self.search.retry_delay_ms = ms;
            }
        }
        if let Some(v) = lookup("TOURSCOUT_SEARCH__DEFAULT_WAIT_MS") {
            if let Ok(ms) = v.parse() {
                self.search.default_wait_ms = ms;
            }
        }
        if let Some(v) = lookup("TOURSCOUT_SEARCH__MAX_SEARCH_MS") {
            if let Ok(ms) = v.parse() {
                self.search.max_search_ms = ms;
            }
        }
    }
}
