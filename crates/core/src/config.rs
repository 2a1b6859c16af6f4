// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Configuration file (`stately.toml`)
//!
//! Every field has a default, so an empty file is a valid configuration.
//! Durations use humantime notation (`"30s"`, `"5m"`).

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Errors loading or validating configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StatelyConfig {
    pub store: StoreConfig,
    pub dispatcher: DispatcherConfig,
    pub definitions: DefinitionsConfig,
    pub daemon: DaemonConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StoreConfig {
    /// Directory holding the write-ahead log and its lock file
    pub path: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(".stately"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DispatcherConfig {
    /// When false the dispatcher never tries to acquire its lock
    pub enabled: bool,
    pub lock_name: String,
    /// Maximum entries fetched per poll
    pub batch_size: usize,
    #[serde(with = "humantime_serde")]
    pub poll_interval: Duration,
    /// Wait between acquire attempts while another process holds the lock
    #[serde(with = "humantime_serde")]
    pub acquire_backoff: Duration,
    /// Upper bound on one subscriber delivery; expiry counts as a rejection
    #[serde(with = "humantime_serde")]
    pub delivery_timeout: Duration,
    /// Failed attempts before an entry is parked for the operator
    pub max_attempts: u32,
    #[serde(with = "humantime_serde")]
    pub retry_backoff: Duration,
    /// Heartbeat age after which another process may reclaim the lock.
    /// Unset means the lock is only ever released explicitly.
    #[serde(with = "humantime_serde")]
    pub lease: Option<Duration>,
    #[serde(with = "humantime_serde")]
    pub heartbeat_interval: Duration,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            lock_name: "state-dispatcher".to_string(),
            batch_size: 100,
            poll_interval: Duration::from_secs(1),
            acquire_backoff: Duration::from_secs(5),
            delivery_timeout: Duration::from_secs(30),
            max_attempts: 5,
            retry_backoff: Duration::from_secs(10),
            lease: None,
            heartbeat_interval: Duration::from_secs(10),
        }
    }
}

impl DispatcherConfig {
    /// Delay before retrying an entry that has failed `attempts` times
    pub fn retry_delay(&self, attempts: u32) -> Duration {
        self.retry_backoff.saturating_mul(attempts.max(1))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DefinitionsConfig {
    #[serde(with = "humantime_serde")]
    pub cache_ttl: Duration,
}

impl Default for DefinitionsConfig {
    fn default() -> Self {
        Self {
            cache_ttl: Duration::from_secs(300),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DaemonConfig {
    /// Log file; stderr when unset
    pub log_path: Option<PathBuf>,
    /// JSON-lines file receiving every delivered state event
    pub journal_path: Option<PathBuf>,
}

impl StatelyConfig {
    /// Load and validate a config file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: StatelyConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_store_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.store.path = path.into();
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let d = &self.dispatcher;
        if d.lock_name.trim().is_empty() {
            return Err(ConfigError::Invalid("dispatcher.lock_name is empty".into()));
        }
        if d.batch_size == 0 {
            return Err(ConfigError::Invalid("dispatcher.batch_size must be > 0".into()));
        }
        if d.max_attempts == 0 {
            return Err(ConfigError::Invalid(
                "dispatcher.max_attempts must be > 0".into(),
            ));
        }
        if let Some(lease) = d.lease {
            // A single delivery plus one missed heartbeat must fit in the lease
            let floor = d.delivery_timeout.saturating_add(d.heartbeat_interval);
            if lease <= floor {
                return Err(ConfigError::Invalid(format!(
                    "dispatcher.lease ({}) must exceed delivery_timeout ({}) plus heartbeat_interval ({})",
                    humantime::format_duration(lease),
                    humantime::format_duration(d.delivery_timeout),
                    humantime::format_duration(d.heartbeat_interval)
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
