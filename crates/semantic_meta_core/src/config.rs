//! Store runtime configuration.
//!
//! # Responsibility
//! - Hold connection, retention and logging settings with safe defaults.
//! - Load overrides from JSON documents and reject invalid combinations.
//!
//! # Invariants
//! - A validated config always has a non-zero sweep limit and busy timeout.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::Path;

const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;
const DEFAULT_SWEEP_BATCH_LIMIT: u32 = 1_000;
/// Seven days.
const DEFAULT_TOMBSTONE_RETENTION_MS: i64 = 7 * 24 * 60 * 60 * 1000;

/// Runtime configuration for store connections and the retention sweeper.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StoreConfig {
    /// How long a connection waits on a locked database before failing.
    pub busy_timeout_ms: u64,
    /// Maximum rows removed per table by one sweep call.
    pub sweep_batch_limit: u32,
    /// Minimum tombstone age before rows become eligible for sweeping.
    pub tombstone_retention_ms: i64,
    /// Default log level (`trace|debug|info|warn|error`).
    pub log_level: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
            sweep_batch_limit: DEFAULT_SWEEP_BATCH_LIMIT,
            tombstone_retention_ms: DEFAULT_TOMBSTONE_RETENTION_MS,
            log_level: crate::logging::default_log_level().to_string(),
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(serde_json::Error),
    Invalid(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(err) => write!(f, "failed to read config: {err}"),
            Self::Parse(err) => write!(f, "failed to parse config: {err}"),
            Self::Invalid(message) => write!(f, "invalid config: {message}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Parse(err) => Some(err),
            Self::Invalid(_) => None,
        }
    }
}

impl StoreConfig {
    /// Parses a JSON document; absent fields keep their defaults.
    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(raw).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and parses a JSON config file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(ConfigError::Io)?;
        Self::from_json_str(&raw)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.busy_timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "busy_timeout_ms must be greater than zero".to_string(),
            ));
        }
        if self.sweep_batch_limit == 0 {
            return Err(ConfigError::Invalid(
                "sweep_batch_limit must be greater than zero".to_string(),
            ));
        }
        if self.tombstone_retention_ms < 0 {
            return Err(ConfigError::Invalid(
                "tombstone_retention_ms must not be negative".to_string(),
            ));
        }
        if !matches!(
            self.log_level.as_str(),
            "trace" | "debug" | "info" | "warn" | "error"
        ) {
            return Err(ConfigError::Invalid(format!(
                "unsupported log_level `{}`",
                self.log_level
            )));
        }
        Ok(())
    }

    /// Sweep cutoff for tombstones older than the retention window.
    pub fn retention_cutoff(&self, now_ms: i64) -> i64 {
        now_ms.saturating_sub(self.tombstone_retention_ms)
    }
}
