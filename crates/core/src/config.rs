// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Scheduler configuration

use crate::session::SessionPolicy;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Timing and batching settings shared by all services
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SchedulerConfig {
    /// Heartbeat period of the session timer; also the minimum session length
    #[serde(with = "humantime_serde")]
    pub session_save_interval: Duration,
    /// Sessions idle longer than this are finished
    #[serde(with = "humantime_serde")]
    pub session_timeout: Duration,
    /// Debounce window for "report eventually" signals
    #[serde(with = "humantime_serde")]
    pub report_debounce: Duration,
    /// Maximum records carried by one report
    pub max_batch_size: usize,
    /// Set under automated tests: timers are never started
    pub test_mode: bool,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            session_save_interval: Duration::from_secs(5),
            session_timeout: Duration::from_secs(30),
            report_debounce: Duration::from_secs(1),
            max_batch_size: 1000,
            test_mode: false,
        }
    }
}

impl SchedulerConfig {
    pub fn from_toml(source: &str) -> Result<Self, ConfigError> {
        let config: SchedulerConfig = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let source = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml(&source)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.session_save_interval.is_zero() {
            return Err(ConfigError::Invalid(
                "session_save_interval must be non-zero".to_string(),
            ));
        }
        if self.max_batch_size == 0 {
            return Err(ConfigError::Invalid(
                "max_batch_size must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    pub fn session_policy(&self) -> SessionPolicy {
        SessionPolicy {
            timeout: self.session_timeout,
            save_interval: self.session_save_interval,
        }
    }

    /// Configuration for tests: no timers, short debounce
    pub fn for_tests() -> Self {
        Self {
            report_debounce: Duration::from_millis(100),
            test_mode: true,
            ..Self::default()
        }
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
