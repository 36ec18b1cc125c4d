// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Resilience configuration: TOML file, then `RELAY_*` environment overrides.
//!
//! ```toml
//! [cache]
//! ttl_ms = 5000
//!
//! [retry]
//! max_retries = 3
//!
//! [breaker]
//! failure_threshold = 3
//! ```

use crate::batch::BatchConfig;
use crate::breaker::BreakerConfig;
use crate::cache::CacheConfig;
use crate::retry::RetryPolicy;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("{0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResilienceConfig {
    pub cache: CacheConfig,
    pub retry: RetryPolicy,
    pub breaker: BreakerConfig,
    pub batch: BatchConfig,
}

impl ResilienceConfig {
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(source)?)
    }

    /// Read and parse a TOML file. Missing sections take their defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path)
            .map_err(|source| ConfigError::Io { path: path.to_path_buf(), source })?;
        Self::from_toml_str(&source)
    }

    /// Apply `RELAY_*` overrides from the environment. Unparsable values are
    /// ignored.
    pub fn with_env_overrides(mut self) -> Self {
        if let Some(v) = env_u64("RELAY_CACHE_TTL_MS") {
            self.cache.ttl_ms = v;
        }
        if let Some(v) = env_u32("RELAY_RETRY_MAX") {
            self.retry.max_retries = v;
        }
        if let Some(v) = env_u64("RELAY_RETRY_BASE_MS") {
            self.retry.base_delay_ms = v;
        }
        if let Some(v) = env_u64("RELAY_RETRY_CAP_MS") {
            self.retry.cap_ms = v;
        }
        if let Some(v) = env_u32("RELAY_BREAKER_THRESHOLD") {
            self.breaker.failure_threshold = v;
        }
        if let Some(v) = env_u64("RELAY_BREAKER_RESET_MS") {
            self.breaker.reset_timeout_ms = v;
        }
        if let Some(v) = env_u64("RELAY_BATCH_DEBOUNCE_MS") {
            self.batch.debounce_ms = v;
        }
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.breaker.failure_threshold == 0 {
            return Err(ConfigError::Invalid("breaker.failure_threshold must be at least 1".into()));
        }
        if self.batch.max_batch_size == Some(0) {
            return Err(ConfigError::Invalid("batch.max_batch_size must be at least 1".into()));
        }
        if self.retry.base_delay_ms > self.retry.cap_ms {
            return Err(ConfigError::Invalid(format!(
                "retry.base_delay_ms ({}) exceeds retry.cap_ms ({})",
                self.retry.base_delay_ms, self.retry.cap_ms
            )));
        }
        Ok(())
    }
}

fn env_u64(name: &str) -> Option<u64> {
    std::env::var(name).ok().and_then(|s| s.trim().parse::<u64>().ok())
}

fn env_u32(name: &str) -> Option<u32> {
    std::env::var(name).ok().and_then(|s| s.trim().parse::<u32>().ok())
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
