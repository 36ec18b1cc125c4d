// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! TTL cache for successful operation results.
//!
//! Expiry is checked on read; there is no background sweeper. Concurrent
//! misses on one key are not coalesced: each caller runs its producer and the
//! last to finish owns the stored entry.

use parking_lot::Mutex;
use relay_core::{Clock, SystemClock};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// TTL applied when a caller does not pass one
pub const DEFAULT_TTL: Duration = Duration::from_secs(5 * 60);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub ttl_ms: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { ttl_ms: DEFAULT_TTL.as_millis() as u64 }
    }
}

impl CacheConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_millis(self.ttl_ms)
    }
}

#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    pub value: V,
    pub stored_at: Instant,
    pub ttl: Duration,
}

impl<V> CacheEntry<V> {
    pub fn is_expired(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.stored_at) >= self.ttl
    }
}

/// Keyed store of values that expire `ttl` after being written.
///
/// Clones share the same entries, so one instance can be wired up at startup
/// and handed to every client that should see the same cache.
pub struct TtlCache<V, C = SystemClock> {
    entries: Arc<Mutex<HashMap<String, CacheEntry<V>>>>,
    default_ttl: Duration,
    clock: C,
}

impl<V, C: Clone> Clone for TtlCache<V, C> {
    fn clone(&self) -> Self {
        Self {
            entries: Arc::clone(&self.entries),
            default_ttl: self.default_ttl,
            clock: self.clock.clone(),
        }
    }
}

impl<V: Clone> TtlCache<V, SystemClock> {
    pub fn new() -> Self {
        Self::with_clock(SystemClock, DEFAULT_TTL)
    }
}

impl<V: Clone> Default for TtlCache<V, SystemClock> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: Clone, C: Clock> TtlCache<V, C> {
    pub fn with_clock(clock: C, default_ttl: Duration) -> Self {
        Self { entries: Arc::new(Mutex::new(HashMap::new())), default_ttl, clock }
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    /// Unexpired value for `key`. An expired entry is evicted on the way out.
    pub fn get(&self, key: &str) -> Option<V> {
        let now = self.clock.now();
        let mut entries = self.entries.lock();
        match entries.get(key) {
            Some(entry) if entry.is_expired(now) => {
                entries.remove(key);
                tracing::debug!(key, "cache entry expired");
                None
            }
            Some(entry) => Some(entry.value.clone()),
            None => None,
        }
    }

    /// Store `value` under the default TTL
    pub fn set(&self, key: impl Into<String>, value: V) {
        self.set_with_ttl(key, value, self.default_ttl);
    }

    pub fn set_with_ttl(&self, key: impl Into<String>, value: V, ttl: Duration) {
        let entry = CacheEntry { value, stored_at: self.clock.now(), ttl };
        self.entries.lock().insert(key.into(), entry);
    }

    /// Cached value on hit; otherwise run `producer` and store its success.
    ///
    /// Failures are returned as-is and never cached.
    pub async fn get_or_compute<F, Fut, E>(
        &self,
        key: &str,
        ttl: Option<Duration>,
        producer: F,
    ) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        if let Some(hit) = self.get(key) {
            tracing::debug!(key, "cache hit");
            return Ok(hit);
        }
        tracing::debug!(key, "cache miss");
        let value = producer().await?;
        self.set_with_ttl(key, value.clone(), ttl.unwrap_or(self.default_ttl));
        Ok(value)
    }

    /// Remove `key`, whether or not it is present
    pub fn invalidate(&self, key: &str) {
        self.entries.lock().remove(key);
    }

    pub fn clear(&self) {
        self.entries.lock().clear();
    }

    /// Number of stored entries, including expired ones not yet read
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

#[cfg(test)]
#[path = "cache_tests.rs"]
mod tests;
