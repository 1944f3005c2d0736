//! TTL response cache.

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use serde_json::Value;
use std::sync::Arc;

use crate::cache::key::CacheKey;
use crate::clock::Clock;

/// A successful upstream response kept for reuse.
#[derive(Debug, Clone, PartialEq)]
pub struct CachedResponse {
    pub status: u16,
    pub payload: Value,
    pub stored_at: DateTime<Utc>,
}

/// A thread-safe, size-bounded TTL cache of upstream responses.
///
/// Expired entries are never served but are only removed when overwritten or
/// when room is needed for a new key.
pub struct ResponseCache {
    entries: DashMap<CacheKey, CachedResponse>,
    ttl: Duration,
    max_entries: usize,
    clock: Arc<dyn Clock>,
}

impl ResponseCache {
    /// A TTL of zero disables the cache entirely. TTLs too large to represent
    /// saturate instead of wrapping.
    pub fn new(ttl: std::time::Duration, max_entries: usize, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: DashMap::new(),
            ttl: Duration::from_std(ttl).unwrap_or(Duration::MAX),
            max_entries: max_entries.max(1),
            clock,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.ttl > Duration::zero()
    }

    pub fn ttl(&self) -> std::time::Duration {
        self.ttl.to_std().unwrap_or_default()
    }

    /// Fresh entry for `key`, if any (age ≤ TTL).
    pub fn lookup(&self, key: &CacheKey) -> Option<CachedResponse> {
        if !self.is_enabled() {
            return None;
        }
        let now = self.clock.now();
        self.entries
            .get(key)
            .filter(|entry| now - entry.stored_at <= self.ttl)
            .map(|entry| entry.value().clone())
    }

    /// Store (or overwrite) the response for `key`.
    pub fn store(&self, key: CacheKey, status: u16, payload: Value) {
        if !self.is_enabled() {
            return;
        }
        let now = self.clock.now();
        if !self.entries.contains_key(&key) && self.entries.len() >= self.max_entries {
            self.make_room(now);
        }
        self.entries.insert(
            key,
            CachedResponse {
                status,
                payload,
                stored_at: now,
            },
        );
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop expired entries; if still full, drop the oldest one.
    fn make_room(&self, now: DateTime<Utc>) {
        let ttl = self.ttl;
        self.entries.retain(|_, entry| now - entry.stored_at <= ttl);

        if self.entries.len() >= self.max_entries {
            let oldest = self
                .entries
                .iter()
                .min_by_key(|entry| entry.value().stored_at)
                .map(|entry| entry.key().clone());
            if let Some(key) = oldest {
                self.entries.remove(&key);
                tracing::debug!(?key, "Evicted oldest cache entry");
            }
        }
    }
}
