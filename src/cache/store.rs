//! In-memory suggestion cache
//!
//! Provides [`MemoryCache`], which stores suggestions keyed by title with an
//! expiry timestamp and tracks hit/miss counters and an estimated footprint.

use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};

use crate::data::Suggestion;

/// Bytes per megabyte used when reporting cache size
const BYTES_PER_MEGABYTE: f64 = 1024.0 * 1024.0;

/// Shared store of suggestions keyed by title
pub trait SuggestionCache: Send + Sync {
    /// Returns the live entry for `key`, if any
    fn get(&self, key: &str) -> Option<Suggestion>;

    /// Stores `value` under `key`, replacing any existing entry
    ///
    /// A `ttl` of `None` keeps the entry until it is cleared.
    fn set(&self, key: &str, value: Suggestion, ttl: Option<Duration>);

    /// Current size and hit statistics
    fn stats(&self) -> CacheStats;

    /// Removes every entry
    fn clear(&self);

    /// Removes expired entries and returns how many were dropped
    fn purge_expired(&self) -> usize;
}

/// Snapshot of cache statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Number of stored entries
    pub keys: usize,
    /// Lookups that found a live entry
    pub hits: u64,
    /// Lookups that found nothing or an expired entry
    pub misses: u64,
    /// Total bytes of stored keys
    pub key_bytes: usize,
    /// Estimated bytes of stored values
    pub value_bytes: usize,
}

impl CacheStats {
    /// Estimated footprint of keys and values in megabytes
    pub fn megabytes(&self) -> f64 {
        (self.key_bytes + self.value_bytes) as f64 / BYTES_PER_MEGABYTE
    }
}

/// Wrapper struct for a stored suggestion
#[derive(Debug, Clone)]
struct CacheEntry {
    /// The cached data
    data: Suggestion,
    /// When the cache entry expires, if ever
    expires_at: Option<DateTime<Utc>>,
}

impl CacheEntry {
    fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|expires_at| now >= expires_at)
    }
}

/// Process-wide in-memory cache
///
/// Operations lock the map only for their own duration; concurrent writers to
/// the same key race and the last one wins.
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<String, CacheEntry>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl MemoryCache {
    /// Creates an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<String, CacheEntry>> {
        // A panic while holding the lock cannot leave a half-written entry
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl SuggestionCache for MemoryCache {
    fn get(&self, key: &str) -> Option<Suggestion> {
        let mut entries = self.entries();
        let now = Utc::now();

        let found = match entries.get(key) {
            Some(entry) if !entry.is_expired(now) => Some(entry.data.clone()),
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        };

        if found.is_some() {
            self.hits.fetch_add(1, Ordering::Relaxed);
        } else {
            self.misses.fetch_add(1, Ordering::Relaxed);
        }
        found
    }

    fn set(&self, key: &str, value: Suggestion, ttl: Option<Duration>) {
        let now = Utc::now();
        let entry = CacheEntry {
            data: value,
            // A TTL too large to represent never expires
            expires_at: ttl.and_then(|ttl| now.checked_add_signed(ttl)),
        };
        self.entries().insert(key.to_string(), entry);
    }

    fn stats(&self) -> CacheStats {
        let entries = self.entries();
        let (key_bytes, value_bytes) = entries
            .iter()
            .fold((0, 0), |(k, v), (key, entry)| {
                (k + key.len(), v + entry.data.approx_size())
            });

        CacheStats {
            keys: entries.len(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            key_bytes,
            value_bytes,
        }
    }

    fn clear(&self) {
        self.entries().clear();
    }

    fn purge_expired(&self) -> usize {
        let now = Utc::now();
        let mut entries = self.entries();
        let before = entries.len();
        entries.retain(|_, entry| !entry.is_expired(now));
        before - entries.len()
    }
}
