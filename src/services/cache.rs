//! Bounded in-memory result cache with TTL expiry and LRU eviction.
//!
//! Expiry is lazy: an entry older than the TTL is only removed when it is
//! next read. Until then a stale entry still occupies a capacity slot and
//! can be pushed out by LRU eviction like any other entry. There is no
//! background reaper.
//!
//! All operations go through one `tokio::sync::Mutex`, so every `get` and
//! `set` is atomic with respect to every other caller. The lock is held
//! only for the in-memory update, never across I/O.

use chrono::{DateTime, Duration, Utc};
use lru::LruCache;
use std::fmt::Debug;
use std::hash::Hash;
use std::num::NonZeroUsize;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::helpers::duration_secs_saturating;
use crate::services::clock::Clock;

struct CacheEntry<V> {
    value: V,
    inserted_at: DateTime<Utc>,
}

/// Fixed-capacity key/value store with time-to-live and LRU ordering.
///
/// Values are handed out as clones, so a caller mutating its copy never
/// affects what the cache holds.
pub struct TtlCache<K, V> {
    entries: Mutex<LruCache<K, CacheEntry<V>>>,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl<K, V> TtlCache<K, V>
where
    K: Hash + Eq + Debug,
    V: Clone,
{
    pub fn new(capacity: NonZeroUsize, ttl_secs: u64, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
            ttl: duration_secs_saturating(ttl_secs),
            clock,
        }
    }

    /// Look up a value.
    ///
    /// Returns `None` if the key is absent or its entry has outlived the TTL
    /// (in which case the entry is removed). A hit moves the entry to the
    /// most-recently-used position.
    pub async fn get(&self, key: &K) -> Option<V> {
        let now = self.clock.now();
        let mut entries = self.entries.lock().await;

        let expired = now - entries.peek(key)?.inserted_at > self.ttl;
        if expired {
            entries.pop(key);
            tracing::debug!("Cache entry {:?} expired", key);
            return None;
        }

        entries.get(key).map(|entry| entry.value.clone())
    }

    /// Insert or overwrite a value, stamping it with the current time.
    ///
    /// When the cache is full and `key` is new, the least-recently-used
    /// entry is evicted first.
    pub async fn set(&self, key: K, value: V) {
        let entry = CacheEntry {
            value,
            inserted_at: self.clock.now(),
        };
        let mut entries = self.entries.lock().await;
        if let Some((evicted, _)) = entries.push(key, entry) {
            // `push` also hands back the old value when overwriting the same key
            if !entries.contains(&evicted) {
                tracing::debug!("Cache full, evicted {:?}", evicted);
            }
        }
    }

    /// Number of stored entries, including stale ones not yet read.
    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }
}
