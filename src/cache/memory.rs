//! In-Memory Store Module
//!
//! Process-local fallback store: a HashMap with insertion-order eviction and
//! a hard cap on entry lifetime. Never suspends; the mutex is only held for
//! map access.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::Mutex;
use tracing::debug;

use crate::cache::entry::current_timestamp_ms;
use crate::cache::pattern::KeyPattern;
use crate::cache::store::{CacheStore, Footprint, StoreHealth};
use crate::cache::{CacheEntry, InsertionOrder};
use crate::error::Result;

#[derive(Debug, Default)]
struct MemoryInner {
    /// Key-value storage
    entries: HashMap<String, CacheEntry>,
    /// Write order for eviction
    order: InsertionOrder,
    /// Entries dropped for capacity
    evictions: u64,
}

impl MemoryInner {
    fn remove(&mut self, key: &str) -> bool {
        let removed = self.entries.remove(key).is_some();
        if removed {
            self.order.remove(key);
        }
        removed
    }

    fn live_value(&mut self, key: &str, now: u64) -> Option<String> {
        let expired = self.entries.get(key)?.is_expired_at(now);
        if expired {
            self.remove(key);
            return None;
        }
        self.entries.get(key).map(|entry| entry.value.clone())
    }

    fn insert(&mut self, key: String, entry: CacheEntry, capacity: usize) {
        if !self.entries.contains_key(&key) {
            while self.entries.len() >= capacity {
                match self.order.evict_oldest() {
                    Some(oldest) => {
                        self.entries.remove(&oldest);
                        self.evictions += 1;
                        debug!(key = %oldest, "evicted oldest fallback entry");
                    }
                    None => break,
                }
            }
        }
        self.order.record_write(&key);
        self.entries.insert(key, entry);
    }
}

// == Memory Store ==
/// Bounded in-memory cache store.
#[derive(Debug)]
pub struct MemoryStore {
    inner: Mutex<MemoryInner>,
    /// Maximum number of entries held at once
    capacity: usize,
    /// Upper bound in seconds on any entry's lifetime
    max_ttl: u64,
}

impl MemoryStore {
    // == Constructor ==
    /// Creates a store holding at most `capacity` entries, each living no
    /// longer than `max_ttl` seconds.
    pub fn new(capacity: usize, max_ttl: u64) -> Self {
        Self {
            inner: Mutex::new(MemoryInner::default()),
            capacity: capacity.max(1),
            max_ttl,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    // == Length ==
    /// Returns the number of entries currently held, expired or not.
    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().entries.is_empty()
    }

    /// Whether `key` is held and not yet expired. Does not touch the entry.
    pub fn contains(&self, key: &str) -> bool {
        let now = current_timestamp_ms();
        self.inner
            .lock()
            .entries
            .get(key)
            .is_some_and(|entry| !entry.is_expired_at(now))
    }

    // == Purge Expired ==
    /// Removes all expired entries. Returns the number removed.
    pub fn purge_expired(&self) -> usize {
        let now = current_timestamp_ms();
        let mut inner = self.inner.lock();

        let expired: Vec<String> = inner
            .entries
            .iter()
            .filter(|(_, entry)| entry.is_expired_at(now))
            .map(|(key, _)| key.clone())
            .collect();

        for key in &expired {
            inner.remove(key);
        }
        expired.len()
    }

    /// Synchronous pattern purge, shared with the failover store.
    pub fn remove_matching(&self, pattern: &str) -> usize {
        let pattern = KeyPattern::new(pattern);
        let mut inner = self.inner.lock();

        let before = inner.entries.len();
        inner.entries.retain(|key, _| !pattern.matches(key));
        let MemoryInner { entries, order, .. } = &mut *inner;
        order.retain(|key| entries.contains_key(key));
        before - inner.entries.len()
    }

    fn effective_ttl(&self, ttl_secs: u64) -> u64 {
        ttl_secs.min(self.max_ttl)
    }

    fn put(&self, key: String, value: String, ttl_secs: u64) {
        let entry = CacheEntry::new(value, self.effective_ttl(ttl_secs));
        self.inner.lock().insert(key, entry, self.capacity);
    }
}

#[async_trait]
impl CacheStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let now = current_timestamp_ms();
        Ok(self.inner.lock().live_value(key, now))
    }

    async fn set(&self, key: &str, value: String, ttl_secs: u64) -> Result<()> {
        self.put(key.to_string(), value, ttl_secs);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        Ok(self.inner.lock().remove(key))
    }

    async fn delete_pattern(&self, pattern: &str) -> Result<usize> {
        Ok(self.remove_matching(pattern))
    }

    async fn get_many(&self, keys: &[String]) -> Result<Vec<Option<String>>> {
        let now = current_timestamp_ms();
        let mut inner = self.inner.lock();
        Ok(keys.iter().map(|key| inner.live_value(key, now)).collect())
    }

    async fn set_many(&self, items: Vec<(String, String)>, ttl_secs: u64) -> Result<()> {
        let ttl = self.effective_ttl(ttl_secs);
        let mut inner = self.inner.lock();
        for (key, value) in items {
            inner.insert(key, CacheEntry::new(value, ttl), self.capacity);
        }
        Ok(())
    }

    async fn health(&self) -> StoreHealth {
        StoreHealth {
            backend: "memory".to_string(),
            available: true,
            message: None,
            fallback_entries: Some(self.len()),
        }
    }

    fn footprint(&self) -> Footprint {
        let inner = self.inner.lock();
        Footprint {
            entries: inner.entries.len(),
            evictions: inner.evictions,
        }
    }
}
