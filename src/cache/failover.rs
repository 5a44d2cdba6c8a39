//! Failover Store Module
//!
//! Routes operations to the networked store while it is available and to the
//! in-memory store otherwise. Networked failures are logged here and never
//! reach callers: reads degrade to misses, writes land in memory.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::warn;

use crate::cache::memory::MemoryStore;
use crate::cache::redis::RedisStore;
use crate::cache::store::{CacheStore, Footprint, StoreHealth};
use crate::error::{CacheError, Result};

/// The networked side of a failover pair.
///
/// Implemented by [`RedisStore`]; tests substitute scripted stores.
pub trait NetworkedStore: CacheStore {
    /// Whether operations should be routed here right now.
    fn is_available(&self) -> bool;
}

impl NetworkedStore for RedisStore {
    fn is_available(&self) -> bool {
        RedisStore::is_available(self)
    }
}

// == Failover Store ==
/// Networked store with an in-memory fallback.
pub struct FailoverStore {
    primary: Arc<dyn NetworkedStore>,
    fallback: Arc<MemoryStore>,
}

impl FailoverStore {
    pub fn new(primary: Arc<dyn NetworkedStore>, fallback: Arc<MemoryStore>) -> Self {
        Self { primary, fallback }
    }

    pub fn fallback(&self) -> &Arc<MemoryStore> {
        &self.fallback
    }
}

#[async_trait]
impl CacheStore for FailoverStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        if !self.primary.is_available() {
            return self.fallback.get(key).await;
        }

        match self.primary.get(key).await {
            Ok(value) => Ok(value),
            Err(e) => {
                warn!(key = %key, error = %e, "cache read failed, treating as miss");
                Ok(None)
            }
        }
    }

    async fn set(&self, key: &str, value: String, ttl_secs: u64) -> Result<()> {
        if !self.primary.is_available() {
            return self.fallback.set(key, value, ttl_secs).await;
        }

        match self.primary.set(key, value.clone(), ttl_secs).await {
            Ok(()) => Ok(()),
            Err(e) => {
                warn!(key = %key, error = %e, "cache write failed, storing in memory");
                self.fallback.set(key, value, ttl_secs).await
            }
        }
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        let local = self.fallback.delete(key).await?;
        if !self.primary.is_available() {
            return Ok(local);
        }

        match self.primary.delete(key).await {
            Ok(remote) => Ok(remote || local),
            Err(e) => {
                warn!(key = %key, error = %e, "cache delete failed");
                Ok(local)
            }
        }
    }

    async fn delete_pattern(&self, pattern: &str) -> Result<usize> {
        let local = self.fallback.remove_matching(pattern);
        if !self.primary.is_available() {
            return Ok(local);
        }

        match self.primary.delete_pattern(pattern).await {
            Ok(remote) => Ok(remote),
            Err(CacheError::PartialScan { deleted, reason }) => {
                warn!(
                    pattern = %pattern,
                    deleted,
                    error = %reason,
                    "pattern scan aborted, invalidation is partial"
                );
                Ok(deleted)
            }
            Err(e) => {
                warn!(pattern = %pattern, error = %e, "pattern delete failed");
                Ok(local)
            }
        }
    }

    async fn get_many(&self, keys: &[String]) -> Result<Vec<Option<String>>> {
        if !self.primary.is_available() {
            return self.fallback.get_many(keys).await;
        }

        match self.primary.get_many(keys).await {
            Ok(values) => Ok(values),
            Err(e) => {
                warn!(count = keys.len(), error = %e, "batch read failed, treating as misses");
                Ok(vec![None; keys.len()])
            }
        }
    }

    async fn set_many(&self, items: Vec<(String, String)>, ttl_secs: u64) -> Result<()> {
        if !self.primary.is_available() {
            return self.fallback.set_many(items, ttl_secs).await;
        }

        match self.primary.set_many(items.clone(), ttl_secs).await {
            Ok(()) => Ok(()),
            Err(e) => {
                warn!(count = items.len(), error = %e, "batch write failed, storing in memory");
                self.fallback.set_many(items, ttl_secs).await
            }
        }
    }

    async fn health(&self) -> StoreHealth {
        let primary = self.primary.health().await;
        StoreHealth {
            backend: format!("{}+memory", primary.backend),
            available: primary.available,
            message: primary.message,
            fallback_entries: Some(self.fallback.len()),
        }
    }

    fn footprint(&self) -> Footprint {
        self.fallback.footprint()
    }
}
