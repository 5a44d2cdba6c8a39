//! Cache-Aside Service
//!
//! The read/write protocol request handlers use. Values are encoded through
//! the codec and stored in whichever backend was selected at startup. No
//! method here returns a cache error: every failure is logged and degrades to
//! "as if the cache were empty".

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use serde::{de::DeserializeOwned, Serialize};
use serde_json::json;
use tracing::{debug, info, warn};

use crate::cache::entry::current_timestamp_ms;
use crate::cache::failover::FailoverStore;
use crate::cache::keys::WARMED_MARKER;
use crate::cache::memory::MemoryStore;
use crate::cache::redis::RedisStore;
use crate::cache::stats::{CacheStats, StatsRecorder};
use crate::cache::store::{CacheStore, StoreHealth};
use crate::cache::warm::WarmupSource;
use crate::cache::Codec;
use crate::config::Config;

// == Cache Status ==
/// Whether a value came from the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheStatus {
    Hit,
    Miss,
}

impl CacheStatus {
    /// Value for the `X-Cache` response header.
    pub fn as_str(&self) -> &'static str {
        match self {
            CacheStatus::Hit => "HIT",
            CacheStatus::Miss => "MISS",
        }
    }
}

/// A value paired with where it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct Cached<T> {
    pub value: T,
    pub status: CacheStatus,
}

/// Outcome of [`CacheService::lookup`]; `Hit` exactly when a value is present.
pub type Lookup<T> = Cached<Option<T>>;

// == Health Report ==
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Up,
    Down,
}

/// Result of [`CacheService::health`].
#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    pub status: HealthStatus,
    pub details: StoreHealth,
}

// == Backends ==
/// Stores selected at startup.
///
/// `store` is what consumers use; the concrete handles are kept for the
/// background tasks that maintain them.
pub struct Backends {
    pub store: Arc<dyn CacheStore>,
    pub memory: Arc<MemoryStore>,
    pub redis: Option<Arc<RedisStore>>,
}

impl Backends {
    /// Memory only when no `REDIS_URL` is configured, Redis with memory
    /// failover otherwise. An unreachable server is not fatal.
    pub async fn from_config(config: &Config) -> Self {
        let memory = Arc::new(MemoryStore::new(
            config.memory_max_entries,
            config.memory_ttl,
        ));

        let Some(url) = config.redis_url.as_deref() else {
            info!("REDIS_URL not set, using in-memory cache");
            return Self::memory_only(memory);
        };

        let redis = match RedisStore::new(url, config.redis_timeout(), config.scan_count) {
            Ok(redis) => Arc::new(redis),
            Err(e) => {
                warn!(error = %e, "invalid REDIS_URL, using in-memory cache");
                return Self::memory_only(memory);
            }
        };

        if let Err(e) = redis.connect().await {
            warn!(error = %e, "Redis connection failed, starting on in-memory cache");
        }

        let store = Arc::new(FailoverStore::new(redis.clone(), memory.clone()));
        Self {
            store,
            memory,
            redis: Some(redis),
        }
    }

    pub fn memory_only(memory: Arc<MemoryStore>) -> Self {
        Self {
            store: memory.clone(),
            memory,
            redis: None,
        }
    }
}

// == Cache Service ==
/// Cache-aside operations over an injected store.
#[derive(Clone)]
pub struct CacheService {
    store: Arc<dyn CacheStore>,
    codec: Codec,
    stats: Arc<StatsRecorder>,
}

impl CacheService {
    pub fn new(store: Arc<dyn CacheStore>, codec: Codec) -> Self {
        Self {
            store,
            codec,
            stats: Arc::new(StatsRecorder::new()),
        }
    }

    /// Service over a fresh in-memory store; handy for tests and tooling.
    pub fn in_memory(capacity: usize, max_ttl: u64) -> Self {
        Self::new(
            Arc::new(MemoryStore::new(capacity, max_ttl)),
            Codec::default(),
        )
    }

    // == Get ==
    /// Returns the cached value, or `None` on a miss or any cache failure.
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let stored = match self.store.get(key).await {
            Ok(Some(stored)) => stored,
            Ok(None) => {
                self.stats.record_miss();
                return None;
            }
            Err(e) => {
                warn!(key = %key, error = %e, "cache get failed");
                self.stats.record_miss();
                return None;
            }
        };

        match self.codec.decode(&stored) {
            Ok(value) => {
                self.stats.record_hit();
                Some(value)
            }
            Err(e) => {
                warn!(key = %key, error = %e, "discarding undecodable cache entry");
                self.stats.record_miss();
                None
            }
        }
    }

    /// Like [`CacheService::get`], tagged with the hit or miss status.
    pub async fn lookup<T: DeserializeOwned>(&self, key: &str) -> Lookup<T> {
        let value = self.get(key).await;
        let status = if value.is_some() {
            CacheStatus::Hit
        } else {
            CacheStatus::Miss
        };
        Cached { value, status }
    }

    // == Set ==
    /// Stores `value` for `ttl_secs`. Returns false if nothing was stored.
    pub async fn set<T: Serialize + ?Sized>(&self, key: &str, value: &T, ttl_secs: u64) -> bool {
        let encoded = match self.codec.encode(value) {
            Ok(encoded) => encoded,
            Err(e) => {
                warn!(key = %key, error = %e, "cache set skipped, value not serializable");
                self.stats.record_write(false);
                return false;
            }
        };

        let ok = match self.store.set(key, encoded, ttl_secs).await {
            Ok(()) => true,
            Err(e) => {
                warn!(key = %key, error = %e, "cache set failed");
                false
            }
        };
        self.stats.record_write(ok);
        ok
    }

    // == Delete ==
    /// Removes one key. Returns false only if the delete itself failed.
    pub async fn delete(&self, key: &str) -> bool {
        self.remove(key).await.is_some()
    }

    /// Removes one key, reporting whether it existed; `None` if the delete
    /// failed.
    pub async fn remove(&self, key: &str) -> Option<bool> {
        match self.store.delete(key).await {
            Ok(removed) => {
                if removed {
                    self.stats.record_deletions(1);
                }
                Some(removed)
            }
            Err(e) => {
                warn!(key = %key, error = %e, "cache delete failed");
                None
            }
        }
    }

    // == Delete Pattern ==
    /// Removes every key matching a glob pattern. Returns how many went.
    pub async fn delete_pattern(&self, pattern: &str) -> usize {
        match self.store.delete_pattern(pattern).await {
            Ok(count) => {
                self.stats.record_deletions(count);
                info!(pattern = %pattern, count, "deleted keys matching pattern");
                count
            }
            Err(e) => {
                warn!(pattern = %pattern, error = %e, "cache pattern delete failed");
                0
            }
        }
    }

    // == Batch Get ==
    /// Fetches several keys. Only keys with a usable cached value appear in
    /// the result.
    pub async fn get_many<T: DeserializeOwned>(&self, keys: &[String]) -> HashMap<String, T> {
        let mut found = HashMap::new();
        if keys.is_empty() {
            return found;
        }

        let values = match self.store.get_many(keys).await {
            Ok(values) => values,
            Err(e) => {
                warn!(count = keys.len(), error = %e, "cache batch get failed");
                return found;
            }
        };

        for (key, stored) in keys.iter().zip(values) {
            let Some(stored) = stored else {
                self.stats.record_miss();
                continue;
            };
            match self.codec.decode(&stored) {
                Ok(value) => {
                    self.stats.record_hit();
                    found.insert(key.clone(), value);
                }
                Err(e) => {
                    warn!(key = %key, error = %e, "discarding undecodable cache entry");
                    self.stats.record_miss();
                }
            }
        }
        found
    }

    // == Batch Set ==
    /// Stores several values sharing one TTL. Unserializable items are
    /// skipped.
    pub async fn set_many<T: Serialize>(&self, items: &[(String, T)], ttl_secs: u64) -> bool {
        if items.is_empty() {
            return true;
        }

        let mut encoded = Vec::with_capacity(items.len());
        for (key, value) in items {
            match self.codec.encode(value) {
                Ok(stored) => encoded.push((key.clone(), stored)),
                Err(e) => {
                    warn!(key = %key, error = %e, "batch item skipped, value not serializable")
                }
            }
        }

        let count = encoded.len();
        let ok = match self.store.set_many(encoded, ttl_secs).await {
            Ok(()) => true,
            Err(e) => {
                warn!(count, error = %e, "cache batch set failed");
                false
            }
        };
        for _ in 0..count {
            self.stats.record_write(ok);
        }
        ok
    }

    // == Get Or Compute ==
    /// Cache-aside read: the cached value if present, otherwise the result of
    /// `compute`, stored under `key` for `ttl_secs`.
    ///
    /// Errors from `compute` are returned untouched and nothing is stored.
    pub async fn get_or_compute<T, E, F, Fut>(
        &self,
        key: &str,
        ttl_secs: u64,
        compute: F,
    ) -> Result<Cached<T>, E>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        if let Some(value) = self.get(key).await {
            debug!(key = %key, "cache hit");
            return Ok(Cached {
                value,
                status: CacheStatus::Hit,
            });
        }

        let value = compute().await?;
        self.set(key, &value, ttl_secs).await;
        Ok(Cached {
            value,
            status: CacheStatus::Miss,
        })
    }

    // == Warm ==
    /// Pre-populates well-known keys. Best effort: failures are logged and
    /// the number of entries written is returned.
    pub async fn warm(&self, source: &dyn WarmupSource, ttl_secs: u64) -> usize {
        info!(source = source.name(), "warming cache");

        let mut entries = match source.load().await {
            Ok(entries) => entries,
            Err(e) => {
                warn!(source = source.name(), error = %e, "cache warming failed");
                return 0;
            }
        };
        let count = entries.len();
        entries.push((
            WARMED_MARKER.to_string(),
            json!({ "timestamp": current_timestamp_ms() }),
        ));

        if self.set_many(&entries, ttl_secs).await {
            info!(count, "cache warmed");
            count
        } else {
            warn!("cache warming could not store entries");
            0
        }
    }

    // == Health ==
    pub async fn health(&self) -> HealthReport {
        let details = self.store.health().await;
        let status = if details.available {
            HealthStatus::Up
        } else {
            HealthStatus::Down
        };
        HealthReport { status, details }
    }

    // == Stats ==
    pub fn stats(&self) -> CacheStats {
        let footprint = self.store.footprint();
        self.stats.snapshot(footprint.evictions, footprint.entries)
    }
}
