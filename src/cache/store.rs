//! Cache Store Module
//!
//! The storage seam every backend implements. Stores deal in already-encoded
//! strings; serialization and compression happen one layer up in
//! `CacheService`.

use async_trait::async_trait;
use serde::Serialize;

use crate::error::Result;

// == Store Health ==
/// Availability report for a backing store.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct StoreHealth {
    /// Backend name ("memory", "redis" or "redis+memory")
    pub backend: String,
    /// Whether the store currently serves requests from its primary medium
    pub available: bool,
    /// Reason the store is unavailable, if known
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Entries held in process memory, if the store keeps any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fallback_entries: Option<usize>,
}

// == Footprint ==
/// Process-local figures a store can report without I/O.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Footprint {
    /// Entries currently held in memory
    pub entries: usize,
    /// Entries evicted for capacity since startup
    pub evictions: u64,
}

// == Cache Store ==
/// Key/value store with per-entry TTL.
///
/// Implementations must be safe to share across concurrent requests.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Fetches a live value, `None` when absent or expired.
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Stores a value, replacing any previous one and resetting its expiry.
    async fn set(&self, key: &str, value: String, ttl_secs: u64) -> Result<()>;

    /// Removes a key. Returns whether anything was removed.
    async fn delete(&self, key: &str) -> Result<bool>;

    /// Removes every key matching a glob pattern. Returns the number removed.
    async fn delete_pattern(&self, pattern: &str) -> Result<usize>;

    /// Fetches several keys at once, positionally aligned with `keys`.
    async fn get_many(&self, keys: &[String]) -> Result<Vec<Option<String>>>;

    /// Stores several values sharing one TTL.
    async fn set_many(&self, items: Vec<(String, String)>, ttl_secs: u64) -> Result<()>;

    /// Reports availability, round-tripping to the medium when it is remote.
    async fn health(&self) -> StoreHealth;

    /// Process-local size figures.
    fn footprint(&self) -> Footprint {
        Footprint::default()
    }
}
