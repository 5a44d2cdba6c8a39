//! Cache Module
//!
//! Cache-aside storage for catalog reads: a Redis store with an in-memory
//! FIFO fallback, the value codec, key naming, invalidation fan-outs and
//! warming.

mod codec;
mod entry;
mod failover;
mod fifo;
mod invalidation;
mod memory;
mod pattern;
mod redis;
mod service;
mod stats;
mod store;
mod warm;

pub mod keys;


// Re-export public types
pub use codec::{is_compressed, Codec, DEFAULT_COMPRESSION_THRESHOLD, GZIP_PREFIX};
pub use entry::CacheEntry;
pub use failover::{FailoverStore, NetworkedStore};
pub use fifo::InsertionOrder;
pub use invalidation::{Entity, Invalidator, Target};
pub use memory::MemoryStore;
pub use pattern::KeyPattern;
pub use self::redis::{ConnectionState, RedisStore};
pub use service::{
    Backends, CacheService, CacheStatus, Cached, HealthReport, HealthStatus, Lookup,
};
pub use stats::{CacheStats, StatsRecorder};
pub use store::{CacheStore, Footprint, StoreHealth};
pub use warm::{JsonFileSource, WarmupSource};

// == Public Constants ==
/// Maximum allowed key length in bytes
pub const MAX_KEY_LENGTH: usize = 256;
