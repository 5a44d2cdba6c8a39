//! Cache Statistics Module
//!
//! Tracks cache performance metrics including hits, misses, writes and
//! evictions. Counters are atomic so one recorder can be shared by every
//! clone of the cache service.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

// == Cache Stats ==
/// Point-in-time snapshot of the cache counters.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct CacheStats {
    /// Number of lookups served from the cache
    pub hits: u64,
    /// Number of lookups that found nothing usable
    pub misses: u64,
    /// Number of values stored
    pub writes: u64,
    /// Number of writes no store accepted
    pub write_failures: u64,
    /// Number of keys removed by delete or pattern delete
    pub deletions: u64,
    /// Number of fallback entries evicted for capacity
    pub evictions: u64,
    /// Current number of entries in the fallback store
    pub fallback_entries: usize,
}

impl CacheStats {
    // == Hit Rate ==
    /// Calculates the cache hit rate.
    ///
    /// Returns hits / (hits + misses), or 0.0 if no lookups have been made.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

// == Stats Recorder ==
/// Shared atomic counters behind `CacheStats`.
#[derive(Debug, Default)]
pub struct StatsRecorder {
    hits: AtomicU64,
    misses: AtomicU64,
    writes: AtomicU64,
    write_failures: AtomicU64,
    deletions: AtomicU64,
}

impl StatsRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_write(&self, ok: bool) {
        if ok {
            self.writes.fetch_add(1, Ordering::Relaxed);
        } else {
            self.write_failures.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_deletions(&self, count: usize) {
        self.deletions.fetch_add(count as u64, Ordering::Relaxed);
    }

    /// Builds a snapshot; store-owned figures are supplied by the caller.
    pub fn snapshot(&self, evictions: u64, fallback_entries: usize) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            writes: self.writes.load(Ordering::Relaxed),
            write_failures: self.write_failures.load(Ordering::Relaxed),
            deletions: self.deletions.load(Ordering::Relaxed),
            evictions,
            fallback_entries,
        }
    }
}
