//! Cache Entry Module
//!
//! Defines the fallback store's record: an encoded value plus its insertion
//! and expiry timestamps.

use std::time::{SystemTime, UNIX_EPOCH};

// == Cache Entry ==
/// A single entry held by the in-memory fallback store.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    /// The stored value, already passed through the codec
    pub value: String,
    /// Insertion timestamp (Unix milliseconds), reset on overwrite
    pub inserted_at: u64,
    /// Expiration timestamp (Unix milliseconds)
    pub expires_at: u64,
}

impl CacheEntry {
    // == Constructor ==
    /// Creates a new entry expiring `ttl_seconds` from now.
    pub fn new(value: String, ttl_seconds: u64) -> Self {
        let now = current_timestamp_ms();

        Self {
            value,
            inserted_at: now,
            expires_at: now.saturating_add(ttl_seconds.saturating_mul(1000)),
        }
    }

    // == Is Expired ==
    /// Checks the entry against a clock reading in Unix milliseconds.
    ///
    /// An entry is expired once the clock reaches its expiration time.
    pub fn is_expired_at(&self, now_ms: u64) -> bool {
        now_ms >= self.expires_at
    }
}

// == Utility Functions ==
/// Returns current Unix timestamp in milliseconds.
pub fn current_timestamp_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use std::thread::sleep;
    use std::time::Duration;

    fn expired_now(entry: &CacheEntry) -> bool {
        entry.is_expired_at(current_timestamp_ms())
    }

    #[test]
    fn test_entry_creation() {
        let entry = CacheEntry::new("\"test_value\"".to_string(), 60);

        assert_eq!(entry.value, "\"test_value\"");
        assert_eq!(entry.expires_at - entry.inserted_at, 60_000);
        assert!(!expired_now(&entry));
    }

    #[test]
    fn test_entry_expiration() {
        let entry = CacheEntry::new("1".to_string(), 1);

        assert!(!expired_now(&entry));

        sleep(Duration::from_millis(1100));

        assert!(expired_now(&entry));
    }

    #[test]
    fn test_zero_ttl_is_immediately_expired() {
        let entry = CacheEntry::new("1".to_string(), 0);
        assert!(expired_now(&entry));
    }

    #[test]
    fn test_expiration_boundary_condition() {
        let now = current_timestamp_ms();
        let entry = CacheEntry {
            value: "1".to_string(),
            inserted_at: now,
            expires_at: now,
        };

        assert!(entry.is_expired_at(now), "Entry should be expired at boundary");
        assert!(!entry.is_expired_at(now - 1));
    }
}
