//! Configuration Module
//!
//! Handles loading and managing cache configuration from environment variables.

use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Cache layer and server configuration.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Networked store URL; `None` runs on the in-memory store alone
    pub redis_url: Option<String>,
    /// HTTP server port
    pub server_port: u16,
    /// TTL in seconds for admin writes that carry none
    pub default_ttl: u64,
    /// Capacity of the in-memory fallback store
    pub memory_max_entries: usize,
    /// Upper bound in seconds on the lifetime of a fallback entry
    pub memory_ttl: u64,
    /// Serialized size in bytes above which values are compressed
    pub compression_threshold: usize,
    /// Bound in milliseconds on every networked round trip
    pub redis_timeout_ms: u64,
    /// COUNT hint passed to SCAN during pattern deletion
    pub scan_count: usize,
    /// Fallback expiry sweep interval in seconds
    pub cleanup_interval: u64,
    /// Networked store re-probe interval in seconds
    pub health_probe_interval: u64,
    /// Optional JSON file of `{key: value}` entries loaded at startup
    pub warm_cache_file: Option<String>,
    /// TTL in seconds for warmed entries
    pub warm_cache_ttl: u64,
    /// Largest response body the middleware will buffer and store
    pub max_cached_body: usize,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `REDIS_URL` - Networked store URL (default: unset)
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    /// - `DEFAULT_TTL` - Default TTL in seconds (default: 300)
    /// - `MEMORY_MAX_ENTRIES` - Fallback capacity (default: 100)
    /// - `MEMORY_TTL` - Fallback entry lifetime in seconds (default: 300)
    /// - `COMPRESSION_THRESHOLD` - Compression threshold in bytes (default: 2048)
    /// - `REDIS_TIMEOUT_MS` - Round-trip bound (default: 500)
    /// - `SCAN_COUNT` - SCAN batch hint (default: 100)
    /// - `CLEANUP_INTERVAL` - Fallback sweep frequency in seconds (default: 300)
    /// - `HEALTH_PROBE_INTERVAL` - Re-probe frequency in seconds (default: 5)
    /// - `WARM_CACHE_FILE` - Warmup entries file (default: unset)
    /// - `WARM_CACHE_TTL` - Warmed entry TTL in seconds (default: 600)
    /// - `MAX_CACHED_BODY` - Middleware body limit in bytes (default: 1 MiB)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            redis_url: non_empty_var("REDIS_URL"),
            server_port: parsed_var("SERVER_PORT", defaults.server_port),
            default_ttl: parsed_var("DEFAULT_TTL", defaults.default_ttl),
            memory_max_entries: parsed_var("MEMORY_MAX_ENTRIES", defaults.memory_max_entries),
            memory_ttl: parsed_var("MEMORY_TTL", defaults.memory_ttl),
            compression_threshold: parsed_var(
                "COMPRESSION_THRESHOLD",
                defaults.compression_threshold,
            ),
            redis_timeout_ms: parsed_var("REDIS_TIMEOUT_MS", defaults.redis_timeout_ms),
            scan_count: parsed_var("SCAN_COUNT", defaults.scan_count),
            cleanup_interval: parsed_var("CLEANUP_INTERVAL", defaults.cleanup_interval),
            health_probe_interval: parsed_var(
                "HEALTH_PROBE_INTERVAL",
                defaults.health_probe_interval,
            ),
            warm_cache_file: non_empty_var("WARM_CACHE_FILE"),
            warm_cache_ttl: parsed_var("WARM_CACHE_TTL", defaults.warm_cache_ttl),
            max_cached_body: parsed_var("MAX_CACHED_BODY", defaults.max_cached_body),
        }
    }

    /// Round-trip bound for networked store calls.
    pub fn redis_timeout(&self) -> Duration {
        Duration::from_millis(self.redis_timeout_ms)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            redis_url: None,
            server_port: 3000,
            default_ttl: 300,
            memory_max_entries: 100,
            memory_ttl: 300,
            compression_threshold: 2048,
            redis_timeout_ms: 500,
            scan_count: 100,
            cleanup_interval: 300,
            health_probe_interval: 5,
            warm_cache_file: None,
            warm_cache_ttl: crate::cache::keys::ttl::WARMED,
            max_cached_body: 1024 * 1024,
        }
    }
}

fn parsed_var<T: FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert!(config.redis_url.is_none());
        assert_eq!(config.server_port, 3000);
        assert_eq!(config.memory_max_entries, 100);
        assert_eq!(config.memory_ttl, 300);
        assert_eq!(config.compression_threshold, 2048);
        assert_eq!(config.redis_timeout(), Duration::from_millis(500));
    }

    #[test]
    fn test_config_from_env_defaults() {
        // Clear any existing env vars to test defaults
        env::remove_var("REDIS_URL");
        env::remove_var("SERVER_PORT");
        env::remove_var("MEMORY_MAX_ENTRIES");
        env::remove_var("COMPRESSION_THRESHOLD");
        env::remove_var("WARM_CACHE_FILE");

        let config = Config::from_env();
        assert!(config.redis_url.is_none());
        assert_eq!(config.server_port, 3000);
        assert_eq!(config.memory_max_entries, 100);
        assert_eq!(config.compression_threshold, 2048);
        assert!(config.warm_cache_file.is_none());
    }

    #[test]
    fn test_parsed_var_falls_back_on_garbage() {
        env::set_var("STOREFRONT_CACHE_TEST_GARBAGE", "not-a-number");
        assert_eq!(parsed_var("STOREFRONT_CACHE_TEST_GARBAGE", 42u64), 42);
        env::remove_var("STOREFRONT_CACHE_TEST_GARBAGE");
    }

    #[test]
    fn test_blank_url_is_unset() {
        env::set_var("STOREFRONT_CACHE_TEST_BLANK", "   ");
        assert!(non_empty_var("STOREFRONT_CACHE_TEST_BLANK").is_none());
        env::remove_var("STOREFRONT_CACHE_TEST_BLANK");
    }
}
