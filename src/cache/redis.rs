//! Networked Store Module
//!
//! Redis-backed store sharing one auto-reconnecting connection manager across
//! all requests. Availability lives in a `ConnectionState` owned by the store:
//! every round trip updates it and the health probe task re-checks it, so an
//! outage is never assumed to last forever.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client, RedisError, RedisResult};
use tracing::{debug, info, warn};

use crate::cache::store::{CacheStore, StoreHealth};
use crate::error::{CacheError, Result};

// == Connection State ==
/// Availability flag for the networked store.
#[derive(Debug, Default)]
pub struct ConnectionState {
    available: AtomicBool,
    last_error: Mutex<Option<String>>,
}

impl ConnectionState {
    pub fn is_available(&self) -> bool {
        self.available.load(Ordering::Acquire)
    }

    pub fn mark_up(&self) {
        if !self.available.swap(true, Ordering::AcqRel) {
            info!("Redis available");
        }
        *self.last_error.lock() = None;
    }

    pub fn mark_down(&self, reason: &str) {
        if self.available.swap(false, Ordering::AcqRel) {
            warn!(error = %reason, "Redis unavailable, serving from memory");
        }
        *self.last_error.lock() = Some(reason.to_string());
    }

    pub fn last_error(&self) -> Option<String> {
        self.last_error.lock().clone()
    }
}

// == Redis Store ==
/// Cache store backed by a Redis server.
pub struct RedisStore {
    client: Client,
    conn: RwLock<Option<ConnectionManager>>,
    state: ConnectionState,
    /// Bound on every round trip
    timeout: Duration,
    /// COUNT hint for SCAN
    scan_count: usize,
}

impl RedisStore {
    // == Constructor ==
    /// Parses the URL without connecting; call [`RedisStore::connect`] next.
    pub fn new(url: &str, timeout: Duration, scan_count: usize) -> Result<Self> {
        let client = Client::open(url)?;
        Ok(Self {
            client,
            conn: RwLock::new(None),
            state: ConnectionState::default(),
            timeout,
            scan_count: scan_count.max(1),
        })
    }

    /// Establishes the shared connection if it does not exist yet.
    pub async fn connect(&self) -> Result<()> {
        if self.conn.read().is_some() {
            return Ok(());
        }

        let manager = self
            .bounded(ConnectionManager::new(self.client.clone()))
            .await?;
        *self.conn.write() = Some(manager);
        info!("Redis connection established");
        Ok(())
    }

    /// True while the last round trip or probe succeeded.
    pub fn is_available(&self) -> bool {
        self.state.is_available() && self.conn.read().is_some()
    }

    pub fn state(&self) -> &ConnectionState {
        &self.state
    }

    // == Probe ==
    /// Connects if needed and pings, updating the connection state.
    pub async fn probe(&self) -> bool {
        if let Err(e) = self.connect().await {
            debug!(error = %e, "Redis probe could not connect");
            return false;
        }
        self.ping().await.is_ok()
    }

    async fn ping(&self) -> Result<String> {
        let mut conn = self.connection()?;
        let cmd = redis::cmd("PING");
        let pong: String = self.bounded(cmd.query_async(&mut conn)).await?;
        Ok(pong)
    }

    fn connection(&self) -> Result<ConnectionManager> {
        self.conn
            .read()
            .clone()
            .ok_or_else(|| CacheError::Connection("not connected".to_string()))
    }

    /// Runs one round trip under the timeout and records the outcome.
    async fn bounded<T, F>(&self, op: F) -> Result<T>
    where
        F: Future<Output = RedisResult<T>>,
    {
        match tokio::time::timeout(self.timeout, op).await {
            Ok(Ok(value)) => {
                self.state.mark_up();
                Ok(value)
            }
            Ok(Err(e)) if is_connectivity_error(&e) => {
                self.state.mark_down(&e.to_string());
                Err(e.into())
            }
            Ok(Err(e)) => {
                debug!(error = %e, "Redis rejected command");
                Err(e.into())
            }
            Err(_) => {
                let err = CacheError::Timeout(self.timeout.as_millis() as u64);
                self.state.mark_down(&err.to_string());
                Err(err)
            }
        }
    }
}

/// Only transport failures say anything about availability; a reply error
/// such as WRONGTYPE concerns a single key.
fn is_connectivity_error(e: &RedisError) -> bool {
    e.is_io_error() || e.is_connection_dropped() || e.is_connection_refusal() || e.is_timeout()
}

#[async_trait]
impl CacheStore for RedisStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let mut conn = self.connection()?;
        let value: Option<String> = self.bounded(conn.get(key)).await?;
        Ok(value)
    }

    async fn set(&self, key: &str, value: String, ttl_secs: u64) -> Result<()> {
        let mut conn = self.connection()?;
        // SET EX rejects a zero expiry
        let _: () = self
            .bounded(conn.set_ex(key, value, ttl_secs.max(1)))
            .await?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        let mut conn = self.connection()?;
        let removed: usize = self.bounded(conn.del(key)).await?;
        Ok(removed > 0)
    }

    async fn delete_pattern(&self, pattern: &str) -> Result<usize> {
        let mut conn = self.connection()?;
        let mut cursor: u64 = 0;
        let mut deleted = 0usize;

        loop {
            let mut cmd = redis::cmd("SCAN");
            cmd.arg(cursor)
                .arg("MATCH")
                .arg(pattern)
                .arg("COUNT")
                .arg(self.scan_count);

            let step: Result<(u64, Vec<String>)> = self.bounded(cmd.query_async(&mut conn)).await;
            let (next, keys) = match step {
                Ok(page) => page,
                Err(e) if deleted == 0 => return Err(e),
                Err(e) => {
                    return Err(CacheError::PartialScan {
                        deleted,
                        reason: e.to_string(),
                    })
                }
            };

            if !keys.is_empty() {
                let removed: Result<usize> = self.bounded(conn.del(keys.as_slice())).await;
                match removed {
                    Ok(n) => deleted += n,
                    Err(e) => {
                        return Err(CacheError::PartialScan {
                            deleted,
                            reason: e.to_string(),
                        })
                    }
                }
            }

            if next == 0 {
                break;
            }
            cursor = next;
        }

        Ok(deleted)
    }

    async fn get_many(&self, keys: &[String]) -> Result<Vec<Option<String>>> {
        if keys.is_empty() {
            return Ok(Vec::new());
        }

        let mut conn = self.connection()?;
        let mut pipe = redis::pipe();
        for key in keys {
            pipe.get(key);
        }
        let values: Vec<Option<String>> = self.bounded(pipe.query_async(&mut conn)).await?;
        Ok(values)
    }

    async fn set_many(&self, items: Vec<(String, String)>, ttl_secs: u64) -> Result<()> {
        if items.is_empty() {
            return Ok(());
        }

        let mut conn = self.connection()?;
        let mut pipe = redis::pipe();
        for (key, value) in items {
            pipe.set_ex(key, value, ttl_secs.max(1)).ignore();
        }
        let _: () = self.bounded(pipe.query_async(&mut conn)).await?;
        Ok(())
    }

    async fn health(&self) -> StoreHealth {
        let (available, message) = match self.ping().await {
            Ok(_) => (true, None),
            Err(e) => (false, Some(e.to_string())),
        };

        StoreHealth {
            backend: "redis".to_string(),
            available,
            message,
            fallback_entries: None,
        }
    }
}
