//! Redis Health Probe
//!
//! While Redis is down the failover store stops talking to it, so nothing
//! else would notice it coming back. This task pings it on an interval and
//! flips the connection state when the outcome changes.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::cache::RedisStore;

/// Spawns a task that probes `redis` every `interval_secs` seconds.
pub fn spawn_health_probe(redis: Arc<RedisStore>, interval_secs: u64) -> JoinHandle<()> {
    let interval = Duration::from_secs(interval_secs.max(1));

    tokio::spawn(async move {
        info!(
            "Starting Redis health probe with interval of {} seconds",
            interval.as_secs()
        );

        let mut ticker = tokio::time::interval(interval);
        loop {
            ticker.tick().await;

            let up = redis.probe().await;
            debug!(up, "Redis probe finished");
        }
    })
}
