//! TTL Cleanup Task
//!
//! Background task that periodically removes expired entries from the
//! in-memory fallback store. Reads already ignore expired entries; the sweep
//! releases their memory and keeps the FIFO order short.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::cache::MemoryStore;

/// Spawns a background task that purges expired fallback entries every
/// `cleanup_interval_secs` seconds.
///
/// Returns the task handle so shutdown can abort it.
///
/// # Example
/// ```ignore
/// let memory = Arc::new(MemoryStore::new(100, 300));
/// let cleanup_handle = spawn_cleanup_task(memory.clone(), 60);
/// // Later, during shutdown:
/// cleanup_handle.abort();
/// ```
pub fn spawn_cleanup_task(memory: Arc<MemoryStore>, cleanup_interval_secs: u64) -> JoinHandle<()> {
    let interval = Duration::from_secs(cleanup_interval_secs.max(1));

    tokio::spawn(async move {
        info!(
            "Starting TTL cleanup task with interval of {} seconds",
            interval.as_secs()
        );

        loop {
            tokio::time::sleep(interval).await;

            let removed = memory.purge_expired();
            if removed > 0 {
                info!(removed, remaining = memory.len(), "TTL cleanup removed expired entries");
            } else {
                debug!("TTL cleanup: no expired entries found");
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::CacheStore;

    #[tokio::test]
    async fn test_cleanup_task_removes_expired_entries() {
        let memory = Arc::new(MemoryStore::new(100, 300));
        memory
            .set("expire_soon", "\"value\"".to_string(), 1)
            .await
            .unwrap();

        let handle = spawn_cleanup_task(memory.clone(), 1);

        // Entry expires after 1s; the second sweep runs at 2s
        tokio::time::sleep(Duration::from_millis(2500)).await;

        assert!(!memory.contains("expire_soon"));
        assert_eq!(memory.len(), 0);

        handle.abort();
    }

    #[tokio::test]
    async fn test_cleanup_task_preserves_valid_entries() {
        let memory = Arc::new(MemoryStore::new(100, 300));
        memory
            .set("long_lived", "\"value\"".to_string(), 300)
            .await
            .unwrap();

        let handle = spawn_cleanup_task(memory.clone(), 1);
        tokio::time::sleep(Duration::from_millis(1500)).await;

        assert_eq!(
            memory.get("long_lived").await.unwrap(),
            Some("\"value\"".to_string())
        );

        handle.abort();
    }

    #[tokio::test]
    async fn test_cleanup_task_can_be_aborted() {
        let handle = spawn_cleanup_task(Arc::new(MemoryStore::new(10, 300)), 1);

        handle.abort();

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(handle.is_finished(), "Task should be finished after abort");
    }
}
