//! Storefront Cache - cache-aside layer for a storefront backend
//!
//! Runs the operational API over the configured cache stores.

use std::net::SocketAddr;

use anyhow::Context;
use tokio::signal;
use tokio::task::JoinHandle;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use storefront_cache::api::{create_router, AppState};
use storefront_cache::cache::{Backends, CacheService, Codec, JsonFileSource};
use storefront_cache::config::Config;
use storefront_cache::tasks::{spawn_cleanup_task, spawn_health_probe};

/// Startup sequence:
/// 1. Initialize tracing
/// 2. Load configuration from environment variables
/// 3. Select stores (Redis with memory failover, or memory alone)
/// 4. Start the fallback sweep and the Redis probe
/// 5. Warm well-known keys
/// 6. Serve until SIGINT/SIGTERM
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "storefront_cache=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting storefront cache");

    let config = Config::from_env();
    info!(
        redis = config.redis_url.is_some(),
        memory_max_entries = config.memory_max_entries,
        default_ttl = config.default_ttl,
        port = config.server_port,
        "Configuration loaded"
    );

    let backends = Backends::from_config(&config).await;
    let cache = CacheService::new(backends.store.clone(), Codec::new(config.compression_threshold));

    let mut tasks = vec![spawn_cleanup_task(
        backends.memory.clone(),
        config.cleanup_interval,
    )];
    if let Some(redis) = &backends.redis {
        tasks.push(spawn_health_probe(
            redis.clone(),
            config.health_probe_interval,
        ));
    }
    info!(count = tasks.len(), "Background tasks started");

    if let Some(path) = &config.warm_cache_file {
        let warmed = cache
            .warm(&JsonFileSource::new(path), config.warm_cache_ttl)
            .await;
        info!(warmed, file = %path, "Cache warming finished");
    }

    let app = create_router(AppState::new(cache, config.default_ttl));

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(tasks))
        .await
        .context("server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Waits for Ctrl+C or SIGTERM, then aborts the background tasks.
async fn shutdown_signal(tasks: Vec<JoinHandle<()>>) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating shutdown...");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating shutdown...");
        }
    }

    for task in tasks {
        task.abort();
    }
    warn!("Background tasks aborted");
}
