//! API Routes
//!
//! Configures the Axum router for the operational endpoints.

use axum::{
    routing::{get, post, put},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    batch_get_handler, batch_set_handler, delete_handler, delete_pattern_handler, get_handler,
    health_handler, invalidate_handler, put_handler, stats_handler, AppState,
};

/// Creates the main router with all endpoints configured.
///
/// # Endpoints
/// - `PUT /cache` - Store a JSON value
/// - `DELETE /cache?pattern=` - Delete keys matching a glob
/// - `GET /cache/:key` - Read a value
/// - `DELETE /cache/:key` - Delete a key
/// - `POST /cache/batch/get` - Read several keys
/// - `PUT /cache/batch` - Store several values
/// - `POST /invalidate/:entity` - Run an invalidation fan-out
/// - `GET /stats` - Cache counters
/// - `GET /health` - Store health
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/cache", put(put_handler).delete(delete_pattern_handler))
        .route("/cache/batch", put(batch_set_handler))
        .route("/cache/batch/get", post(batch_get_handler))
        .route("/cache/:key", get(get_handler).delete(delete_handler))
        .route("/invalidate/:entity", post(invalidate_handler))
        .route("/stats", get(stats_handler))
        .route("/health", get(health_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
