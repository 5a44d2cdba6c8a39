//! API Handlers
//!
//! HTTP request handlers for the operational endpoints. These are the only
//! callers that see cache failures as errors; everything else in the crate
//! degrades silently.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde_json::Value;

use crate::cache::{CacheService, Entity, HealthStatus, Invalidator};
use crate::error::{CacheError, Result};
use crate::models::{
    BatchGetRequest, BatchGetResponse, BatchSetRequest, BatchSetResponse, DeleteResponse,
    GetResponse, HealthResponse, InvalidateQuery, InvalidateResponse, PatternDeleteResponse,
    PatternQuery, PutRequest, PutResponse, StatsResponse,
};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub cache: CacheService,
    pub invalidator: Invalidator,
    /// TTL applied to writes that carry none
    pub default_ttl: u64,
}

impl AppState {
    pub fn new(cache: CacheService, default_ttl: u64) -> Self {
        Self {
            invalidator: Invalidator::new(cache.clone()),
            cache,
            default_ttl,
        }
    }
}

/// Handler for GET /cache/:key
pub async fn get_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<GetResponse>> {
    match state.cache.get::<Value>(&key).await {
        Some(value) => Ok(Json(GetResponse::new(key, value))),
        None => Err(CacheError::NotFound(key)),
    }
}

/// Handler for PUT /cache
pub async fn put_handler(
    State(state): State<AppState>,
    Json(req): Json<PutRequest>,
) -> Result<Json<PutResponse>> {
    if let Some(error_msg) = req.validate() {
        return Err(CacheError::InvalidRequest(error_msg));
    }

    let ttl = req.ttl.unwrap_or(state.default_ttl);
    if !state.cache.set(&req.key, &req.value, ttl).await {
        return Err(CacheError::Unavailable(format!(
            "could not store '{}'",
            req.key
        )));
    }

    Ok(Json(PutResponse::new(req.key)))
}

/// Handler for DELETE /cache/:key
pub async fn delete_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<DeleteResponse>> {
    match state.cache.remove(&key).await {
        Some(deleted) => Ok(Json(DeleteResponse::new(key, deleted))),
        None => Err(CacheError::Unavailable(format!(
            "could not delete '{}'",
            key
        ))),
    }
}

/// Handler for DELETE /cache?pattern=
pub async fn delete_pattern_handler(
    State(state): State<AppState>,
    Query(query): Query<PatternQuery>,
) -> Result<Json<PatternDeleteResponse>> {
    if query.pattern.is_empty() {
        return Err(CacheError::InvalidRequest(
            "Pattern cannot be empty".to_string(),
        ));
    }

    let deleted = state.cache.delete_pattern(&query.pattern).await;
    Ok(Json(PatternDeleteResponse {
        pattern: query.pattern,
        deleted,
    }))
}

/// Handler for POST /cache/batch/get
pub async fn batch_get_handler(
    State(state): State<AppState>,
    Json(req): Json<BatchGetRequest>,
) -> Json<BatchGetResponse> {
    let values = state.cache.get_many::<Value>(&req.keys).await;
    Json(BatchGetResponse { values })
}

/// Handler for PUT /cache/batch
pub async fn batch_set_handler(
    State(state): State<AppState>,
    Json(req): Json<BatchSetRequest>,
) -> Result<Json<BatchSetResponse>> {
    if let Some(error_msg) = req.validate() {
        return Err(CacheError::InvalidRequest(error_msg));
    }

    let ttl = req.ttl.unwrap_or(state.default_ttl);
    let items: Vec<(String, Value)> = req
        .items
        .into_iter()
        .map(|item| (item.key, item.value))
        .collect();

    if !state.cache.set_many(&items, ttl).await {
        return Err(CacheError::Unavailable("batch write failed".to_string()));
    }

    Ok(Json(BatchSetResponse {
        stored: items.len(),
    }))
}

/// Handler for POST /invalidate/:entity
///
/// Runs the entity's fan-out; `?id=` narrows it to one record.
pub async fn invalidate_handler(
    State(state): State<AppState>,
    Path(entity): Path<String>,
    Query(query): Query<InvalidateQuery>,
) -> Result<Json<InvalidateResponse>> {
    let entity: Entity = entity.parse()?;
    let deleted = state
        .invalidator
        .invalidate(entity, query.id.as_deref())
        .await;

    Ok(Json(InvalidateResponse {
        entity: entity.to_string(),
        deleted,
    }))
}

/// Handler for GET /stats
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    Json(StatsResponse::from(state.cache.stats()))
}

/// Handler for GET /health
///
/// 503 while the cache reports itself down, so load balancers can react.
pub async fn health_handler(
    State(state): State<AppState>,
) -> (StatusCode, Json<HealthResponse>) {
    let report = state.cache.health().await;
    let status = match report.status {
        HealthStatus::Up => StatusCode::OK,
        HealthStatus::Down => StatusCode::SERVICE_UNAVAILABLE,
    };
    (status, Json(HealthResponse::from(report)))
}
