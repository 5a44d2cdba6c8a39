//! Error types for the cache layer
//!
//! Provides unified error handling using thiserror. Store-level errors stop at
//! `CacheService`; only the operational API turns them into HTTP responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for the cache layer.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Networked store refused or dropped the connection
    #[error("Connection error: {0}")]
    Connection(String),

    /// Networked round trip exceeded its bound
    #[error("Operation timed out after {0}ms")]
    Timeout(u64),

    /// Stored blob could not be decoded
    #[error("Decode error: {0}")]
    Codec(String),

    /// Value could not be serialized for storage
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Pattern scan failed after some keys were already deleted
    #[error("Pattern scan aborted after deleting {deleted} keys: {reason}")]
    PartialScan { deleted: usize, reason: String },

    /// Key not found in cache
    #[error("Key not found: {0}")]
    NotFound(String),

    /// Invalid request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Write was not accepted by any backing store
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<redis::RedisError> for CacheError {
    fn from(err: redis::RedisError) -> Self {
        CacheError::Connection(err.to_string())
    }
}

// == IntoResponse Implementation ==
impl IntoResponse for CacheError {
    fn into_response(self) -> Response {
        let status = match &self {
            CacheError::NotFound(_) => StatusCode::NOT_FOUND,
            CacheError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            CacheError::Unavailable(_)
            | CacheError::Connection(_)
            | CacheError::Timeout(_)
            | CacheError::PartialScan { .. } => StatusCode::SERVICE_UNAVAILABLE,
            CacheError::Codec(_) | CacheError::Serialization(_) | CacheError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let body = Json(json!({
            "error": self.to_string()
        }));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the cache layer.
pub type Result<T> = std::result::Result<T, CacheError>;
