//! Response DTOs for the operational API

use std::collections::HashMap;

use serde::Serialize;
use serde_json::Value;

use crate::cache::{CacheStats, HealthReport, HealthStatus, StoreHealth};

/// Response body for `GET /cache/:key`
#[derive(Debug, Clone, Serialize)]
pub struct GetResponse {
    pub key: String,
    pub value: Value,
}

impl GetResponse {
    pub fn new(key: impl Into<String>, value: Value) -> Self {
        Self {
            key: key.into(),
            value,
        }
    }
}

/// Response body for `PUT /cache`
#[derive(Debug, Clone, Serialize)]
pub struct PutResponse {
    pub message: String,
    pub key: String,
}

impl PutResponse {
    pub fn new(key: impl Into<String>) -> Self {
        let key = key.into();
        Self {
            message: format!("Key '{}' set successfully", key),
            key,
        }
    }
}

/// Response body for `DELETE /cache/:key`
#[derive(Debug, Clone, Serialize)]
pub struct DeleteResponse {
    pub message: String,
    pub key: String,
    /// Whether the key existed
    pub deleted: bool,
}

impl DeleteResponse {
    pub fn new(key: impl Into<String>, deleted: bool) -> Self {
        let key = key.into();
        let message = if deleted {
            format!("Key '{}' deleted successfully", key)
        } else {
            format!("Key '{}' was not cached", key)
        };
        Self {
            message,
            key,
            deleted,
        }
    }
}

/// Response body for `DELETE /cache?pattern=`
#[derive(Debug, Clone, Serialize)]
pub struct PatternDeleteResponse {
    pub pattern: String,
    pub deleted: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchGetResponse {
    /// Only keys that were cached
    pub values: HashMap<String, Value>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchSetResponse {
    pub stored: usize,
}

/// Response body for `POST /invalidate/:entity`
#[derive(Debug, Clone, Serialize)]
pub struct InvalidateResponse {
    pub entity: String,
    pub deleted: usize,
}

/// Response body for `GET /stats`
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    #[serde(flatten)]
    pub stats: CacheStats,
    /// hits / (hits + misses)
    pub hit_rate: f64,
}

impl From<CacheStats> for StatsResponse {
    fn from(stats: CacheStats) -> Self {
        Self {
            hit_rate: stats.hit_rate(),
            stats,
        }
    }
}

/// Response body for `GET /health`
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: HealthStatus,
    pub details: StoreHealth,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl From<HealthReport> for HealthResponse {
    fn from(report: HealthReport) -> Self {
        Self {
            status: report.status,
            details: report.details,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Error response body for all error conditions
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_delete_response_message() {
        let resp = DeleteResponse::new("product:id=1", true);
        assert!(resp.message.contains("deleted successfully"));

        let resp = DeleteResponse::new("product:id=1", false);
        assert!(!resp.deleted);
        assert!(resp.message.contains("not cached"));
    }

    #[test]
    fn test_stats_response_flattens_counters() {
        let stats = CacheStats {
            hits: 80,
            misses: 20,
            ..CacheStats::default()
        };
        let value = serde_json::to_value(StatsResponse::from(stats)).unwrap();
        assert_eq!(value["hits"], json!(80));
        assert!((value["hit_rate"].as_f64().unwrap() - 0.8).abs() < 0.001);
    }

    #[test]
    fn test_health_response_serialize() {
        let report = HealthReport {
            status: HealthStatus::Down,
            details: StoreHealth {
                backend: "redis+memory".to_string(),
                available: false,
                message: Some("connection refused".to_string()),
                fallback_entries: Some(3),
            },
        };
        let value = serde_json::to_value(HealthResponse::from(report)).unwrap();
        assert_eq!(value["status"], json!("down"));
        assert_eq!(value["details"]["fallback_entries"], json!(3));
        assert!(value["timestamp"].is_string());
    }

    #[test]
    fn test_error_response_serialize() {
        let json = serde_json::to_string(&ErrorResponse::new("Something went wrong")).unwrap();
        assert_eq!(json, r#"{"error":"Something went wrong"}"#);
    }
}
