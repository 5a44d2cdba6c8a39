//! Request DTOs for the operational API

use serde::Deserialize;
use serde_json::Value;

use crate::cache::MAX_KEY_LENGTH;

/// Body of `PUT /cache`.
#[derive(Debug, Clone, Deserialize)]
pub struct PutRequest {
    pub key: String,
    /// Any JSON value; stored through the codec
    pub value: Value,
    /// TTL in seconds, defaults to `DEFAULT_TTL`
    #[serde(default)]
    pub ttl: Option<u64>,
}

impl PutRequest {
    /// Returns an error message if the key is unusable.
    pub fn validate(&self) -> Option<String> {
        validate_key(&self.key)
    }
}

/// Body of `POST /cache/batch/get`.
#[derive(Debug, Clone, Deserialize)]
pub struct BatchGetRequest {
    pub keys: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BatchItem {
    pub key: String,
    pub value: Value,
}

/// Body of `PUT /cache/batch`.
#[derive(Debug, Clone, Deserialize)]
pub struct BatchSetRequest {
    pub items: Vec<BatchItem>,
    #[serde(default)]
    pub ttl: Option<u64>,
}

impl BatchSetRequest {
    pub fn validate(&self) -> Option<String> {
        self.items.iter().find_map(|item| validate_key(&item.key))
    }
}

/// Query of `DELETE /cache?pattern=`.
#[derive(Debug, Clone, Deserialize)]
pub struct PatternQuery {
    pub pattern: String,
}

/// Query of `POST /invalidate/:entity`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct InvalidateQuery {
    #[serde(default)]
    pub id: Option<String>,
}

fn validate_key(key: &str) -> Option<String> {
    if key.is_empty() {
        return Some("Key cannot be empty".to_string());
    }
    if key.len() > MAX_KEY_LENGTH {
        return Some(format!(
            "Key exceeds maximum length of {} bytes",
            MAX_KEY_LENGTH
        ));
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_put_request_accepts_any_json_value() {
        let json = r#"{"key": "categories:all", "value": [{"name": "Chairs"}]}"#;
        let req: PutRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.value, json!([{ "name": "Chairs" }]));
        assert!(req.ttl.is_none());
        assert!(req.validate().is_none());
    }

    #[test]
    fn test_put_request_with_ttl() {
        let json = r#"{"key": "k", "value": 1, "ttl": 60}"#;
        let req: PutRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.ttl, Some(60));
    }

    #[test]
    fn test_key_validation() {
        assert!(validate_key("").is_some());
        assert!(validate_key(&"k".repeat(MAX_KEY_LENGTH + 1)).is_some());
        assert!(validate_key(&"k".repeat(MAX_KEY_LENGTH)).is_none());
    }

    #[test]
    fn test_batch_set_rejects_any_bad_key() {
        let json = r#"{"items": [{"key": "a", "value": 1}, {"key": "", "value": 2}]}"#;
        let req: BatchSetRequest = serde_json::from_str(json).unwrap();
        assert!(req.validate().is_some());
    }
}
