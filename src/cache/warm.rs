//! Cache warming sources.
//!
//! A source yields the well-known, high-traffic entries that should already
//! be cached when the first request arrives.

use std::path::PathBuf;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::{CacheError, Result};

/// Supplies entries for cache warming.
#[async_trait]
pub trait WarmupSource: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &str;

    /// Loads `(key, value)` pairs to pre-populate.
    async fn load(&self) -> Result<Vec<(String, Value)>>;
}

// == JSON File Source ==
/// Reads a JSON object file whose members become cache entries.
///
/// ```json
/// { "categories:all": [{ "name": "Chairs" }], "products:featured:limit=8": [] }
/// ```
#[derive(Debug, Clone)]
pub struct JsonFileSource {
    path: PathBuf,
}

impl JsonFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl WarmupSource for JsonFileSource {
    fn name(&self) -> &str {
        "json-file"
    }

    async fn load(&self) -> Result<Vec<(String, Value)>> {
        let raw = tokio::fs::read_to_string(&self.path).await.map_err(|e| {
            CacheError::Internal(format!("cannot read {}: {}", self.path.display(), e))
        })?;

        match serde_json::from_str(&raw)? {
            Value::Object(map) => Ok(map.into_iter().collect()),
            _ => Err(CacheError::InvalidRequest(format!(
                "{} must contain a JSON object",
                self.path.display()
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn temp_file(name: &str, contents: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!(
            "storefront_cache_{}_{}.json",
            name,
            std::process::id()
        ));
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[tokio::test]
    async fn test_loads_object_members() {
        let path = temp_file("warm_ok", r#"{"categories:all":[{"name":"Chairs"}]}"#);

        let entries = JsonFileSource::new(&path).load().await.unwrap();
        assert_eq!(
            entries,
            vec![("categories:all".to_string(), json!([{ "name": "Chairs" }]))]
        );

        std::fs::remove_file(path).ok();
    }

    #[tokio::test]
    async fn test_rejects_non_object() {
        let path = temp_file("warm_array", "[1, 2, 3]");

        let result = JsonFileSource::new(&path).load().await;
        assert!(matches!(result, Err(CacheError::InvalidRequest(_))));

        std::fs::remove_file(path).ok();
    }

    #[tokio::test]
    async fn test_missing_file_is_error() {
        let result = JsonFileSource::new("/nonexistent/warm.json").load().await;
        assert!(matches!(result, Err(CacheError::Internal(_))));
    }
}
