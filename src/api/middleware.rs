//! HTTP response cache middleware.
//!
//! Caches anonymous GET responses under `cache:GET:<path>?<query>` and replays
//! them without running the handler. Install with
//! `axum::middleware::from_fn_with_state(ResponseCache::new(..), response_cache)`
//! on public read routes.

use axum::{
    body::{Body, HttpBody},
    extract::{OriginalUri, State},
    http::{
        header::{AUTHORIZATION, CACHE_CONTROL, CONTENT_TYPE, COOKIE},
        HeaderMap, HeaderValue, Method, Request, StatusCode,
    },
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::cache::{keys, CacheService, CacheStatus};
use crate::config::Config;
use crate::error::CacheError;

/// Largest response body stored by default (1 MiB).
pub const DEFAULT_MAX_BODY: usize = 1024 * 1024;

const X_CACHE: &str = "x-cache";

/// Middleware state.
#[derive(Clone)]
pub struct ResponseCache {
    pub cache: CacheService,
    /// Lifetime of stored responses, also advertised in `Cache-Control`
    pub ttl: u64,
    pub max_body: usize,
}

impl ResponseCache {
    pub fn new(cache: CacheService, ttl: u64) -> Self {
        Self {
            cache,
            ttl,
            max_body: DEFAULT_MAX_BODY,
        }
    }

    /// TTL from `DEFAULT_TTL`, body limit from `MAX_CACHED_BODY`.
    pub fn from_config(cache: CacheService, config: &Config) -> Self {
        Self::new(cache, config.default_ttl).with_max_body(config.max_cached_body)
    }

    pub fn with_max_body(mut self, max_body: usize) -> Self {
        self.max_body = max_body;
        self
    }
}

/// What is stored for a response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedResponse {
    pub status: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    pub body: String,
}

pub async fn response_cache(
    State(state): State<ResponseCache>,
    request: Request<Body>,
    next: Next,
) -> Response {
    if request.method() != Method::GET || is_authenticated(request.headers()) {
        return next.run(request).await;
    }

    let key = keys::request_key(Method::GET.as_str(), &full_path_and_query(&request));

    if let Some(cached) = state.cache.get::<CachedResponse>(&key).await {
        debug!(key = %key, "serving cached response");
        return replay(cached, state.ttl);
    }

    let response = next.run(request).await;
    if !response.status().is_success() {
        return response;
    }

    // Streaming or oversize bodies are passed through without buffering
    let fits = response
        .body()
        .size_hint()
        .upper()
        .is_some_and(|len| len <= state.max_body as u64);
    if !fits {
        debug!(key = %key, "response body too large to cache");
        return response;
    }

    let (mut parts, body) = response.into_parts();
    let bytes = match axum::body::to_bytes(body, state.max_body).await {
        Ok(bytes) => bytes,
        Err(e) => return buffer_failure(&key, &e.to_string()),
    };

    match std::str::from_utf8(&bytes) {
        Ok(text) => {
            let cached = CachedResponse {
                status: parts.status.as_u16(),
                content_type: parts
                    .headers
                    .get(CONTENT_TYPE)
                    .and_then(|v| v.to_str().ok())
                    .map(str::to_string),
                body: text.to_string(),
            };
            state.cache.set(&key, &cached, state.ttl).await;
        }
        Err(_) => debug!(key = %key, "binary response body, not caching"),
    }

    mark(&mut parts.headers, CacheStatus::Miss, state.ttl);
    Response::from_parts(parts, Body::from(bytes))
}

/// Path and query as the client sent them. Nested routers strip their mount
/// prefix from `request.uri()`, so the original URI takes precedence.
fn full_path_and_query(request: &Request<Body>) -> String {
    let uri = request
        .extensions()
        .get::<OriginalUri>()
        .map(|original| &original.0)
        .unwrap_or_else(|| request.uri());

    uri.path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| "/".to_string())
}

/// The handler's body is already consumed at this point.
fn buffer_failure(key: &str, reason: &str) -> Response {
    error!(key = %key, error = %reason, "failed to buffer response body");
    CacheError::Internal(format!("failed to buffer response body: {}", reason)).into_response()
}

/// Requests carrying credentials see per-user content.
fn is_authenticated(headers: &HeaderMap) -> bool {
    if headers.contains_key(AUTHORIZATION) {
        return true;
    }

    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .any(|pair| pair.trim_start().starts_with("token="))
}

fn replay(cached: CachedResponse, ttl: u64) -> Response {
    let status = StatusCode::from_u16(cached.status).unwrap_or(StatusCode::OK);
    let mut response = (status, cached.body).into_response();

    let headers = response.headers_mut();
    match cached
        .content_type
        .and_then(|ct| HeaderValue::from_str(&ct).ok())
    {
        Some(content_type) => {
            headers.insert(CONTENT_TYPE, content_type);
        }
        None => {
            headers.remove(CONTENT_TYPE);
        }
    }
    mark(headers, CacheStatus::Hit, ttl);
    response
}

fn mark(headers: &mut HeaderMap, status: CacheStatus, ttl: u64) {
    headers.insert(X_CACHE, HeaderValue::from_static(status.as_str()));
    if let Ok(value) = HeaderValue::from_str(&format!("public, max-age={}", ttl)) {
        headers.insert(CACHE_CONTROL, value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{middleware::from_fn_with_state, routing::get, Json, Router};
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tower::util::ServiceExt;

    fn app(state: ResponseCache, calls: Arc<AtomicUsize>) -> Router {
        let products = {
            let calls = calls.clone();
            move || {
                let calls = calls.clone();
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Json(json!({ "products": [{ "id": 1, "name": "Oak chair" }] }))
                }
            }
        };
        let missing = move || {
            let calls = calls.clone();
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                (StatusCode::NOT_FOUND, "no such product")
            }
        };

        Router::new()
            .route("/products", get(products.clone()).post(products))
            .route("/product/missing", get(missing))
            .layer(from_fn_with_state(state, response_cache))
    }

    fn setup() -> (ResponseCache, Arc<AtomicUsize>, Router) {
        let state = ResponseCache::new(CacheService::in_memory(100, 300), 300);
        let calls = Arc::new(AtomicUsize::new(0));
        let router = app(state.clone(), calls.clone());
        (state, calls, router)
    }

    fn get_request(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    fn x_cache(response: &Response) -> Option<&str> {
        response
            .headers()
            .get("x-cache")
            .and_then(|v| v.to_str().ok())
    }

    async fn body_text(response: Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_miss_then_hit() {
        let (state, calls, router) = setup();

        let first = router
            .clone()
            .oneshot(get_request("/products?page=2"))
            .await
            .unwrap();
        assert_eq!(first.status(), StatusCode::OK);
        assert_eq!(x_cache(&first), Some("MISS"));
        assert_eq!(
            first.headers().get(CACHE_CONTROL).unwrap(),
            "public, max-age=300"
        );
        let first_body = body_text(first).await;

        let second = router.oneshot(get_request("/products?page=2")).await.unwrap();
        assert_eq!(x_cache(&second), Some("HIT"));
        assert_eq!(
            second.headers().get(CONTENT_TYPE).unwrap(),
            "application/json"
        );
        assert_eq!(body_text(second).await, first_body);

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(state
            .cache
            .get::<CachedResponse>("cache:GET:/products?page=2")
            .await
            .is_some());
    }

    #[tokio::test]
    async fn test_query_string_is_part_of_key() {
        let (_, calls, router) = setup();

        router.clone().oneshot(get_request("/products?page=1")).await.unwrap();
        let other = router.oneshot(get_request("/products?page=2")).await.unwrap();

        assert_eq!(x_cache(&other), Some("MISS"));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_authorization_header_bypasses_cache() {
        let (state, calls, router) = setup();

        for _ in 0..2 {
            let request = Request::builder()
                .uri("/products")
                .header(AUTHORIZATION, "Bearer abc")
                .body(Body::empty())
                .unwrap();
            let response = router.clone().oneshot(request).await.unwrap();
            assert_eq!(x_cache(&response), None);
        }

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert!(state
            .cache
            .get::<CachedResponse>("cache:GET:/products")
            .await
            .is_none());
    }

    #[tokio::test]
    async fn test_authorization_header_skips_cached_response() {
        let (_, calls, router) = setup();

        let anonymous = router.clone().oneshot(get_request("/products")).await.unwrap();
        assert_eq!(x_cache(&anonymous), Some("MISS"));

        let request = Request::builder()
            .uri("/products")
            .header(AUTHORIZATION, "Bearer abc")
            .body(Body::empty())
            .unwrap();
        let authenticated = router.oneshot(request).await.unwrap();

        assert_eq!(authenticated.status(), StatusCode::OK);
        assert_eq!(x_cache(&authenticated), None);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_nested_routes_do_not_share_entries() {
        let state = ResponseCache::new(CacheService::in_memory(100, 300), 300);
        let section = |name: &'static str| {
            Router::new()
                .route("/products", get(move || async move { name }))
                .layer(from_fn_with_state(state.clone(), response_cache))
        };
        let router = Router::new()
            .nest("/api/user", section("user-products"))
            .nest("/api/shop", section("shop-products"));

        let user = router.clone().oneshot(get_request("/api/user/products")).await.unwrap();
        assert_eq!(x_cache(&user), Some("MISS"));
        assert_eq!(body_text(user).await, "user-products");

        let shop = router.clone().oneshot(get_request("/api/shop/products")).await.unwrap();
        assert_eq!(x_cache(&shop), Some("MISS"));
        assert_eq!(body_text(shop).await, "shop-products");

        let shop = router.oneshot(get_request("/api/shop/products")).await.unwrap();
        assert_eq!(x_cache(&shop), Some("HIT"));
        assert_eq!(body_text(shop).await, "shop-products");

        for key in ["cache:GET:/api/user/products", "cache:GET:/api/shop/products"] {
            assert!(state.cache.get::<CachedResponse>(key).await.is_some(), "{key}");
        }
        assert!(state
            .cache
            .get::<CachedResponse>("cache:GET:/products")
            .await
            .is_none());
    }

    #[tokio::test]
    async fn test_buffer_failure_reports_json_error() {
        let response = buffer_failure("cache:GET:/products", "length limit exceeded");
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(x_cache(&response), None);

        let body: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
        assert!(body["error"]
            .as_str()
            .unwrap()
            .contains("length limit exceeded"));
    }

    #[tokio::test]
    async fn test_token_cookie_bypasses_cache() {
        let (_, calls, router) = setup();

        for _ in 0..2 {
            let request = Request::builder()
                .uri("/products")
                .header(COOKIE, "theme=dark; token=abc")
                .body(Body::empty())
                .unwrap();
            let response = router.clone().oneshot(request).await.unwrap();
            assert_eq!(x_cache(&response), None);
        }

        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_unrelated_cookie_is_cached() {
        let (_, calls, router) = setup();

        for _ in 0..2 {
            let request = Request::builder()
                .uri("/products")
                .header(COOKIE, "theme=dark; csrftoken=abc")
                .body(Body::empty())
                .unwrap();
            router.clone().oneshot(request).await.unwrap();
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_error_responses_not_cached() {
        let (_, calls, router) = setup();

        for _ in 0..2 {
            let response = router
                .clone()
                .oneshot(get_request("/product/missing"))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::NOT_FOUND);
            assert_eq!(x_cache(&response), None);
        }

        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_non_get_not_cached() {
        let (_, calls, router) = setup();

        for _ in 0..2 {
            let request = Request::builder()
                .method(Method::POST)
                .uri("/products")
                .body(Body::empty())
                .unwrap();
            router.clone().oneshot(request).await.unwrap();
        }

        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_oversize_body_not_cached() {
        let state = ResponseCache::new(CacheService::in_memory(100, 300), 300).with_max_body(8);
        let calls = Arc::new(AtomicUsize::new(0));
        let router = app(state, calls.clone());

        for _ in 0..2 {
            let response = router.clone().oneshot(get_request("/products")).await.unwrap();
            assert_eq!(response.status(), StatusCode::OK);
            assert_eq!(x_cache(&response), None);
            assert!(body_text(response).await.contains("Oak chair"));
        }

        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_is_authenticated() {
        let mut headers = HeaderMap::new();
        assert!(!is_authenticated(&headers));

        headers.insert(COOKIE, HeaderValue::from_static("token=xyz"));
        assert!(is_authenticated(&headers));

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic Zm9v"));
        assert!(is_authenticated(&headers));
    }
}
