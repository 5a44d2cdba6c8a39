//! API Module
//!
//! Operational REST endpoints over the cache, plus the response cache
//! middleware for catalog read routes.
//!
//! # Endpoints
//! - `PUT /cache`, `DELETE /cache?pattern=`
//! - `GET /cache/:key`, `DELETE /cache/:key`
//! - `POST /cache/batch/get`, `PUT /cache/batch`
//! - `POST /invalidate/:entity`
//! - `GET /stats`, `GET /health`

pub mod handlers;
pub mod middleware;
pub mod routes;

pub use handlers::*;
pub use middleware::{response_cache, CachedResponse, ResponseCache};
pub use routes::create_router;
