//! Storefront Cache - cache-aside layer for a storefront backend
//!
//! Redis-backed caching with an in-memory fallback, response caching
//! middleware and entity-driven invalidation.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod models;
pub mod tasks;

pub use api::{AppState, ResponseCache};
pub use cache::{Backends, CacheService, Invalidator};
pub use config::Config;
pub use tasks::{spawn_cleanup_task, spawn_health_probe};
