//! Rank Cache - an in-memory cache-and-rank core
//!
//! A TTL cache shared by read-through domain decorators, plus a search
//! orchestrator that validates, ranks, pages and caches search results.

pub mod api;
pub mod cache;
pub mod clock;
pub mod config;
pub mod domains;
pub mod error;
pub mod models;
pub mod search;
pub mod tasks;

pub use api::AppState;
pub use cache::{CacheKey, CacheStats, CacheStore};
pub use config::Config;
pub use search::{SearchOrchestrator, SearchRequest, SearchResponse};
pub use tasks::spawn_cleanup_task;
