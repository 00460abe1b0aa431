//! API Module
//!
//! HTTP handlers and routing for the search server REST API.
//!
//! # Endpoints
//! - `POST /search` - Run a search
//! - `GET /search/suggestions` - Completion suggestions
//! - `GET|DELETE /search/history` - Read or clear recent searches
//! - `GET /search/trending` - Most searched terms
//! - `POST /search/refresh` - Invalidate search caches
//! - `GET /stats` - Get cache statistics
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
