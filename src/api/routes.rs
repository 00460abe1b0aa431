//! API Routes
//!
//! Configures the Axum router with all search server endpoints.

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    clear_history_handler, health_handler, history_handler, refresh_handler, search_handler,
    stats_handler, suggestions_handler, trending_handler, AppState,
};

/// Creates the main router with all endpoints configured.
///
/// # Endpoints
/// - `POST /search` - Run a search
/// - `GET /search/suggestions?q=` - Completion suggestions
/// - `GET /search/history` - Recent searches
/// - `DELETE /search/history` - Clear recent searches
/// - `GET /search/trending?limit=` - Most searched terms
/// - `POST /search/refresh` - Drop every search-derived cache entry
/// - `GET /stats` - Cache statistics
/// - `GET /health` - Health check endpoint
///
/// # Middleware
/// - CORS: Allows any origin (configurable for production)
/// - Tracing: Logs all requests for debugging
pub fn create_router(state: AppState) -> Router {
    // Configure CORS middleware
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/search", post(search_handler))
        .route("/search/suggestions", get(suggestions_handler))
        .route(
            "/search/history",
            get(history_handler).delete(clear_history_handler),
        )
        .route("/search/trending", get(trending_handler))
        .route("/search/refresh", post(refresh_handler))
        .route("/stats", get(stats_handler))
        .route("/health", get(health_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
