//! API Handlers
//!
//! HTTP request handlers for each search server endpoint.

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    Json,
};

use crate::cache::CacheStore;
use crate::config::Config;
use crate::domains::{CachedSearchSource, Catalog, InMemorySearchSource, SearchSource};
use crate::error::{ApiError, Result};
use crate::models::{
    HealthResponse, MessageResponse, RefreshResponse, StatsResponse, SuggestionsQuery,
    SuggestionsResponse, TrendingQuery,
};
use crate::search::{
    SearchHistoryEntry, SearchOrchestrator, SearchRequest, SearchResponse, TrendingTerm,
};

/// Application state shared across all handlers.
///
/// The store is shared by the orchestrator and every cached source; it
/// synchronizes internally.
#[derive(Clone)]
pub struct AppState {
    /// Process-wide cache store
    pub cache: Arc<CacheStore>,
    /// Search entry point
    pub search: Arc<SearchOrchestrator>,
}

impl AppState {
    /// Creates a new AppState from already-built parts.
    pub fn new(cache: Arc<CacheStore>, search: Arc<SearchOrchestrator>) -> Self {
        Self { cache, search }
    }

    /// Wires the store, the cached catalog source and the orchestrator.
    pub fn from_config(config: &Config, catalog: Catalog) -> Self {
        let cache = Arc::new(CacheStore::new(config.default_ttl()));
        let source: Arc<dyn SearchSource> = Arc::new(CachedSearchSource::new(
            InMemorySearchSource::new(catalog),
            cache.clone(),
        ));
        let search = Arc::new(SearchOrchestrator::new(
            source,
            cache.clone(),
            config.search_options(),
        ));
        Self::new(cache, search)
    }
}

/// Handler for POST /search
///
/// An invalid query yields an empty result set, not an error.
pub async fn search_handler(
    State(state): State<AppState>,
    Json(req): Json<SearchRequest>,
) -> Result<Json<SearchResponse>> {
    let response = state.search.search(req).await?;
    Ok(Json(response))
}

/// Handler for GET /search/suggestions
pub async fn suggestions_handler(
    State(state): State<AppState>,
    Query(query): Query<SuggestionsQuery>,
) -> Json<SuggestionsResponse> {
    let suggestions = state.search.suggestions(&query.q).await;
    Json(SuggestionsResponse { suggestions })
}

/// Handler for GET /search/history
pub async fn history_handler(State(state): State<AppState>) -> Json<Vec<SearchHistoryEntry>> {
    Json(state.search.history())
}

/// Handler for DELETE /search/history
pub async fn clear_history_handler(State(state): State<AppState>) -> Json<MessageResponse> {
    state.search.clear_history();
    Json(MessageResponse::new("Search history cleared"))
}

/// Handler for GET /search/trending
pub async fn trending_handler(
    State(state): State<AppState>,
    Query(query): Query<TrendingQuery>,
) -> Result<Json<Vec<TrendingTerm>>> {
    let limit = query.validate().map_err(ApiError::InvalidRequest)?;
    Ok(Json(state.search.trending(limit)))
}

/// Handler for POST /search/refresh
pub async fn refresh_handler(State(state): State<AppState>) -> Json<RefreshResponse> {
    let invalidated = state.search.refresh_index();
    Json(RefreshResponse::new(invalidated))
}

/// Handler for GET /stats
///
/// Returns current cache statistics.
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    Json(state.cache.stats().into())
}

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}
