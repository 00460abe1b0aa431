//! Search Orchestrator
//!
//! Runs a search end to end: validate, consult the ranked-list cache, fetch
//! and rank on a miss, paginate, and record history and trending counts.

use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use serde::Serialize;
use tracing::{debug, error, info, warn, Level};

use crate::cache::{CacheKey, CacheStore};
use crate::clock::SharedClock;
use crate::domains::search_data::{SearchSource, SEARCH_TAG};
use crate::error::SearchError;
use crate::search::history::{SearchHistory, DEFAULT_HISTORY_CAP};
use crate::search::paginate::{filter, paginate, rank};
use crate::search::trending::TrendingTracker;
use crate::search::types::{
    SearchHistoryEntry, SearchQuery, SearchRequest, SearchResponse, SearchResult, TrendingTerm,
};
use crate::search::validate::{normalize_query, validate, validate_query_text};

/// TTL for cached ranked lists
pub const RANKED_TTL: Duration = Duration::from_secs(5 * 60);
/// Most suggestions returned for one query
pub const MAX_SUGGESTIONS: usize = 5;

type RankedList = Arc<Vec<SearchResult>>;

// == Search Options ==
#[derive(Debug, Clone)]
pub struct SearchOptions {
    /// Upper bound on a single backing fetch
    pub fetch_timeout: Duration,
    /// History entries kept
    pub history_cap: usize,
    /// Width of one trending window
    pub trending_window: Duration,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            fetch_timeout: Duration::from_secs(5),
            history_cap: DEFAULT_HISTORY_CAP,
            trending_window: Duration::from_secs(3600),
        }
    }
}

// == Search Stats ==
/// Summary of one result set.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchStats {
    pub query: String,
    pub total_results: usize,
    pub by_type: BTreeMap<String, usize>,
    pub search_time_ms: f64,
    pub average_relevance: f64,
}

// == Search Orchestrator ==
pub struct SearchOrchestrator {
    source: Arc<dyn SearchSource>,
    cache: Arc<CacheStore>,
    clock: SharedClock,
    fetch_timeout: Duration,
    history: Mutex<SearchHistory>,
    trending: Mutex<TrendingTracker>,
}

impl SearchOrchestrator {
    /// Creates an orchestrator over a (usually cached) source and the shared store.
    pub fn new(source: Arc<dyn SearchSource>, cache: Arc<CacheStore>, options: SearchOptions) -> Self {
        let window = chrono::Duration::from_std(options.trending_window)
            .unwrap_or_else(|_| chrono::Duration::hours(1));

        Self {
            source,
            clock: cache.clock().clone(),
            cache,
            fetch_timeout: options.fetch_timeout,
            history: Mutex::new(SearchHistory::new(options.history_cap)),
            trending: Mutex::new(TrendingTracker::new(window)),
        }
    }

    // == Search ==
    /// Runs one search request.
    ///
    /// An invalid request yields an empty response without touching the
    /// source. A failed or timed-out fetch writes nothing and records no
    /// history.
    pub async fn search(&self, request: SearchRequest) -> Result<SearchResponse, SearchError> {
        let started = Instant::now();

        let query = match validate(&request) {
            Ok(query) => query,
            Err(e) => {
                debug!(query = %request.query, reason = %e, "Rejected search request");
                return Ok(SearchResponse::empty(request.page.unwrap_or(1)));
            }
        };

        let key = ranked_key(&query);
        let (ranked, suggestions) = match self.cache.get::<RankedList>(key.as_str()) {
            Some(hit) => {
                debug!(key = %key, "Ranked list cache hit");
                (hit, self.suggestions(&query.text).await)
            }
            None => {
                let generation = self.cache.generation();
                let (candidates, suggestions) =
                    tokio::join!(self.fetch_candidates(&query.text), self.suggestions(&query.text));
                let ranked: RankedList = Arc::new(self.rank(candidates?, &query));
                self.cache.set_tagged_if_current(
                    generation,
                    key.as_str(),
                    ranked.clone(),
                    Some(RANKED_TTL),
                    [SEARCH_TAG],
                );
                (ranked, suggestions)
            }
        };

        let page = paginate(&ranked, query.page, query.page_size);
        let search_time_ms = started.elapsed().as_secs_f64() * 1000.0;

        let now = self.clock.now();
        self.history.lock().record(&query.text, page.total, now);
        self.trending.lock().record(&query.text, now);

        if tracing::enabled!(Level::DEBUG) {
            let stats = self.stats(&ranked, &query.text, search_time_ms);
            debug!(?stats, "Search completed");
        }

        Ok(SearchResponse {
            results: page.items,
            total_results: page.total,
            current_page: query.page,
            total_pages: page.total_pages,
            has_more: page.has_more,
            search_time_ms,
            suggestions,
        })
    }

    /// Runs a search that stops early when `cancel` resolves.
    ///
    /// Cancellation yields [`SearchError::Cancelled`] with no cache write and
    /// no history entry.
    pub async fn search_with_cancel<C>(
        &self,
        request: SearchRequest,
        cancel: C,
    ) -> Result<SearchResponse, SearchError>
    where
        C: Future<Output = ()>,
    {
        tokio::select! {
            biased;
            _ = cancel => {
                debug!("Search cancelled by caller");
                Err(SearchError::Cancelled)
            }
            result = self.search(request) => result,
        }
    }

    async fn fetch_candidates(&self, query: &str) -> Result<Vec<SearchResult>, SearchError> {
        match tokio::time::timeout(self.fetch_timeout, self.source.candidates(query)).await {
            Ok(Ok(candidates)) => Ok(candidates),
            Ok(Err(e)) => {
                error!(query, error = %e, "Search fetch failed");
                Err(SearchError::upstream(e))
            }
            Err(_) => {
                warn!(query, timeout_ms = self.fetch_timeout.as_millis() as u64, "Search fetch timed out");
                Err(SearchError::Cancelled)
            }
        }
    }

    fn rank(&self, candidates: Vec<SearchResult>, query: &SearchQuery) -> Vec<SearchResult> {
        let filtered = filter(candidates, &query.filters);
        rank(filtered, &query.text, self.clock.now(), query.sort_by, query.sort_order)
            .into_iter()
            .map(|scored| scored.item)
            .collect()
    }

    // == Suggestions ==
    /// Returns up to [`MAX_SUGGESTIONS`] completions. Any failure yields none.
    pub async fn suggestions(&self, query: &str) -> Vec<String> {
        if validate_query_text(query).is_err() {
            return Vec::new();
        }
        let query = normalize_query(query);

        match tokio::time::timeout(self.fetch_timeout, self.source.suggestions(&query)).await {
            Ok(Ok(mut suggestions)) => {
                suggestions.truncate(MAX_SUGGESTIONS);
                suggestions
            }
            Ok(Err(e)) => {
                warn!(query = %query, error = %e, "Failed to load suggestions");
                Vec::new()
            }
            Err(_) => {
                warn!(query = %query, "Suggestion fetch timed out");
                Vec::new()
            }
        }
    }

    // == History and Trending ==
    /// Returns recent searches, most recent first.
    pub fn history(&self) -> Vec<SearchHistoryEntry> {
        self.history.lock().entries()
    }

    pub fn clear_history(&self) {
        self.history.lock().clear();
        info!("Search history cleared");
    }

    /// Returns the most searched terms.
    pub fn trending(&self, limit: usize) -> Vec<TrendingTerm> {
        self.trending.lock().top(limit, self.clock.now())
    }

    // == Maintenance ==
    /// Invalidates every search-derived cache entry.
    pub fn refresh_index(&self) -> usize {
        let removed = self.cache.invalidate_tag(SEARCH_TAG);
        info!(removed, "Search index refreshed");
        removed
    }

    /// Summarizes a result set by type and average base relevance.
    pub fn stats(&self, results: &[SearchResult], query: &str, search_time_ms: f64) -> SearchStats {
        let mut by_type = BTreeMap::new();
        for result in results {
            *by_type.entry(result.result_type.clone()).or_insert(0) += 1;
        }

        let average_relevance = if results.is_empty() {
            0.0
        } else {
            results.iter().map(|r| r.relevance).sum::<f64>() / results.len() as f64
        };

        SearchStats {
            query: query.to_string(),
            total_results: results.len(),
            by_type,
            search_time_ms,
            average_relevance,
        }
    }
}

/// Key of the ranked list for a normalized query.
pub fn ranked_key(query: &SearchQuery) -> CacheKey {
    CacheKey::new("search")
        .arg(&query.text)
        .set_arg(&query.filters)
        .arg(query.sort_by)
        .arg(query.sort_order)
}
