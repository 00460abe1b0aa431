//! Search Data Module
//!
//! The backing search accessor, its cached decorator, and an in-memory
//! catalog implementation used by the server binary.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::cache::{CacheKey, CacheStore};
use crate::domains::read_through::ReadThrough;
use crate::error::UpstreamResult;
use crate::search::types::SearchResult;

/// Tag shared by every search-derived cache key
pub const SEARCH_TAG: &str = "search";

/// TTL for raw candidate lists
pub const CANDIDATES_TTL: Duration = Duration::from_secs(5 * 60);
/// TTL for suggestion lists
pub const SUGGESTIONS_TTL: Duration = Duration::from_secs(10 * 60);

// == Search Source ==
/// Backing accessor for search candidates and suggestions.
#[async_trait]
pub trait SearchSource: Send + Sync {
    /// Returns the unranked candidates for a normalized query.
    async fn candidates(&self, query: &str) -> UpstreamResult<Vec<SearchResult>>;

    /// Returns completion suggestions for a normalized query.
    async fn suggestions(&self, query: &str) -> UpstreamResult<Vec<String>>;
}

#[async_trait]
impl<T: SearchSource + ?Sized> SearchSource for Arc<T> {
    async fn candidates(&self, query: &str) -> UpstreamResult<Vec<SearchResult>> {
        (**self).candidates(query).await
    }

    async fn suggestions(&self, query: &str) -> UpstreamResult<Vec<String>> {
        (**self).suggestions(query).await
    }
}

// == Cached Search Source ==
/// Read-through decorator over a [`SearchSource`].
pub struct CachedSearchSource<S> {
    inner: S,
    read_through: ReadThrough,
}

impl<S: SearchSource> CachedSearchSource<S> {
    pub fn new(inner: S, cache: Arc<CacheStore>) -> Self {
        Self {
            inner,
            read_through: ReadThrough::new(cache, "search_data"),
        }
    }

    /// Drops candidates and suggestions, leaving ranked lists in place.
    pub fn clear_cache(&self) -> usize {
        self.read_through.invalidate_all()
    }

    /// Drops every search-derived key, ranked lists included.
    pub fn refresh_index(&self) -> usize {
        self.read_through
            .invalidate(Vec::new(), [SEARCH_TAG.to_string()])
    }
}

fn search_tags<T>(_: &T) -> Vec<String> {
    vec![SEARCH_TAG.to_string()]
}

#[async_trait]
impl<S: SearchSource> SearchSource for CachedSearchSource<S> {
    async fn candidates(&self, query: &str) -> UpstreamResult<Vec<SearchResult>> {
        let key = CacheKey::new("search_candidates").arg(query);
        self.read_through
            .fetch(&key, CANDIDATES_TTL, search_tags, || {
                self.inner.candidates(query)
            })
            .await
    }

    async fn suggestions(&self, query: &str) -> UpstreamResult<Vec<String>> {
        let key = CacheKey::new("suggestions").arg(query);
        self.read_through
            .fetch(&key, SUGGESTIONS_TTL, search_tags, || {
                self.inner.suggestions(query)
            })
            .await
    }
}

// == Catalog ==
#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("failed to read catalog: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse catalog: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Searchable documents plus curated suggestion phrases.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Catalog {
    #[serde(default)]
    pub results: Vec<SearchResult>,
    #[serde(default)]
    pub suggestions: Vec<String>,
}

impl Catalog {
    /// Loads a catalog from a JSON file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        let catalog: Catalog = serde_json::from_str(&raw)?;
        info!(
            path = %path.as_ref().display(),
            results = catalog.results.len(),
            suggestions = catalog.suggestions.len(),
            "Loaded search catalog"
        );
        Ok(catalog)
    }
}

// == In-Memory Search Source ==
/// Case-insensitive substring search over a fixed [`Catalog`].
#[derive(Debug, Clone, Default)]
pub struct InMemorySearchSource {
    catalog: Catalog,
}

impl InMemorySearchSource {
    pub fn new(catalog: Catalog) -> Self {
        Self { catalog }
    }

    fn matches(result: &SearchResult, query: &str) -> bool {
        result.title.to_lowercase().contains(query)
            || result.description.to_lowercase().contains(query)
            || result
                .tags
                .iter()
                .any(|tag| tag.to_lowercase().contains(query))
    }
}

#[async_trait]
impl SearchSource for InMemorySearchSource {
    async fn candidates(&self, query: &str) -> UpstreamResult<Vec<SearchResult>> {
        let query = query.to_lowercase();
        Ok(self
            .catalog
            .results
            .iter()
            .filter(|result| Self::matches(result, &query))
            .cloned()
            .collect())
    }

    async fn suggestions(&self, query: &str) -> UpstreamResult<Vec<String>> {
        let query = query.to_lowercase();
        Ok(self
            .catalog
            .suggestions
            .iter()
            .filter(|s| s.to_lowercase().contains(&query))
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::UpstreamError;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct CountingSource {
        calls: AtomicUsize,
        fail: bool,
    }

    #[async_trait]
    impl SearchSource for CountingSource {
        async fn candidates(&self, query: &str) -> UpstreamResult<Vec<SearchResult>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(UpstreamError::Unavailable("index offline".to_string()));
            }
            Ok(vec![SearchResult::new("1", "message", query, "")])
        }

        async fn suggestions(&self, query: &str) -> UpstreamResult<Vec<String>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(vec![format!("{} tutorial", query)])
        }
    }

    fn store() -> Arc<CacheStore> {
        Arc::new(CacheStore::new(Duration::from_secs(60)))
    }

    fn catalog() -> Catalog {
        Catalog {
            results: vec![
                SearchResult::new("u1", "user", "Ada", "Rust engineer"),
                SearchResult::new("c1", "channel", "general", "Chat")
                    .with_tags(["Rust", "community"]),
                SearchResult::new("m1", "message", "Lunch?", "anyone hungry"),
            ],
            suggestions: vec!["rust async".to_string(), "react hooks".to_string()],
        }
    }

    #[tokio::test]
    async fn test_cached_candidates_hit_skips_source() {
        let source = Arc::new(CountingSource::default());
        let cached = CachedSearchSource::new(source.clone(), store());

        cached.candidates("rust").await.unwrap();
        cached.candidates("rust").await.unwrap();
        cached.suggestions("rust").await.unwrap();
        cached.suggestions("rust").await.unwrap();

        assert_eq!(source.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_refresh_index_forces_reload() {
        let source = Arc::new(CountingSource::default());
        let cache = store();
        let cached = CachedSearchSource::new(source.clone(), cache.clone());

        cached.candidates("rust").await.unwrap();
        cached.suggestions("rust").await.unwrap();
        assert_eq!(cached.refresh_index(), 2);
        assert!(cache.is_empty());

        cached.candidates("rust").await.unwrap();
        assert_eq!(source.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_clear_cache_keeps_other_entries() {
        let source = Arc::new(CountingSource::default());
        let cache = store();
        let cached = CachedSearchSource::new(source.clone(), cache.clone());

        cache.set_tagged("search:rust:all:relevance:desc", 1u8, None, [SEARCH_TAG]);
        cached.candidates("rust").await.unwrap();
        cached.suggestions("rust").await.unwrap();

        assert_eq!(cached.clear_cache(), 2);
        assert!(cache.contains("search:rust:all:relevance:desc"));
    }

    #[tokio::test]
    async fn test_failure_passes_through_uncached() {
        let source = Arc::new(CountingSource {
            fail: true,
            ..Default::default()
        });
        let cache = store();
        let cached = CachedSearchSource::new(source, cache.clone());

        let err = cached.candidates("rust").await.unwrap_err();
        assert_eq!(err, UpstreamError::Unavailable("index offline".to_string()));
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn test_in_memory_matches_title_description_and_tags() {
        let source = InMemorySearchSource::new(catalog());

        let hits = source.candidates("rust").await.unwrap();
        let ids: Vec<&str> = hits.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["u1", "c1"]);

        assert!(source.candidates("zig").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_in_memory_suggestions() {
        let source = InMemorySearchSource::new(catalog());
        assert_eq!(source.suggestions("hook").await.unwrap(), vec!["react hooks"]);
    }

    #[test]
    fn test_catalog_from_json() {
        let json = r#"{"results":[{"id":"1","type":"user","title":"Ada","description":"x"}]}"#;
        let catalog: Catalog = serde_json::from_str(json).unwrap();
        assert_eq!(catalog.results.len(), 1);
        assert!(catalog.suggestions.is_empty());
    }

    #[test]
    fn test_catalog_missing_file() {
        let err = Catalog::from_path("/definitely/not/here.json").unwrap_err();
        assert!(matches!(err, CatalogError::Io(_)));
    }
}
