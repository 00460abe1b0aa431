//! Read-Through Module
//!
//! Shared cache-aside logic used by every domain decorator: serve hits from
//! the store, load and populate on a miss, and invalidate dependents after
//! a write.
//!
//! A loaded value is only stored if no invalidation ran while it was loading,
//! so a write that lands mid-load is never undone by the stale value.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use crate::cache::{CacheKey, CacheStore};
use crate::error::UpstreamResult;

/// Builds the namespace tag every key of a domain is indexed under.
pub fn namespace_tag(domain: &str) -> String {
    format!("ns:{}", domain)
}

// == Read Through ==
/// Read-through access to the shared store for one domain.
#[derive(Debug, Clone)]
pub struct ReadThrough {
    cache: Arc<CacheStore>,
    domain: &'static str,
}

impl ReadThrough {
    /// Creates a read-through helper for `domain` over a shared store.
    pub fn new(cache: Arc<CacheStore>, domain: &'static str) -> Self {
        Self { cache, domain }
    }

    /// Returns the shared store.
    pub fn cache(&self) -> &Arc<CacheStore> {
        &self.cache
    }

    /// Returns the domain name used in logs and the namespace tag.
    pub fn domain(&self) -> &'static str {
        self.domain
    }

    // == Fetch ==
    /// Returns the cached value for `key`, or loads, stores and returns it.
    ///
    /// `tags` derives the dependency tags from the loaded value. A loader
    /// error is returned unchanged and nothing is written. Dropping the
    /// returned future before it completes also writes nothing.
    pub async fn fetch<T, L, Fut, D>(
        &self,
        key: &CacheKey,
        ttl: Duration,
        tags: D,
        load: L,
    ) -> UpstreamResult<T>
    where
        T: Clone + Send + Sync + 'static,
        L: FnOnce() -> Fut,
        Fut: Future<Output = UpstreamResult<T>>,
        D: FnOnce(&T) -> Vec<String>,
    {
        if let Some(hit) = self.cache.get::<T>(key.as_str()) {
            debug!(domain = self.domain, key = %key, "Cache hit");
            return Ok(hit);
        }

        debug!(domain = self.domain, key = %key, "Cache miss, loading");
        let generation = self.cache.generation();
        let value = load().await?;
        self.store(generation, key, ttl, tags(&value), value.clone());
        Ok(value)
    }

    /// Like [`fetch`](Self::fetch) for lookups that may find nothing.
    ///
    /// `Ok(None)` is returned to the caller and not cached.
    pub async fn fetch_optional<T, L, Fut, D>(
        &self,
        key: &CacheKey,
        ttl: Duration,
        tags: D,
        load: L,
    ) -> UpstreamResult<Option<T>>
    where
        T: Clone + Send + Sync + 'static,
        L: FnOnce() -> Fut,
        Fut: Future<Output = UpstreamResult<Option<T>>>,
        D: FnOnce(&T) -> Vec<String>,
    {
        if let Some(hit) = self.cache.get::<T>(key.as_str()) {
            debug!(domain = self.domain, key = %key, "Cache hit");
            return Ok(Some(hit));
        }

        debug!(domain = self.domain, key = %key, "Cache miss, loading");
        let generation = self.cache.generation();
        let Some(value) = load().await? else {
            return Ok(None);
        };
        self.store(generation, key, ttl, tags(&value), value.clone());
        Ok(Some(value))
    }

    fn store<T>(
        &self,
        generation: u64,
        key: &CacheKey,
        ttl: Duration,
        mut tags: Vec<String>,
        value: T,
    ) where
        T: Send + Sync + 'static,
    {
        tags.push(namespace_tag(self.domain));
        self.cache
            .set_tagged_if_current(generation, key.as_str(), value, Some(ttl), tags);
    }

    // == Invalidate ==
    /// Deletes the given keys and every key indexed under the given tags.
    ///
    /// Returns the number of entries removed.
    pub fn invalidate<K, T>(&self, keys: K, tags: T) -> usize
    where
        K: IntoIterator<Item = CacheKey>,
        T: IntoIterator<Item = String>,
    {
        let mut removed = keys
            .into_iter()
            .filter(|key| self.cache.delete(key.as_str()))
            .count();
        for tag in tags {
            removed += self.cache.invalidate_tag(&tag);
        }

        debug!(domain = self.domain, removed, "Invalidated dependent entries");
        removed
    }

    /// Drops every entry this domain has cached.
    pub fn invalidate_all(&self) -> usize {
        self.invalidate(Vec::new(), [namespace_tag(self.domain)])
    }
}

/// Tags nothing beyond the domain namespace.
pub fn no_tags<T>(_: &T) -> Vec<String> {
    Vec::new()
}
