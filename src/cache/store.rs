//! Cache Store Module
//!
//! Main cache engine: a lock-guarded map of type-erased entries with TTL
//! expiration and a tag index for dependency-based invalidation.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use tracing::{debug, warn};

use crate::cache::entry::{CacheEntry, StoredValue};
use crate::cache::stats::StatCounters;
use crate::cache::CacheStats;
use crate::clock::{SharedClock, SystemClock};

// == Store Internals ==
#[derive(Debug, Default)]
struct Inner {
    /// Key-value storage
    entries: HashMap<String, CacheEntry>,
    /// Tag -> keys currently stored under that tag
    tags: HashMap<String, HashSet<String>>,
    /// Bumped by every explicit invalidation
    generation: u64,
}

impl Inner {
    fn insert(&mut self, key: String, entry: CacheEntry) {
        if let Some(previous) = self.entries.remove(&key) {
            self.unlink(&key, &previous.tags);
        }
        for tag in &entry.tags {
            self.tags
                .entry(tag.clone())
                .or_default()
                .insert(key.clone());
        }
        self.entries.insert(key, entry);
    }

    fn remove(&mut self, key: &str) -> Option<CacheEntry> {
        let entry = self.entries.remove(key)?;
        self.unlink(key, &entry.tags);
        Some(entry)
    }

    fn unlink(&mut self, key: &str, tags: &[String]) {
        for tag in tags {
            if let Some(keys) = self.tags.get_mut(tag) {
                keys.remove(key);
                if keys.is_empty() {
                    self.tags.remove(tag);
                }
            }
        }
    }
}

// == Cache Store ==
/// Thread-safe TTL cache shared by every domain service.
///
/// Reads share a read lock; writes, sweeps and lazy removal of an expired
/// entry take the write lock. Nothing here can fail: a value of the wrong
/// type is logged, counted as a fault and reported as a miss.
#[derive(Debug)]
pub struct CacheStore {
    inner: RwLock<Inner>,
    /// Performance statistics
    stats: StatCounters,
    /// TTL applied when `set` is called without one
    default_ttl: Duration,
    clock: SharedClock,
}

impl CacheStore {
    // == Constructor ==
    /// Creates a new CacheStore on the system clock.
    pub fn new(default_ttl: Duration) -> Self {
        Self::with_clock(default_ttl, Arc::new(SystemClock))
    }

    /// Creates a new CacheStore reading time from `clock`.
    pub fn with_clock(default_ttl: Duration, clock: SharedClock) -> Self {
        Self {
            inner: RwLock::new(Inner::default()),
            stats: StatCounters::default(),
            default_ttl,
            clock,
        }
    }

    /// Returns the TTL used when none is given.
    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    /// Returns the clock this store expires entries against.
    pub fn clock(&self) -> &SharedClock {
        &self.clock
    }

    // == Get ==
    /// Retrieves a value by key.
    ///
    /// Returns the value only if present and unexpired. An expired entry is
    /// removed as a side effect.
    pub fn get<T>(&self, key: &str) -> Option<T>
    where
        T: Clone + Send + Sync + 'static,
    {
        let now = self.clock.now_ms();

        {
            let inner = self.inner.read();
            match inner.entries.get(key) {
                None => {
                    self.stats.record_miss();
                    return None;
                }
                Some(entry) if !entry.is_expired(now) => {
                    return match entry.downcast::<T>() {
                        Some(value) => {
                            self.stats.record_hit();
                            Some(value)
                        }
                        None => {
                            warn!(
                                key,
                                expected = std::any::type_name::<T>(),
                                "Cache fault: stored value has a different type"
                            );
                            self.stats.record_fault();
                            self.stats.record_miss();
                            None
                        }
                    };
                }
                Some(_) => {}
            }
        }

        // Expired: re-check under the write lock, a writer may have replaced it
        let mut inner = self.inner.write();
        let still_expired = inner
            .entries
            .get(key)
            .map(|entry| entry.is_expired(now))
            .unwrap_or(false);
        if still_expired {
            inner.remove(key);
            self.stats.record_expirations(1);
            debug!(key, "Evicted expired entry on read");
        }
        self.stats.record_miss();
        None
    }

    // == Set ==
    /// Stores a value with an optional TTL (default TTL if `None`).
    ///
    /// Any existing entry for the key is overwritten and its TTL reset.
    pub fn set<T>(&self, key: impl Into<String>, value: T, ttl: Option<Duration>)
    where
        T: Send + Sync + 'static,
    {
        self.set_tagged(key, value, ttl, Vec::<String>::new());
    }

    /// Stores a value and indexes it under the given dependency tags.
    pub fn set_tagged<T, I, S>(
        &self,
        key: impl Into<String>,
        value: T,
        ttl: Option<Duration>,
        tags: I,
    ) where
        T: Send + Sync + 'static,
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let entry = self.build_entry(value, ttl, tags);
        self.inner.write().insert(key.into(), entry);
    }

    /// Returns the invalidation generation.
    ///
    /// Every `delete`, `invalidate_tag` and `clear` advances it, whether or
    /// not anything was removed. Expiry does not.
    pub fn generation(&self) -> u64 {
        self.inner.read().generation
    }

    /// Like [`set_tagged`](Self::set_tagged), but only stores the value if no
    /// invalidation has happened since `generation` was read.
    ///
    /// Returns whether the value was stored.
    pub fn set_tagged_if_current<T, I, S>(
        &self,
        generation: u64,
        key: impl Into<String>,
        value: T,
        ttl: Option<Duration>,
        tags: I,
    ) -> bool
    where
        T: Send + Sync + 'static,
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let key = key.into();
        let entry = self.build_entry(value, ttl, tags);

        let mut inner = self.inner.write();
        if inner.generation != generation {
            debug!(key = %key, "Skipped store, invalidated while loading");
            return false;
        }
        inner.insert(key, entry);
        true
    }

    fn build_entry<T, I, S>(&self, value: T, ttl: Option<Duration>, tags: I) -> CacheEntry
    where
        T: Send + Sync + 'static,
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut tags: Vec<String> = tags.into_iter().map(Into::into).collect();
        tags.sort();
        tags.dedup();

        let stored: StoredValue = Arc::new(value);
        CacheEntry::new(
            stored,
            self.clock.now_ms(),
            ttl.unwrap_or(self.default_ttl),
            tags,
        )
    }

    // == Delete ==
    /// Removes an entry by key. Returns whether an entry was present.
    pub fn delete(&self, key: &str) -> bool {
        let removed = {
            let mut inner = self.inner.write();
            inner.generation += 1;
            inner.remove(key).is_some()
        };
        if removed {
            self.stats.record_invalidations(1);
        }
        removed
    }

    // == Invalidate Tag ==
    /// Removes every entry indexed under `tag`. Returns the number removed.
    pub fn invalidate_tag(&self, tag: &str) -> usize {
        let mut inner = self.inner.write();
        inner.generation += 1;
        let Some(keys) = inner.tags.remove(tag) else {
            return 0;
        };

        let removed = keys
            .iter()
            .filter(|key| inner.remove(key).is_some())
            .count();
        drop(inner);

        self.stats.record_invalidations(removed);
        debug!(tag, removed, "Invalidated tagged entries");
        removed
    }

    // == Contains ==
    /// Returns true if a live entry exists for the key.
    pub fn contains(&self, key: &str) -> bool {
        let now = self.clock.now_ms();
        self.inner
            .read()
            .entries
            .get(key)
            .map(|entry| !entry.is_expired(now))
            .unwrap_or(false)
    }

    /// Returns the remaining TTL of a live entry.
    pub fn ttl_remaining(&self, key: &str) -> Option<Duration> {
        let now = self.clock.now_ms();
        self.inner
            .read()
            .entries
            .get(key)
            .filter(|entry| !entry.is_expired(now))
            .map(|entry| Duration::from_millis(entry.ttl_remaining_ms(now)))
    }

    // == Size ==
    /// Returns the number of stored entries, including unswept expired ones.
    pub fn size(&self) -> usize {
        self.inner.read().entries.len()
    }

    /// Returns true if the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }

    // == Clear ==
    /// Removes all entries.
    pub fn clear(&self) {
        let mut inner = self.inner.write();
        let count = inner.entries.len();
        inner.generation += 1;
        inner.entries.clear();
        inner.tags.clear();
        drop(inner);

        self.stats.record_invalidations(count);
    }

    // == Cleanup ==
    /// Removes all expired entries from the cache.
    ///
    /// Returns the number of entries removed.
    pub fn cleanup(&self) -> usize {
        let now = self.clock.now_ms();
        let mut inner = self.inner.write();

        let expired_keys: Vec<String> = inner
            .entries
            .iter()
            .filter(|(_, entry)| entry.is_expired(now))
            .map(|(key, _)| key.clone())
            .collect();

        for key in &expired_keys {
            inner.remove(key);
        }
        drop(inner);

        self.stats.record_expirations(expired_keys.len());
        expired_keys.len()
    }

    // == Stats ==
    /// Returns current cache statistics.
    pub fn stats(&self) -> CacheStats {
        self.stats.snapshot(self.size())
    }

    #[cfg(test)]
    pub(crate) fn tag_count(&self) -> usize {
        self.inner.read().tags.len()
    }
}
