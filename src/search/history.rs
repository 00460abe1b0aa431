//! Search History
//!
//! Bounded, most-recent-first list of completed searches.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};

use crate::search::types::SearchHistoryEntry;

/// Default number of entries kept
pub const DEFAULT_HISTORY_CAP: usize = 10;

// == Search History ==
/// Front = most recent. Holds at most `cap` entries and no duplicate queries.
#[derive(Debug, Clone)]
pub struct SearchHistory {
    entries: VecDeque<SearchHistoryEntry>,
    cap: usize,
}

impl SearchHistory {
    pub fn new(cap: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(cap),
            cap,
        }
    }

    /// Records a search, moving an existing entry for the same query to the
    /// front instead of duplicating it.
    pub fn record(&mut self, query: &str, result_count: usize, timestamp: DateTime<Utc>) {
        if self.cap == 0 {
            return;
        }

        self.entries.retain(|entry| entry.query != query);
        self.entries.push_front(SearchHistoryEntry {
            query: query.to_string(),
            timestamp,
            result_count,
        });
        self.entries.truncate(self.cap);
    }

    /// Returns the entries, most recent first.
    pub fn entries(&self) -> Vec<SearchHistoryEntry> {
        self.entries.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl Default for SearchHistory {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_CAP)
    }
}
