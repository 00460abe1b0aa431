//! Result Filter and Paginator
//!
//! Type filtering, stable ranking and page-window slicing.

use std::cmp::Ordering;
use std::collections::BTreeSet;

use chrono::{DateTime, Utc};

use crate::search::scorer;
use crate::search::types::{ScoredResult, SearchResult, SortBy, SortOrder, FILTER_ALL};

// == Filter ==
/// Keeps only results whose type is in `filters`, preserving order.
///
/// Filters are lowercase; types match regardless of case. An empty set, or
/// one containing `"all"`, keeps everything.
pub fn filter(results: Vec<SearchResult>, filters: &BTreeSet<String>) -> Vec<SearchResult> {
    if filters.is_empty() || filters.contains(FILTER_ALL) {
        return results;
    }

    results
        .into_iter()
        .filter(|result| filters.contains(&result.result_type.to_lowercase()))
        .collect()
}

// == Rank ==
/// Scores every result and sorts them.
///
/// The sort is stable: results that compare equal keep their input order.
pub fn rank(
    results: Vec<SearchResult>,
    query: &str,
    now: DateTime<Utc>,
    sort_by: SortBy,
    sort_order: SortOrder,
) -> Vec<ScoredResult> {
    let mut scored: Vec<ScoredResult> = results
        .into_iter()
        .map(|item| {
            let score = scorer::score(&item, query, now);
            ScoredResult { item, score }
        })
        .collect();

    scored.sort_by(|a, b| {
        let ordering = compare(a, b, sort_by);
        match sort_order {
            SortOrder::Asc => ordering,
            SortOrder::Desc => ordering.reverse(),
        }
    });

    scored
}

fn compare(a: &ScoredResult, b: &ScoredResult, sort_by: SortBy) -> Ordering {
    match sort_by {
        SortBy::Relevance => a.score.total_cmp(&b.score),
        // Undated results sort as oldest
        SortBy::Date => a.item.timestamp.cmp(&b.item.timestamp),
        SortBy::Title => a
            .item
            .title
            .to_lowercase()
            .cmp(&b.item.title.to_lowercase()),
    }
}

// == Paginate ==
/// One page window of a result set.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Size of the whole (filtered) set
    pub total: usize,
    pub total_pages: usize,
    pub has_more: bool,
}

/// Slices the 1-based `page` of `page_size` items out of `items`.
///
/// A page past the end yields an empty window with `has_more == false`.
/// `page_size` must be positive; validation rejects zero before this point.
pub fn paginate<T: Clone>(items: &[T], page: usize, page_size: usize) -> Page<T> {
    let total = items.len();
    let page_size = page_size.max(1);
    let start = page.saturating_sub(1).saturating_mul(page_size);
    let end = start.saturating_add(page_size);

    let window = if start < total {
        items[start..end.min(total)].to_vec()
    } else {
        Vec::new()
    };

    Page {
        items: window,
        total,
        total_pages: total.div_ceil(page_size),
        has_more: end < total,
    }
}
