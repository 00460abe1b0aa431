//! Relevance Scorer
//!
//! Additive, fixed-weight scoring of a candidate against a normalized query.

use chrono::{DateTime, Duration, Utc};

use crate::search::types::SearchResult;

// == Weights ==
/// Title equals the query
pub const EXACT_MATCH_WEIGHT: f64 = 10.0;
/// Title contains the query
pub const TITLE_MATCH_WEIGHT: f64 = 5.0;
/// Description contains the query
pub const DESCRIPTION_MATCH_WEIGHT: f64 = 2.0;
/// Timestamp younger than the recency window
pub const RECENCY_BONUS: f64 = 1.0;
/// Age below which a result counts as recent
pub const RECENCY_WINDOW_DAYS: i64 = 7;

/// Scores `result` against an already-normalized `query` as of `now`.
///
/// Pure: the same inputs always give the same score.
pub fn score(result: &SearchResult, query: &str, now: DateTime<Utc>) -> f64 {
    let query = query.to_lowercase();
    let title = result.title.to_lowercase();
    let mut score = result.relevance;

    if title == query {
        score += EXACT_MATCH_WEIGHT;
    } else if title.contains(&query) {
        score += TITLE_MATCH_WEIGHT;
    }

    if result.description.to_lowercase().contains(&query) {
        score += DESCRIPTION_MATCH_WEIGHT;
    }

    if let Some(timestamp) = result.timestamp {
        if now - timestamp < Duration::days(RECENCY_WINDOW_DAYS) {
            score += RECENCY_BONUS;
        }
    }

    score
}
