//! Trending Terms
//!
//! Best-effort per-query counters over rotating time windows.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};

use crate::search::types::{Trend, TrendingTerm};

#[derive(Debug, Clone, Default)]
struct Counter {
    total: u64,
    current: u64,
    previous: u64,
}

// == Trending Tracker ==
/// Counts searches per query. The trend compares the current window's count
/// with the previous window's.
#[derive(Debug, Clone)]
pub struct TrendingTracker {
    counters: HashMap<String, Counter>,
    window: Duration,
    window_start: Option<DateTime<Utc>>,
}

impl TrendingTracker {
    pub fn new(window: Duration) -> Self {
        Self {
            counters: HashMap::new(),
            window,
            window_start: None,
        }
    }

    /// Counts one completed search for `query`.
    pub fn record(&mut self, query: &str, now: DateTime<Utc>) {
        self.rotate(now);
        let counter = self.counters.entry(query.to_string()).or_default();
        counter.total += 1;
        counter.current += 1;
    }

    /// Returns up to `limit` terms by total count, ties broken by query.
    pub fn top(&mut self, limit: usize, now: DateTime<Utc>) -> Vec<TrendingTerm> {
        self.rotate(now);

        let mut terms: Vec<TrendingTerm> = self
            .counters
            .iter()
            .map(|(query, counter)| TrendingTerm {
                query: query.clone(),
                count: counter.total,
                trend: match counter.current.cmp(&counter.previous) {
                    std::cmp::Ordering::Greater => Trend::Up,
                    std::cmp::Ordering::Less => Trend::Down,
                    std::cmp::Ordering::Equal => Trend::Stable,
                },
            })
            .collect();

        terms.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.query.cmp(&b.query)));
        terms.truncate(limit);
        terms
    }

    fn rotate(&mut self, now: DateTime<Utc>) {
        let Some(start) = self.window_start else {
            self.window_start = Some(now);
            return;
        };

        let elapsed = now - start;
        if elapsed < self.window {
            return;
        }

        // More than one full window passed: the previous window saw nothing
        let skipped_window = elapsed >= self.window * 2;
        for counter in self.counters.values_mut() {
            counter.previous = if skipped_window { 0 } else { counter.current };
            counter.current = 0;
        }
        self.window_start = Some(now);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
    }

    #[test]
    fn test_counts_and_order() {
        let mut tracker = TrendingTracker::new(Duration::hours(1));
        for q in ["rust", "go", "rust", "zig", "rust", "go"] {
            tracker.record(q, t0());
        }

        let top = tracker.top(2, t0());
        assert_eq!(top.len(), 2);
        assert_eq!(top[0].query, "rust");
        assert_eq!(top[0].count, 3);
        assert_eq!(top[1].query, "go");
    }

    #[test]
    fn test_trend_direction() {
        let mut tracker = TrendingTracker::new(Duration::hours(1));
        tracker.record("rust", t0());
        tracker.record("go", t0());
        tracker.record("go", t0());

        let later = t0() + Duration::minutes(90);
        tracker.record("rust", later);
        tracker.record("rust", later);

        let top = tracker.top(10, later);
        let rust = top.iter().find(|t| t.query == "rust").unwrap();
        let go = top.iter().find(|t| t.query == "go").unwrap();
        assert_eq!(rust.trend, Trend::Up);
        assert_eq!(go.trend, Trend::Down);
    }

    #[test]
    fn test_idle_windows_reset_trend() {
        let mut tracker = TrendingTracker::new(Duration::hours(1));
        tracker.record("rust", t0());

        let much_later = t0() + Duration::hours(5);
        let top = tracker.top(10, much_later);
        assert_eq!(top[0].trend, Trend::Stable);
        assert_eq!(top[0].count, 1);
    }
}
