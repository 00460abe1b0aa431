//! Request DTOs for the search API
//!
//! Query-string parameters for the auxiliary endpoints. The search body
//! itself is [`crate::search::SearchRequest`].

use serde::Deserialize;

/// Default number of trending terms returned
pub const DEFAULT_TRENDING_LIMIT: usize = 10;
/// Largest trending limit accepted
pub const MAX_TRENDING_LIMIT: usize = 50;

/// Query parameters for GET /search/suggestions
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SuggestionsQuery {
    /// Partial query text
    #[serde(default)]
    pub q: String,
}

/// Query parameters for GET /search/trending
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TrendingQuery {
    #[serde(default)]
    pub limit: Option<usize>,
}

impl TrendingQuery {
    /// Returns the effective limit, or an error message if it is out of range.
    pub fn validate(&self) -> Result<usize, String> {
        match self.limit {
            None => Ok(DEFAULT_TRENDING_LIMIT),
            Some(limit) if (1..=MAX_TRENDING_LIMIT).contains(&limit) => Ok(limit),
            Some(_) => Err(format!(
                "limit must be between 1 and {}",
                MAX_TRENDING_LIMIT
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_suggestions_query_defaults_to_empty() {
        let query: SuggestionsQuery = serde_json::from_str("{}").unwrap();
        assert!(query.q.is_empty());
    }

    #[test]
    fn test_trending_limit_default() {
        assert_eq!(TrendingQuery::default().validate(), Ok(DEFAULT_TRENDING_LIMIT));
    }

    #[test]
    fn test_trending_limit_bounds() {
        assert_eq!(TrendingQuery { limit: Some(5) }.validate(), Ok(5));
        assert!(TrendingQuery { limit: Some(0) }.validate().is_err());
        assert!(TrendingQuery {
            limit: Some(MAX_TRENDING_LIMIT + 1)
        }
        .validate()
        .is_err());
    }
}
