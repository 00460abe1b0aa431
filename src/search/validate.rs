//! Query Validation
//!
//! Shape rules for incoming search requests, and query normalization.

use std::collections::BTreeSet;

use thiserror::Error;

use crate::search::types::{SearchQuery, SearchRequest, DEFAULT_PAGE_SIZE};

/// Minimum query length in characters, after trimming
pub const MIN_QUERY_LENGTH: usize = 1;
/// Maximum query length in characters, after trimming
pub const MAX_QUERY_LENGTH: usize = 100;
/// Largest page size a request may ask for
pub const MAX_PAGE_SIZE: usize = 100;
/// Characters never accepted in a query
pub const FORBIDDEN_CHARS: [char; 4] = ['<', '>', '{', '}'];

// == Validation Error ==
/// Why a request was rejected. Never surfaced to search callers as a failure.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("query is empty")]
    EmptyQuery,

    #[error("query is shorter than {} characters", MIN_QUERY_LENGTH)]
    QueryTooShort,

    #[error("query is longer than {} characters", MAX_QUERY_LENGTH)]
    QueryTooLong,

    #[error("query contains forbidden character '{0}'")]
    ForbiddenCharacter(char),

    #[error("page must be 1 or greater")]
    InvalidPage,

    #[error("limit must be between 1 and {}", MAX_PAGE_SIZE)]
    InvalidPageSize,
}

/// Trims and lowercases a query.
pub fn normalize_query(query: &str) -> String {
    query.trim().to_lowercase()
}

/// Checks the query text rules on its own.
pub fn validate_query_text(query: &str) -> Result<(), ValidationError> {
    let trimmed = query.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::EmptyQuery);
    }

    let length = trimmed.chars().count();
    if length < MIN_QUERY_LENGTH {
        return Err(ValidationError::QueryTooShort);
    }
    if length > MAX_QUERY_LENGTH {
        return Err(ValidationError::QueryTooLong);
    }

    if let Some(c) = trimmed.chars().find(|c| FORBIDDEN_CHARS.contains(c)) {
        return Err(ValidationError::ForbiddenCharacter(c));
    }

    Ok(())
}

/// Validates a request and turns it into a normalized [`SearchQuery`].
pub fn validate(request: &SearchRequest) -> Result<SearchQuery, ValidationError> {
    validate_query_text(&request.query)?;

    let page = request.page.unwrap_or(1);
    if page == 0 {
        return Err(ValidationError::InvalidPage);
    }

    let page_size = request.limit.unwrap_or(DEFAULT_PAGE_SIZE);
    if page_size == 0 || page_size > MAX_PAGE_SIZE {
        return Err(ValidationError::InvalidPageSize);
    }

    let filters: BTreeSet<String> = request
        .filters
        .iter()
        .flatten()
        .map(|f| f.trim().to_lowercase())
        .filter(|f| !f.is_empty())
        .collect();

    Ok(SearchQuery {
        text: normalize_query(&request.query),
        filters,
        page,
        page_size,
        sort_by: request.sort_by.unwrap_or_default(),
        sort_order: request.sort_order.unwrap_or_default(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::types::{SortBy, SortOrder};

    #[test]
    fn test_normalize() {
        assert_eq!(normalize_query("  ReAct  "), "react");
    }

    #[test]
    fn test_empty_and_blank_queries() {
        assert_eq!(validate_query_text(""), Err(ValidationError::EmptyQuery));
        assert_eq!(validate_query_text("   \t"), Err(ValidationError::EmptyQuery));
    }

    #[test]
    fn test_length_limits() {
        assert!(validate_query_text(&"a".repeat(MAX_QUERY_LENGTH)).is_ok());
        assert_eq!(
            validate_query_text(&"a".repeat(MAX_QUERY_LENGTH + 1)),
            Err(ValidationError::QueryTooLong)
        );
    }

    #[test]
    fn test_forbidden_characters() {
        for bad in ["<script>", "a>b", "{x", "y}"] {
            assert!(matches!(
                validate_query_text(bad),
                Err(ValidationError::ForbiddenCharacter(_))
            ));
        }
        assert!(validate_query_text("c++ & rust?").is_ok());
    }

    #[test]
    fn test_validate_defaults() {
        let query = validate(&SearchRequest::new("  Rust ")).unwrap();
        assert_eq!(query.text, "rust");
        assert_eq!(query.page, 1);
        assert_eq!(query.page_size, DEFAULT_PAGE_SIZE);
        assert!(query.filters.is_empty());
        assert_eq!(query.sort_by, SortBy::Relevance);
        assert_eq!(query.sort_order, SortOrder::Desc);
    }

    #[test]
    fn test_validate_paging_bounds() {
        let zero_page = SearchRequest::new("rust").with_page(0, 10);
        assert_eq!(validate(&zero_page), Err(ValidationError::InvalidPage));

        let zero_limit = SearchRequest::new("rust").with_page(1, 0);
        assert_eq!(validate(&zero_limit), Err(ValidationError::InvalidPageSize));

        let huge_limit = SearchRequest::new("rust").with_page(1, MAX_PAGE_SIZE + 1);
        assert_eq!(validate(&huge_limit), Err(ValidationError::InvalidPageSize));
    }

    #[test]
    fn test_validate_normalizes_filters() {
        let request = SearchRequest::new("rust").with_filters([" User", "user", "", "Channel"]);
        let query = validate(&request).unwrap();
        let filters: Vec<&str> = query.filters.iter().map(String::as_str).collect();
        assert_eq!(filters, vec!["channel", "user"]);
    }
}
