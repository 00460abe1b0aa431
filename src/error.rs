//! Error types for the cache-and-rank core
//!
//! Provides unified error handling using thiserror.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::models::ErrorResponse;

// == Upstream Error ==
/// Failure reported by a backing data accessor.
///
/// Decorators pass these through unchanged and never cache them.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UpstreamError {
    /// The backing source could not be reached or answered with a failure
    #[error("upstream unavailable: {0}")]
    Unavailable(String),

    /// The addressed entity does not exist
    #[error("not found: {0}")]
    NotFound(String),

    /// The backing source refused the operation
    #[error("rejected: {0}")]
    Rejected(String),
}

/// Convenience Result type for backing accessors and decorators.
pub type UpstreamResult<T> = std::result::Result<T, UpstreamError>;

// == Search Error ==
/// Domain-level search failure surfaced to callers.
///
/// Invalid queries are not errors; they resolve to an empty response.
#[derive(Error, Debug)]
pub enum SearchError {
    /// The candidate fetch failed; `message` is safe to show to users
    #[error("{message}")]
    Upstream {
        message: &'static str,
        #[source]
        source: UpstreamError,
    },

    /// The request was cancelled or ran past its deadline
    #[error("search was cancelled before completing")]
    Cancelled,
}

/// Stable user-facing message for a failed search.
pub const SEARCH_FAILED_MESSAGE: &str = "Search failed. Please try again later.";

impl SearchError {
    /// Wraps an upstream failure with the stable search message.
    pub fn upstream(source: UpstreamError) -> Self {
        SearchError::Upstream {
            message: SEARCH_FAILED_MESSAGE,
            source,
        }
    }
}

// == API Error ==
/// Errors returned by HTTP handlers.
#[derive(Error, Debug)]
pub enum ApiError {
    /// Malformed request parameters
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Search failure
    #[error(transparent)]
    Search(#[from] SearchError),
}

// == IntoResponse Implementation ==
impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ApiError::InvalidRequest(_) => (StatusCode::BAD_REQUEST, self.to_string()),
            ApiError::Search(SearchError::Upstream { message, .. }) => {
                (StatusCode::BAD_GATEWAY, message.to_string())
            }
            ApiError::Search(SearchError::Cancelled) => {
                (StatusCode::GATEWAY_TIMEOUT, self.to_string())
            }
        };

        (status, Json(ErrorResponse::new(message))).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for HTTP handlers.
pub type Result<T> = std::result::Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn body_json(error: ApiError) -> (StatusCode, serde_json::Value) {
        let response = error.into_response();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_upstream_search_error_is_sanitized() {
        let error = ApiError::from(SearchError::upstream(UpstreamError::Unavailable(
            "db password rejected at 10.0.0.4".to_string(),
        )));

        let (status, json) = body_json(error).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(json["error"], SEARCH_FAILED_MESSAGE);
    }

    #[tokio::test]
    async fn test_cancelled_maps_to_timeout() {
        let (status, json) = body_json(SearchError::Cancelled.into()).await;
        assert_eq!(status, StatusCode::GATEWAY_TIMEOUT);
        assert!(json["error"].as_str().unwrap().contains("cancelled"));
    }

    #[tokio::test]
    async fn test_error_status_codes() {
        let test_cases = vec![
            (ApiError::InvalidRequest("bad".to_string()), StatusCode::BAD_REQUEST),
            (
                ApiError::Search(SearchError::upstream(UpstreamError::NotFound("x".to_string()))),
                StatusCode::BAD_GATEWAY,
            ),
            (ApiError::Search(SearchError::Cancelled), StatusCode::GATEWAY_TIMEOUT),
        ];

        for (error, expected_status) in test_cases {
            let (status, json) = body_json(error).await;
            assert_eq!(status, expected_status);
            assert!(json.get("error").is_some());
        }
    }

    #[test]
    fn test_search_error_keeps_source() {
        use std::error::Error as _;

        let error = SearchError::upstream(UpstreamError::Unavailable("timeout".to_string()));
        assert_eq!(error.to_string(), SEARCH_FAILED_MESSAGE);
        assert!(error.source().unwrap().to_string().contains("timeout"));
    }
}
