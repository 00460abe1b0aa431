//! Search Module
//!
//! Query validation, relevance scoring, ranking and pagination, and the
//! orchestrator tying them to the cache.

pub mod history;
pub mod metadata;
pub mod orchestrator;
pub mod paginate;
pub mod scorer;
pub mod trending;
pub mod types;
pub mod validate;


pub use metadata::{MetaValue, Metadata, MetadataError};
pub use orchestrator::{SearchOptions, SearchOrchestrator, SearchStats};
pub use types::{
    SearchHistoryEntry, SearchRequest, SearchResponse, SearchResult, SortBy, SortOrder, Trend,
    TrendingTerm,
};
pub use validate::ValidationError;
