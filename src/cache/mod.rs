//! Cache Module
//!
//! Provides the shared in-memory cache with TTL expiration and tag-based
//! invalidation.

mod entry;
mod key;
mod stats;
mod store;


// Re-export public types
pub use key::CacheKey;
pub use stats::CacheStats;
pub use store::CacheStore;

// == Public Constants ==
/// Default TTL for entries stored without one (5 minutes)
pub const DEFAULT_TTL_MS: u64 = 300_000;
