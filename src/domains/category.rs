//! Category Module
//!
//! Cached access to conversation categories and their codes.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::cache::{CacheKey, CacheStore};
use crate::domains::read_through::{no_tags, ReadThrough};
use crate::error::UpstreamResult;

pub const CATEGORIES_TTL: Duration = Duration::from_secs(30 * 60);
pub const CATEGORY_TTL: Duration = Duration::from_secs(60 * 60);
pub const CATEGORY_CODES_TTL: Duration = Duration::from_secs(60 * 60);
pub const CATEGORY_STATS_TTL: Duration = Duration::from_secs(10 * 60);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryCode {
    pub id: String,
    pub code: String,
    pub description: String,
    /// Owning category id
    pub category: String,
    #[serde(default)]
    pub examples: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CategoryStats {
    pub total_categories: usize,
    pub total_codes: usize,
    pub most_used: Option<String>,
}

/// Partial update; `None` fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CategoryUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
}

/// Tag carried by a category and every code it owns.
pub fn category_tag(category_id: &str) -> String {
    CacheKey::new("category").arg(category_id).into()
}

// == Category Source ==
#[async_trait]
pub trait CategorySource: Send + Sync {
    async fn categories(&self) -> UpstreamResult<Vec<Category>>;
    async fn category(&self, id: &str) -> UpstreamResult<Option<Category>>;
    async fn category_codes(&self) -> UpstreamResult<Vec<CategoryCode>>;
    async fn category_code(&self, id: &str) -> UpstreamResult<Option<CategoryCode>>;
    async fn category_stats(&self) -> UpstreamResult<CategoryStats>;
    async fn create_category(&self, category: Category) -> UpstreamResult<Category>;
    async fn update_category(&self, id: &str, update: CategoryUpdate) -> UpstreamResult<Category>;
    async fn delete_category(&self, id: &str) -> UpstreamResult<bool>;
}

// == Cached Category Source ==
pub struct CachedCategorySource<S> {
    inner: S,
    read_through: ReadThrough,
}

impl<S: CategorySource> CachedCategorySource<S> {
    pub fn new(inner: S, cache: Arc<CacheStore>) -> Self {
        Self {
            inner,
            read_through: ReadThrough::new(cache, "categories"),
        }
    }

    /// Returns the wrapped source.
    pub fn inner(&self) -> &S {
        &self.inner
    }

    /// Drops every cached category entry.
    pub fn clear_cache(&self) -> usize {
        self.read_through.invalidate_all()
    }

    fn invalidate_lists(&self, id: Option<&str>) {
        let mut keys = vec![CacheKey::new("categories"), CacheKey::new("category_stats")];
        let mut tags = Vec::new();
        if let Some(id) = id {
            keys.push(CacheKey::new("category").arg(id));
            keys.push(CacheKey::new("category_codes"));
            tags.push(category_tag(id));
        }
        self.read_through.invalidate(keys, tags);
    }
}

#[async_trait]
impl<S: CategorySource> CategorySource for CachedCategorySource<S> {
    async fn categories(&self) -> UpstreamResult<Vec<Category>> {
        self.read_through
            .fetch(&CacheKey::new("categories"), CATEGORIES_TTL, no_tags, || {
                self.inner.categories()
            })
            .await
    }

    async fn category(&self, id: &str) -> UpstreamResult<Option<Category>> {
        let key = CacheKey::new("category").arg(id);
        self.read_through
            .fetch_optional(
                &key,
                CATEGORY_TTL,
                |category: &Category| vec![category_tag(&category.id)],
                || self.inner.category(id),
            )
            .await
    }

    async fn category_codes(&self) -> UpstreamResult<Vec<CategoryCode>> {
        self.read_through
            .fetch(
                &CacheKey::new("category_codes"),
                CATEGORY_CODES_TTL,
                |codes: &Vec<CategoryCode>| {
                    codes.iter().map(|code| category_tag(&code.category)).collect()
                },
                || self.inner.category_codes(),
            )
            .await
    }

    async fn category_code(&self, id: &str) -> UpstreamResult<Option<CategoryCode>> {
        let key = CacheKey::new("category_code").arg(id);
        self.read_through
            .fetch_optional(
                &key,
                CATEGORY_CODES_TTL,
                |code: &CategoryCode| vec![category_tag(&code.category)],
                || self.inner.category_code(id),
            )
            .await
    }

    async fn category_stats(&self) -> UpstreamResult<CategoryStats> {
        self.read_through
            .fetch(
                &CacheKey::new("category_stats"),
                CATEGORY_STATS_TTL,
                no_tags,
                || self.inner.category_stats(),
            )
            .await
    }

    async fn create_category(&self, category: Category) -> UpstreamResult<Category> {
        let created = self.inner.create_category(category).await?;
        self.invalidate_lists(None);
        Ok(created)
    }

    async fn update_category(&self, id: &str, update: CategoryUpdate) -> UpstreamResult<Category> {
        let updated = self.inner.update_category(id, update).await?;
        self.invalidate_lists(Some(id));
        Ok(updated)
    }

    async fn delete_category(&self, id: &str) -> UpstreamResult<bool> {
        let deleted = self.inner.delete_category(id).await?;
        if deleted {
            self.invalidate_lists(Some(id));
        }
        Ok(deleted)
    }
}
