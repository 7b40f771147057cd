use std::sync::Arc;

use crate::{
    cached,
    db::{Cache, CacheKey, Store},
    error::{AppError, AppResult},
    models::{Category, CategoryInsights},
};

/// Cache TTL for category insights (5 minutes)
const INSIGHTS_CACHE_TTL: u64 = 300;

/// Per-category aggregate figures, optionally cached in Redis
#[derive(Clone)]
pub struct InsightsService {
    store: Arc<dyn Store>,
    cache: Option<Cache>,
}

impl InsightsService {
    pub fn new(store: Arc<dyn Store>, cache: Option<Cache>) -> Self {
        Self { store, cache }
    }

    pub async fn category_insights(&self, category: Category) -> AppResult<CategoryInsights> {
        let Some(cache) = &self.cache else {
            return self.compute(category).await;
        };

        match self.cached_insights(cache, category).await {
            Err(AppError::Cache(e)) => {
                tracing::warn!(error = %e, %category, "Insights cache unavailable, reading store");
                self.compute(category).await
            }
            result => result,
        }
    }

    async fn cached_insights(&self, cache: &Cache, category: Category) -> AppResult<CategoryInsights> {
        cached!(
            cache,
            CacheKey::CategoryInsights(category),
            INSIGHTS_CACHE_TTL,
            self.compute(category)
        )
    }

    async fn compute(&self, category: Category) -> AppResult<CategoryInsights> {
        let totals = self.store.category_totals(category).await?;
        Ok(CategoryInsights::from_totals(category, totals))
    }
}
