use std::sync::Arc;

use crate::{
    db::Store,
    error::AppResult,
    models::{Category, RecommendationItem, UserProfile},
    services::recommendations::RecommendationStrategy,
};

/// Ranks community tips by likes + views
///
/// The profile is not consulted; ordering among equal scores is whatever the
/// store returns and is not stable across calls.
pub struct EngagementStrategy {
    store: Arc<dyn Store>,
}

impl EngagementStrategy {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }
}

#[async_trait::async_trait]
impl RecommendationStrategy for EngagementStrategy {
    async fn select(
        &self,
        _profile: &UserProfile,
        category: Option<Category>,
        limit: usize,
    ) -> AppResult<Vec<RecommendationItem>> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let tips = self.store.top_tips_by_engagement(category, limit).await?;

        Ok(tips.iter().map(RecommendationItem::from_tip).collect())
    }

    fn name(&self) -> &'static str {
        "engagement"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{MemoryStore, TipStore, UserStore};
    use crate::models::{Counter, Difficulty, NewTip, NewUser};

    #[tokio::test]
    async fn test_select_maps_top_tips() {
        let store = MemoryStore::new();
        let author = store
            .insert_user(&NewUser {
                username: "sam".to_string(),
                email: "sam@example.com".to_string(),
                full_name: None,
                interests: vec![],
                wellness_goals: vec![],
                experience_level: Difficulty::Beginner,
            })
            .await
            .unwrap();

        let long_body = "x".repeat(250);
        let tip = store
            .insert_tip(
                author.id,
                &NewTip {
                    title: "Hydrate".to_string(),
                    content: long_body,
                    category: Category::Health,
                    tags: vec!["water".to_string()],
                    source_url: None,
                    difficulty_level: Difficulty::Beginner,
                },
            )
            .await
            .unwrap();
        for _ in 0..3 {
            store.increment_counter(tip.id, Counter::Views).await.unwrap();
        }

        let strategy = EngagementStrategy::new(Arc::new(store));
        let items = strategy
            .select(&UserProfile::default(), Some(Category::Health), 5)
            .await
            .unwrap();

        assert_eq!(items.len(), 1);
        assert_eq!(items[0].id.as_deref(), Some(format!("tip_{}", tip.id).as_str()));
        assert_eq!(items[0].description.chars().count(), 203);
        assert!((items[0].relevance_score - 0.03).abs() < 1e-9);

        let none = strategy
            .select(&UserProfile::default(), Some(Category::Yoga), 5)
            .await
            .unwrap();
        assert!(none.is_empty());
    }
}
