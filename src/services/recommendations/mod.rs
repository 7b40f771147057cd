use std::sync::Arc;

use crate::{
    config::RecommenderConfig,
    db::Store,
    error::AppResult,
    models::{Category, RecommendationItem, UserProfile},
    services::providers::{self, CompletionProvider},
};

pub mod ai;
pub mod engagement;
pub mod fallback;

pub use ai::AiStrategy;
pub use engagement::EngagementStrategy;
pub use fallback::StaticStrategy;

/// One way of producing ranked recommendations
#[async_trait::async_trait]
pub trait RecommendationStrategy: Send + Sync {
    /// Returns at most `limit` items, best first
    async fn select(
        &self,
        profile: &UserProfile,
        category: Option<Category>,
        limit: usize,
    ) -> AppResult<Vec<RecommendationItem>>;

    /// Strategy name for logging
    fn name(&self) -> &'static str;
}

/// Chooses between the AI, engagement and static strategies
///
/// The primary strategy is fixed at construction: AI when a credential is
/// configured, engagement ranking otherwise. Whenever the primary fails or
/// comes back empty the static table is served instead, so a recommendation
/// request never fails. An AI failure does not fall back to engagement
/// ranking.
pub struct Recommender {
    primary: Arc<dyn RecommendationStrategy>,
    fallback: StaticStrategy,
}

impl Recommender {
    /// Wires the OpenAI provider when `config` carries a key
    pub fn new(config: RecommenderConfig, store: Arc<dyn Store>) -> AppResult<Self> {
        let provider = providers::from_config(&config)?;
        Ok(Self::with_provider(config, store, provider))
    }

    /// Same selection rules with an injected completion provider
    pub fn with_provider(
        config: RecommenderConfig,
        store: Arc<dyn Store>,
        provider: Option<Arc<dyn CompletionProvider>>,
    ) -> Self {
        let primary: Arc<dyn RecommendationStrategy> = match provider {
            Some(provider) if config.ai_enabled() => Arc::new(AiStrategy::new(provider, config)),
            _ => Arc::new(EngagementStrategy::new(store)),
        };

        tracing::info!(strategy = primary.name(), "Recommendation strategy selected");

        Self::from_strategy(primary)
    }

    fn from_strategy(primary: Arc<dyn RecommendationStrategy>) -> Self {
        Self {
            primary,
            fallback: StaticStrategy,
        }
    }

    pub fn strategy_name(&self) -> &'static str {
        self.primary.name()
    }

    /// Produces at most `limit` items. Never fails.
    pub async fn recommend(
        &self,
        profile: &UserProfile,
        category: Option<Category>,
        limit: usize,
    ) -> Vec<RecommendationItem> {
        match self.primary.select(profile, category, limit).await {
            Ok(mut items) if !items.is_empty() => {
                items.truncate(limit);
                return items;
            }
            Ok(_) => tracing::info!(
                strategy = self.primary.name(),
                category = ?category,
                "No recommendations produced, serving static content"
            ),
            Err(e) => tracing::warn!(
                strategy = self.primary.name(),
                error = %e,
                "Recommendation strategy failed, serving static content"
            ),
        }

        match self.fallback.select(profile, category, limit).await {
            Ok(items) => items,
            Err(e) => {
                tracing::error!(error = %e, "Static recommendations unavailable");
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{MemoryStore, TipStore, UserStore};
    use crate::error::AppError;
    use crate::models::{Difficulty, NewTip, NewUser};
    use crate::services::providers::MockCompletionProvider;

    fn ai_config() -> RecommenderConfig {
        RecommenderConfig {
            api_key: Some("sk-test".to_string()),
            ..Default::default()
        }
    }

    fn failing_provider() -> Arc<dyn CompletionProvider> {
        let mut provider = MockCompletionProvider::new();
        provider
            .expect_complete()
            .returning(|_| Err(AppError::ExternalApi("connection reset".to_string())));
        provider.expect_name().return_const("mock");
        Arc::new(provider)
    }

    fn replying_provider(reply: &'static str) -> Arc<dyn CompletionProvider> {
        let mut provider = MockCompletionProvider::new();
        provider
            .expect_complete()
            .returning(move |_| Ok(reply.to_string()));
        provider.expect_name().return_const("mock");
        Arc::new(provider)
    }

    async fn store_with_yoga_tip() -> MemoryStore {
        let store = MemoryStore::new();
        let author = store
            .insert_user(&NewUser {
                username: "ana".to_string(),
                email: "ana@example.com".to_string(),
                full_name: None,
                interests: vec![],
                wellness_goals: vec![],
                experience_level: Difficulty::Beginner,
            })
            .await
            .unwrap();
        store
            .insert_tip(
                author.id,
                &NewTip {
                    title: "Child's pose".to_string(),
                    content: "Rest in child's pose for five slow breaths.".to_string(),
                    category: Category::Yoga,
                    tags: vec![],
                    source_url: None,
                    difficulty_level: Difficulty::Beginner,
                },
            )
            .await
            .unwrap();
        store
    }

    #[tokio::test]
    async fn test_ai_failure_serves_static_table() {
        let store = Arc::new(store_with_yoga_tip().await);
        let recommender = Recommender::with_provider(ai_config(), store, Some(failing_provider()));

        for category in [None, Some(Category::Food), Some(Category::Yoga)] {
            let items = recommender
                .recommend(&UserProfile::default(), category, 6)
                .await;
            assert_eq!(items, StaticStrategy.items(category, 6));
        }
    }

    #[tokio::test]
    async fn test_malformed_ai_output_serves_static_table() {
        let recommender = Recommender::with_provider(
            ai_config(),
            Arc::new(MemoryStore::new()),
            Some(replying_provider("not json at all")),
        );

        let items = recommender
            .recommend(&UserProfile::default(), Some(Category::Workout), 3)
            .await;
        assert_eq!(items, StaticStrategy.items(Some(Category::Workout), 3));
    }

    #[tokio::test]
    async fn test_ai_failure_skips_engagement_ranking() {
        let store = Arc::new(store_with_yoga_tip().await);
        let recommender = Recommender::with_provider(ai_config(), store, Some(failing_provider()));

        let items = recommender
            .recommend(&UserProfile::default(), Some(Category::Yoga), 1)
            .await;
        assert_eq!(items[0].title, "Box Breathing Technique");
    }

    #[tokio::test]
    async fn test_ai_success_is_returned() {
        let reply = r#"{"recommendations": [
            {"title": "A", "description": "a", "category": "health", "type": "tip",
             "relevance_score": 0.5, "tags": [], "difficulty": "beginner", "source": "s"},
            {"title": "B", "description": "b", "category": "health", "type": "tip",
             "relevance_score": 0.4, "tags": [], "difficulty": "beginner", "source": "s"},
            {"title": "C", "description": "c", "category": "health", "type": "tip",
             "relevance_score": 0.3, "tags": [], "difficulty": "beginner", "source": "s"}
        ]}"#;
        let recommender = Recommender::with_provider(
            ai_config(),
            Arc::new(MemoryStore::new()),
            Some(replying_provider(reply)),
        );
        assert_eq!(recommender.strategy_name(), "ai");

        let items = recommender
            .recommend(&UserProfile::default(), Some(Category::Health), 2)
            .await;
        assert_eq!(
            items.iter().map(|i| i.title.as_str()).collect::<Vec<_>>(),
            vec!["A", "B"]
        );
    }

    #[tokio::test]
    async fn test_without_credential_engagement_is_used() {
        let store = Arc::new(store_with_yoga_tip().await);
        let recommender = Recommender::with_provider(
            RecommenderConfig::default(),
            store,
            Some(failing_provider()),
        );
        assert_eq!(recommender.strategy_name(), "engagement");

        let items = recommender
            .recommend(&UserProfile::default(), Some(Category::Yoga), 1)
            .await;
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].category, Category::Yoga);
        assert_eq!(items[0].title, "Child's pose");
        assert_eq!(items[0].source, "Community");
    }

    #[tokio::test]
    async fn test_empty_store_serves_static_yoga_item() {
        let recommender = Recommender::new(
            RecommenderConfig::default(),
            Arc::new(MemoryStore::new()),
        )
        .unwrap();

        let items = recommender
            .recommend(&UserProfile::default(), Some(Category::Yoga), 1)
            .await;
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].category, Category::Yoga);
        assert_eq!(items[0].title, "Box Breathing Technique");
    }

    #[tokio::test]
    async fn test_never_exceeds_limit() {
        let recommender = Recommender::new(
            RecommenderConfig::default(),
            Arc::new(MemoryStore::new()),
        )
        .unwrap();

        for limit in 1..=6 {
            let items = recommender
                .recommend(&UserProfile::default(), None, limit)
                .await;
            assert!(items.len() <= limit);
        }
    }
}
