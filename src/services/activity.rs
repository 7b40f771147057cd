use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;

use crate::{
    db::Store,
    error::AppResult,
    models::{ActivityRecord, CategoryCounts, NewActivity},
};

/// Trailing window used to summarize behavior for recommendations
pub const PROFILE_WINDOW_DAYS: i64 = 30;

/// Append-only engagement log
#[derive(Clone)]
pub struct ActivityService {
    store: Arc<dyn Store>,
}

impl ActivityService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Appends one record. Fails with `NotFound` if the user does not exist.
    pub async fn record(&self, activity: NewActivity) -> AppResult<ActivityRecord> {
        let record = self.store.insert_activity(&activity, Utc::now()).await?;

        tracing::debug!(
            user_id = record.user_id,
            activity = %record.kind,
            category = ?record.category,
            "Activity recorded"
        );

        Ok(record)
    }

    /// Per-category counts over the last `window_days` days
    pub async fn summarize(&self, user_id: i64, window_days: i64) -> AppResult<CategoryCounts> {
        self.summarize_at(user_id, window_days, Utc::now()).await
    }

    /// Same as [`summarize`](Self::summarize) with an explicit "now".
    /// A record exactly `window_days` old is included.
    pub async fn summarize_at(
        &self,
        user_id: i64,
        window_days: i64,
        now: DateTime<Utc>,
    ) -> AppResult<CategoryCounts> {
        let since = now - Duration::days(window_days);
        self.store.category_counts_since(user_id, since).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{ActivityStore, MemoryStore, UserStore};
    use crate::models::{ActivityKind, Category, Difficulty, NewUser};

    async fn setup() -> (MemoryStore, ActivityService, i64) {
        let store = MemoryStore::new();
        let user = store
            .insert_user(&NewUser {
                username: "lee".to_string(),
                email: "lee@example.com".to_string(),
                full_name: None,
                interests: vec![],
                wellness_goals: vec![],
                experience_level: Difficulty::Beginner,
            })
            .await
            .unwrap();
        let service = ActivityService::new(Arc::new(store.clone()));
        (store, service, user.id)
    }

    #[tokio::test]
    async fn test_window_boundary_is_inclusive() {
        let (store, service, user_id) = setup().await;
        let now = Utc::now();
        let boundary = now - Duration::days(30);

        let view = |category| NewActivity::new(user_id, ActivityKind::ViewContent).category(Some(category));

        store.insert_activity(&view(Category::Yoga), boundary).await.unwrap();
        store
            .insert_activity(&view(Category::Yoga), boundary - Duration::seconds(1))
            .await
            .unwrap();
        store
            .insert_activity(&view(Category::Food), now - Duration::days(2))
            .await
            .unwrap();
        store
            .insert_activity(&view(Category::Food), now - Duration::days(45))
            .await
            .unwrap();

        let counts = service.summarize_at(user_id, 30, now).await.unwrap();
        assert_eq!(counts.get(&Category::Yoga), Some(&1));
        assert_eq!(counts.get(&Category::Food), Some(&1));
    }

    #[tokio::test]
    async fn test_empty_categories_are_absent() {
        let (_store, service, user_id) = setup().await;
        service
            .record(NewActivity::new(user_id, ActivityKind::LikeTip).category(Some(Category::Workout)))
            .await
            .unwrap();
        service
            .record(NewActivity::new(user_id, ActivityKind::ChatInteraction))
            .await
            .unwrap();

        let counts = service.summarize(user_id, PROFILE_WINDOW_DAYS).await.unwrap();
        assert_eq!(counts.len(), 1);
        assert_eq!(counts.get(&Category::Workout), Some(&1));
        assert!(!counts.contains_key(&Category::Health));
    }

    #[tokio::test]
    async fn test_counts_are_per_user() {
        let (store, service, user_id) = setup().await;
        let other = store
            .insert_user(&NewUser {
                username: "kai".to_string(),
                email: "kai@example.com".to_string(),
                full_name: None,
                interests: vec![],
                wellness_goals: vec![],
                experience_level: Difficulty::Beginner,
            })
            .await
            .unwrap();

        service
            .record(NewActivity::new(other.id, ActivityKind::ViewCategory).category(Some(Category::Food)))
            .await
            .unwrap();

        assert!(service.summarize(user_id, 30).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_record_keeps_metadata() {
        let (_store, service, user_id) = setup().await;
        let record = service
            .record(
                NewActivity::new(user_id, ActivityKind::ViewCategory)
                    .category(Some(Category::Yoga))
                    .metadata("recommendation_count", 2usize),
            )
            .await
            .unwrap();

        assert_eq!(record.user_id, user_id);
        assert_eq!(record.kind, ActivityKind::ViewCategory);
        assert_eq!(record.metadata.len(), 1);
    }
}
