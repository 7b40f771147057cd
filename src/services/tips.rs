use std::sync::Arc;

use crate::{
    db::Store,
    error::{AppError, AppResult},
    models::{
        ActivityKind, Counter, NewActivity, NewTip, Tip, TipQuery, TipUpdate, TipWithAuthor,
    },
    services::activity::ActivityService,
};

/// Tip CRUD with author-only mutation and engagement tracking
#[derive(Clone)]
pub struct TipService {
    store: Arc<dyn Store>,
    activity: ActivityService,
}

fn tip_not_found(id: i64) -> AppError {
    AppError::NotFound(format!("Wellness tip {} not found", id))
}

impl TipService {
    pub fn new(store: Arc<dyn Store>, activity: ActivityService) -> Self {
        Self { store, activity }
    }

    pub async fn list(&self, query: TipQuery) -> AppResult<Vec<TipWithAuthor>> {
        let query = query.validated()?;
        self.store.list_tips(&query).await
    }

    /// Fetches a tip. A known viewer counts as one view.
    pub async fn get(&self, id: i64, viewer: Option<i64>) -> AppResult<TipWithAuthor> {
        let mut tip = self.store.get_tip(id).await?.ok_or_else(|| tip_not_found(id))?;

        if let Some(user_id) = viewer {
            self.activity
                .record(
                    NewActivity::new(user_id, ActivityKind::ViewContent)
                        .category(Some(tip.tip.category))
                        .content_id(id.to_string()),
                )
                .await?;

            if let Some(viewed) = self.store.increment_counter(id, Counter::Views).await? {
                tip.tip = viewed;
            }
        }

        Ok(tip)
    }

    pub async fn create(&self, author_id: i64, new_tip: NewTip) -> AppResult<Tip> {
        let new_tip = new_tip.validated()?;
        let tip = self.store.insert_tip(author_id, &new_tip).await?;

        self.activity
            .record(
                NewActivity::new(author_id, ActivityKind::CreateTip)
                    .category(Some(tip.category))
                    .content_id(tip.id.to_string()),
            )
            .await?;

        tracing::info!(tip_id = tip.id, author_id, category = %tip.category, "Tip created");

        Ok(tip)
    }

    /// Loads the tip and checks `actor_id` wrote it
    async fn owned_tip(&self, actor_id: i64, id: i64, action: &str) -> AppResult<Tip> {
        let tip = self.store.get_tip(id).await?.ok_or_else(|| tip_not_found(id))?.tip;

        if !tip.is_authored_by(actor_id) {
            tracing::warn!(tip_id = id, actor_id, author_id = tip.author_id, action, "Rejected tip mutation");
            return Err(AppError::Forbidden(format!(
                "Not authorized to {} this tip",
                action
            )));
        }

        Ok(tip)
    }

    pub async fn update(&self, actor_id: i64, id: i64, update: TipUpdate) -> AppResult<Tip> {
        let update = update.validated()?;
        self.owned_tip(actor_id, id, "update").await?;

        self.store
            .update_tip(id, &update)
            .await?
            .ok_or_else(|| tip_not_found(id))
    }

    pub async fn delete(&self, actor_id: i64, id: i64) -> AppResult<()> {
        self.owned_tip(actor_id, id, "delete").await?;

        if !self.store.delete_tip(id).await? {
            return Err(tip_not_found(id));
        }

        tracing::info!(tip_id = id, actor_id, "Tip deleted");
        Ok(())
    }

    pub async fn like(&self, user_id: i64, id: i64) -> AppResult<Tip> {
        self.engage(user_id, id, Counter::Likes, ActivityKind::LikeTip)
            .await
    }

    pub async fn share(&self, user_id: i64, id: i64) -> AppResult<Tip> {
        self.engage(user_id, id, Counter::Shares, ActivityKind::ShareTip)
            .await
    }

    async fn engage(
        &self,
        user_id: i64,
        id: i64,
        counter: Counter,
        kind: ActivityKind,
    ) -> AppResult<Tip> {
        // Fail on a missing user before touching the counter
        if self.store.get_user(user_id).await?.is_none() {
            return Err(AppError::NotFound(format!("User {} not found", user_id)));
        }

        let tip = self
            .store
            .increment_counter(id, counter)
            .await?
            .ok_or_else(|| tip_not_found(id))?;

        self.activity
            .record(
                NewActivity::new(user_id, kind)
                    .category(Some(tip.category))
                    .content_id(id.to_string()),
            )
            .await?;

        Ok(tip)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{MemoryStore, UserStore};
    use crate::models::{Category, Difficulty, NewUser};

    struct Fixture {
        tips: TipService,
        activity: ActivityService,
        author: i64,
        stranger: i64,
    }

    async fn fixture() -> Fixture {
        let store = MemoryStore::new();
        let mut ids = Vec::new();
        for name in ["author", "stranger"] {
            let user = store
                .insert_user(&NewUser {
                    username: name.to_string(),
                    email: format!("{}@example.com", name),
                    full_name: None,
                    interests: vec![],
                    wellness_goals: vec![],
                    experience_level: Difficulty::Beginner,
                })
                .await
                .unwrap();
            ids.push(user.id);
        }

        let store: Arc<dyn Store> = Arc::new(store);
        let activity = ActivityService::new(store.clone());
        Fixture {
            tips: TipService::new(store, activity.clone()),
            activity,
            author: ids[0],
            stranger: ids[1],
        }
    }

    fn new_tip() -> NewTip {
        NewTip {
            title: "Walk after meals".to_string(),
            content: "A ten minute walk after eating helps blood sugar.".to_string(),
            category: Category::Health,
            tags: vec!["walking".to_string()],
            source_url: None,
            difficulty_level: Difficulty::Beginner,
        }
    }

    #[tokio::test]
    async fn test_create_records_activity() {
        let f = fixture().await;
        let tip = f.tips.create(f.author, new_tip()).await.unwrap();

        assert_eq!(tip.likes_count, 0);
        let counts = f.activity.summarize(f.author, 30).await.unwrap();
        assert_eq!(counts.get(&Category::Health), Some(&1));
    }

    #[tokio::test]
    async fn test_stranger_cannot_update() {
        let f = fixture().await;
        let tip = f.tips.create(f.author, new_tip()).await.unwrap();

        let update = TipUpdate {
            title: Some("Hijacked".to_string()),
            content: Some("Completely different content".to_string()),
            ..Default::default()
        };
        let result = f.tips.update(f.stranger, tip.id, update).await;
        assert!(matches!(result, Err(AppError::Forbidden(_))));

        let stored = f.tips.get(tip.id, None).await.unwrap().tip;
        assert_eq!(stored, tip);
    }

    #[tokio::test]
    async fn test_stranger_cannot_delete() {
        let f = fixture().await;
        let tip = f.tips.create(f.author, new_tip()).await.unwrap();

        let result = f.tips.delete(f.stranger, tip.id).await;
        assert!(matches!(result, Err(AppError::Forbidden(_))));

        let stored = f.tips.get(tip.id, None).await.unwrap().tip;
        assert_eq!(stored, tip);
    }

    #[tokio::test]
    async fn test_author_can_update_and_delete() {
        let f = fixture().await;
        let tip = f.tips.create(f.author, new_tip()).await.unwrap();

        let updated = f
            .tips
            .update(
                f.author,
                tip.id,
                TipUpdate {
                    difficulty_level: Some(Difficulty::Intermediate),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.difficulty_level, Difficulty::Intermediate);
        assert_eq!(updated.title, tip.title);
        assert!(updated.updated_at.is_some());

        f.tips.delete(f.author, tip.id).await.unwrap();
        assert!(matches!(
            f.tips.get(tip.id, None).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_missing_tip_is_not_found() {
        let f = fixture().await;
        assert!(matches!(
            f.tips.update(f.author, 999, TipUpdate::default()).await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            f.tips.delete(f.author, 999).await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            f.tips.like(f.author, 999).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_viewing_counts_once_per_identified_view() {
        let f = fixture().await;
        let tip = f.tips.create(f.author, new_tip()).await.unwrap();

        let anonymous = f.tips.get(tip.id, None).await.unwrap();
        assert_eq!(anonymous.tip.views_count, 0);

        let viewed = f.tips.get(tip.id, Some(f.stranger)).await.unwrap();
        assert_eq!(viewed.tip.views_count, 1);
        assert_eq!(viewed.author_username, "author");
    }

    #[tokio::test]
    async fn test_concurrent_likes_are_not_lost() {
        let f = fixture().await;
        let tip = f.tips.create(f.author, new_tip()).await.unwrap();

        let handles: Vec<_> = (0..50)
            .map(|_| {
                let tips = f.tips.clone();
                let user = f.stranger;
                let id = tip.id;
                tokio::spawn(async move { tips.like(user, id).await })
            })
            .collect();

        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let stored = f.tips.get(tip.id, None).await.unwrap().tip;
        assert_eq!(stored.likes_count, 50);
    }

    #[tokio::test]
    async fn test_share_increments_shares_only() {
        let f = fixture().await;
        let tip = f.tips.create(f.author, new_tip()).await.unwrap();

        let shared = f.tips.share(f.stranger, tip.id).await.unwrap();
        assert_eq!(shared.shares_count, 1);
        assert_eq!(shared.likes_count, 0);
        assert_eq!(shared.views_count, 0);
    }
}
