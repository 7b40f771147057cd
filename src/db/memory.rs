use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::{
    db::store::{ActivityStore, TipStore, UserStore},
    error::{AppError, AppResult},
    models::{
        ActivityRecord, Category, CategoryCounts, CategoryTotals, Counter, NewActivity, NewTip,
        NewUser, SortOrder, Tip, TipQuery, TipSort, TipUpdate, TipWithAuthor, User,
    },
};

/// Process-local store
///
/// Backs tests and `STORAGE_BACKEND=memory`. Every operation holds the lock for
/// its whole duration, so increments are serialized.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<RwLock<MemoryStoreInner>>,
}

#[derive(Default)]
struct MemoryStoreInner {
    users: BTreeMap<i64, User>,
    tips: BTreeMap<i64, Tip>,
    activities: Vec<ActivityRecord>,
    next_user_id: i64,
    next_tip_id: i64,
    next_activity_id: i64,
}

impl MemoryStoreInner {
    fn next_id(counter: &mut i64) -> i64 {
        *counter += 1;
        *counter
    }

    fn with_author(&self, tip: &Tip) -> TipWithAuthor {
        let author = self.users.get(&tip.author_id);
        TipWithAuthor {
            tip: tip.clone(),
            author_username: author.map(|u| u.username.clone()).unwrap_or_default(),
            author_full_name: author.and_then(|u| u.full_name.clone()),
        }
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn sort_key(tip: &Tip, sort: TipSort) -> (i64, i64) {
    let primary = match sort {
        TipSort::CreatedAt => tip.created_at.timestamp_micros(),
        TipSort::LikesCount => tip.likes_count,
        TipSort::ViewsCount => tip.views_count,
    };
    (primary, tip.id)
}

#[async_trait::async_trait]
impl TipStore for MemoryStore {
    async fn list_tips(&self, query: &TipQuery) -> AppResult<Vec<TipWithAuthor>> {
        let inner = self.inner.read().await;

        let mut tips: Vec<&Tip> = inner
            .tips
            .values()
            .filter(|tip| query.category.map_or(true, |c| tip.category == c))
            .filter(|tip| query.matches_search(tip))
            .collect();

        tips.sort_by_key(|tip| sort_key(tip, query.sort_by));
        if query.order == SortOrder::Desc {
            tips.reverse();
        }

        Ok(tips
            .into_iter()
            .skip(usize::try_from(query.skip).unwrap_or(0))
            .take(usize::try_from(query.limit).unwrap_or(0))
            .map(|tip| inner.with_author(tip))
            .collect())
    }

    async fn get_tip(&self, id: i64) -> AppResult<Option<TipWithAuthor>> {
        let inner = self.inner.read().await;
        Ok(inner.tips.get(&id).map(|tip| inner.with_author(tip)))
    }

    async fn insert_tip(&self, author_id: i64, new_tip: &NewTip) -> AppResult<Tip> {
        let mut inner = self.inner.write().await;

        if !inner.users.contains_key(&author_id) {
            return Err(AppError::NotFound(format!("User {} not found", author_id)));
        }

        let id = MemoryStoreInner::next_id(&mut inner.next_tip_id);
        let tip = Tip {
            id,
            title: new_tip.title.clone(),
            content: new_tip.content.clone(),
            category: new_tip.category,
            tags: new_tip.tags.clone(),
            author_id,
            likes_count: 0,
            shares_count: 0,
            views_count: 0,
            source_url: new_tip.source_url.clone(),
            difficulty_level: new_tip.difficulty_level,
            is_featured: false,
            created_at: Utc::now(),
            updated_at: None,
        };
        inner.tips.insert(id, tip.clone());

        Ok(tip)
    }

    async fn update_tip(&self, id: i64, update: &TipUpdate) -> AppResult<Option<Tip>> {
        let mut inner = self.inner.write().await;

        Ok(inner.tips.get_mut(&id).map(|tip| {
            update.apply_to(tip);
            tip.updated_at = Some(Utc::now());
            tip.clone()
        }))
    }

    async fn delete_tip(&self, id: i64) -> AppResult<bool> {
        let mut inner = self.inner.write().await;
        Ok(inner.tips.remove(&id).is_some())
    }

    async fn increment_counter(&self, id: i64, counter: Counter) -> AppResult<Option<Tip>> {
        let mut inner = self.inner.write().await;

        Ok(inner.tips.get_mut(&id).map(|tip| {
            counter.increment(tip);
            tip.clone()
        }))
    }

    async fn top_tips_by_engagement(
        &self,
        category: Option<Category>,
        limit: i64,
    ) -> AppResult<Vec<Tip>> {
        let inner = self.inner.read().await;

        let mut tips: Vec<Tip> = inner
            .tips
            .values()
            .filter(|tip| category.map_or(true, |c| tip.category == c))
            .cloned()
            .collect();

        // Stable sort: ties keep insertion order
        tips.sort_by(|a, b| b.engagement_score().cmp(&a.engagement_score()));
        tips.truncate(usize::try_from(limit).unwrap_or(0));

        Ok(tips)
    }

    async fn category_totals(&self, category: Category) -> AppResult<CategoryTotals> {
        let inner = self.inner.read().await;

        let tips: Vec<&Tip> = inner
            .tips
            .values()
            .filter(|tip| tip.category == category)
            .collect();

        let total_tips = tips.len() as i64;
        let total_views = tips.iter().map(|t| t.views_count).sum();
        let total_likes = tips.iter().map(|t| t.likes_count).sum();
        let avg_engagement = if tips.is_empty() {
            0.0
        } else {
            tips.iter().map(|t| t.engagement_score()).sum::<i64>() as f64 / total_tips as f64
        };

        Ok(CategoryTotals {
            total_tips,
            total_views,
            total_likes,
            avg_engagement,
        })
    }
}

#[async_trait::async_trait]
impl ActivityStore for MemoryStore {
    async fn insert_activity(
        &self,
        activity: &NewActivity,
        at: DateTime<Utc>,
    ) -> AppResult<ActivityRecord> {
        let mut inner = self.inner.write().await;

        if !inner.users.contains_key(&activity.user_id) {
            return Err(AppError::NotFound(format!(
                "User {} not found",
                activity.user_id
            )));
        }

        let record = ActivityRecord {
            id: MemoryStoreInner::next_id(&mut inner.next_activity_id),
            user_id: activity.user_id,
            kind: activity.kind,
            category: activity.category,
            content_id: activity.content_id.clone(),
            metadata: activity.metadata.clone(),
            session_id: activity.session_id.clone(),
            created_at: at,
        };
        inner.activities.push(record.clone());

        Ok(record)
    }

    async fn category_counts_since(
        &self,
        user_id: i64,
        since: DateTime<Utc>,
    ) -> AppResult<CategoryCounts> {
        let inner = self.inner.read().await;

        let mut counts = CategoryCounts::new();
        for record in inner
            .activities
            .iter()
            .filter(|r| r.user_id == user_id && r.created_at >= since)
        {
            if let Some(category) = record.category {
                *counts.entry(category).or_insert(0) += 1;
            }
        }

        Ok(counts)
    }
}

#[async_trait::async_trait]
impl UserStore for MemoryStore {
    async fn insert_user(&self, new_user: &NewUser) -> AppResult<User> {
        let mut inner = self.inner.write().await;

        let taken = inner
            .users
            .values()
            .any(|u| u.username == new_user.username || u.email == new_user.email);
        if taken {
            return Err(AppError::InvalidInput(
                "Username or email already registered".to_string(),
            ));
        }

        let user = User {
            id: MemoryStoreInner::next_id(&mut inner.next_user_id),
            username: new_user.username.clone(),
            email: new_user.email.clone(),
            full_name: new_user.full_name.clone(),
            interests: new_user.interests.clone(),
            wellness_goals: new_user.wellness_goals.clone(),
            experience_level: new_user.experience_level,
            created_at: Utc::now(),
        };
        inner.users.insert(user.id, user.clone());

        Ok(user)
    }

    async fn get_user(&self, id: i64) -> AppResult<Option<User>> {
        Ok(self.inner.read().await.users.get(&id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ActivityKind, Difficulty};

    async fn store_with_user() -> (MemoryStore, User) {
        let store = MemoryStore::new();
        let user = store
            .insert_user(&NewUser {
                username: "mira".to_string(),
                email: "mira@example.com".to_string(),
                full_name: Some("Mira Okafor".to_string()),
                interests: vec![],
                wellness_goals: vec![],
                experience_level: Difficulty::Beginner,
            })
            .await
            .unwrap();
        (store, user)
    }

    fn new_tip(title: &str, category: Category) -> NewTip {
        NewTip {
            title: title.to_string(),
            content: format!("{} body long enough", title),
            category,
            tags: vec![],
            source_url: None,
            difficulty_level: Difficulty::Beginner,
        }
    }

    #[tokio::test]
    async fn test_insert_tip_requires_existing_author() {
        let store = MemoryStore::new();
        let result = store.insert_tip(99, &new_tip("Orphan", Category::Food)).await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_list_filters_sorts_and_paginates() {
        let (store, user) = store_with_user().await;
        let a = store.insert_tip(user.id, &new_tip("Oats", Category::Food)).await.unwrap();
        let b = store.insert_tip(user.id, &new_tip("Lentils", Category::Food)).await.unwrap();
        store.insert_tip(user.id, &new_tip("Sun salute", Category::Yoga)).await.unwrap();

        store.increment_counter(b.id, Counter::Likes).await.unwrap();

        let query = TipQuery {
            category: Some(Category::Food),
            sort_by: TipSort::LikesCount,
            ..Default::default()
        };
        let tips = store.list_tips(&query).await.unwrap();
        assert_eq!(tips.len(), 2);
        assert_eq!(tips[0].tip.id, b.id);
        assert_eq!(tips[1].tip.id, a.id);
        assert_eq!(tips[0].author_username, "mira");

        let page = TipQuery {
            skip: 1,
            limit: 1,
            ..Default::default()
        };
        assert_eq!(store.list_tips(&page).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_search_is_case_insensitive() {
        let (store, user) = store_with_user().await;
        store.insert_tip(user.id, &new_tip("Green Smoothie", Category::Food)).await.unwrap();
        store.insert_tip(user.id, &new_tip("Plank", Category::Workout)).await.unwrap();

        let query = TipQuery {
            search: Some("smooth".to_string()),
            ..Default::default()
        };
        let tips = store.list_tips(&query).await.unwrap();
        assert_eq!(tips.len(), 1);
        assert_eq!(tips[0].tip.title, "Green Smoothie");
    }

    #[tokio::test]
    async fn test_top_tips_orders_by_likes_plus_views() {
        let (store, user) = store_with_user().await;
        let quiet = store.insert_tip(user.id, &new_tip("Quiet", Category::Yoga)).await.unwrap();
        let busy = store.insert_tip(user.id, &new_tip("Busy", Category::Yoga)).await.unwrap();
        store.insert_tip(user.id, &new_tip("Elsewhere", Category::Food)).await.unwrap();

        store.increment_counter(busy.id, Counter::Views).await.unwrap();
        store.increment_counter(busy.id, Counter::Likes).await.unwrap();
        store.increment_counter(quiet.id, Counter::Shares).await.unwrap();

        let tips = store
            .top_tips_by_engagement(Some(Category::Yoga), 5)
            .await
            .unwrap();
        assert_eq!(tips.iter().map(|t| t.id).collect::<Vec<_>>(), vec![busy.id, quiet.id]);

        let limited = store.top_tips_by_engagement(None, 1).await.unwrap();
        assert_eq!(limited.len(), 1);
    }

    #[tokio::test]
    async fn test_activity_requires_existing_user() {
        let store = MemoryStore::new();
        let result = store
            .insert_activity(&NewActivity::new(5, ActivityKind::ViewContent), Utc::now())
            .await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_duplicate_username_rejected() {
        let (store, _) = store_with_user().await;
        let result = store
            .insert_user(&NewUser {
                username: "mira".to_string(),
                email: "other@example.com".to_string(),
                full_name: None,
                interests: vec![],
                wellness_goals: vec![],
                experience_level: Difficulty::Beginner,
            })
            .await;
        assert!(matches!(result, Err(AppError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_category_totals() {
        let (store, user) = store_with_user().await;
        let a = store.insert_tip(user.id, &new_tip("One", Category::Health)).await.unwrap();
        store.insert_tip(user.id, &new_tip("Two", Category::Health)).await.unwrap();
        store.increment_counter(a.id, Counter::Views).await.unwrap();
        store.increment_counter(a.id, Counter::Views).await.unwrap();
        store.increment_counter(a.id, Counter::Likes).await.unwrap();

        let totals = store.category_totals(Category::Health).await.unwrap();
        assert_eq!(totals.total_tips, 2);
        assert_eq!(totals.total_views, 2);
        assert_eq!(totals.total_likes, 1);
        assert_eq!(totals.avg_engagement, 1.5);

        let empty = store.category_totals(Category::Yoga).await.unwrap();
        assert_eq!(empty, CategoryTotals::default());
    }
}
