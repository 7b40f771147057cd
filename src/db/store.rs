//! Storage abstraction
//!
//! The service layer only talks to these traits, so the Postgres store and
//! the in-memory store are interchangeable. Each method is a single atomic
//! operation against the backing store.

use chrono::{DateTime, Utc};

use crate::{
    error::AppResult,
    models::{
        ActivityRecord, Category, CategoryCounts, CategoryTotals, Counter, NewActivity, NewTip,
        NewUser, Tip, TipQuery, TipUpdate, TipWithAuthor, User,
    },
};

#[async_trait::async_trait]
pub trait TipStore: Send + Sync {
    /// Filtered, sorted, paginated listing
    async fn list_tips(&self, query: &TipQuery) -> AppResult<Vec<TipWithAuthor>>;

    async fn get_tip(&self, id: i64) -> AppResult<Option<TipWithAuthor>>;

    async fn insert_tip(&self, author_id: i64, tip: &NewTip) -> AppResult<Tip>;

    /// Returns `None` when the tip does not exist
    async fn update_tip(&self, id: i64, update: &TipUpdate) -> AppResult<Option<Tip>>;

    /// Returns whether a row was removed
    async fn delete_tip(&self, id: i64) -> AppResult<bool>;

    /// Adds exactly one to `counter`, atomically with respect to other increments.
    /// Returns `None` when the tip does not exist.
    async fn increment_counter(&self, id: i64, counter: Counter) -> AppResult<Option<Tip>>;

    /// Tips ordered by `likes_count + views_count` descending. Ties come back in
    /// whatever order the store yields them.
    async fn top_tips_by_engagement(
        &self,
        category: Option<Category>,
        limit: i64,
    ) -> AppResult<Vec<Tip>>;

    async fn category_totals(&self, category: Category) -> AppResult<CategoryTotals>;
}

#[async_trait::async_trait]
pub trait ActivityStore: Send + Sync {
    /// Appends one record stamped with `at`
    async fn insert_activity(
        &self,
        activity: &NewActivity,
        at: DateTime<Utc>,
    ) -> AppResult<ActivityRecord>;

    /// Counts a user's categorized records with `created_at >= since`
    async fn category_counts_since(
        &self,
        user_id: i64,
        since: DateTime<Utc>,
    ) -> AppResult<CategoryCounts>;
}

#[async_trait::async_trait]
pub trait UserStore: Send + Sync {
    /// Fails with `InvalidInput` when username or email is taken
    async fn insert_user(&self, user: &NewUser) -> AppResult<User>;

    async fn get_user(&self, id: i64) -> AppResult<Option<User>>;
}

/// Everything the application needs from a backing store
pub trait Store: TipStore + ActivityStore + UserStore {}

impl<T: TipStore + ActivityStore + UserStore> Store for T {}
