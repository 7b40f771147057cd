use std::sync::Arc;

use crate::{
    db::Store,
    error::{AppError, AppResult},
    models::{NewUser, User, UserProfile},
    services::activity::{ActivityService, PROFILE_WINDOW_DAYS},
};

#[derive(Clone)]
pub struct UserService {
    store: Arc<dyn Store>,
    activity: ActivityService,
}

impl UserService {
    pub fn new(store: Arc<dyn Store>, activity: ActivityService) -> Self {
        Self { store, activity }
    }

    pub async fn create(&self, new_user: NewUser) -> AppResult<User> {
        let new_user = new_user.validated()?;
        let user = self.store.insert_user(&new_user).await?;

        tracing::info!(user_id = user.id, username = %user.username, "User registered");

        Ok(user)
    }

    pub async fn get(&self, id: i64) -> AppResult<User> {
        self.store
            .get_user(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", id)))
    }

    /// Stated preferences plus the trailing 30-day activity summary
    pub async fn profile(&self, id: i64) -> AppResult<UserProfile> {
        let user = self.get(id).await?;
        let patterns = self.activity.summarize(id, PROFILE_WINDOW_DAYS).await?;
        Ok(UserProfile::new(&user, patterns))
    }
}
