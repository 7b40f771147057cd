use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{CategoryCounts, Difficulty};
use crate::error::{AppError, AppResult};

/// A registered platform user
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub full_name: Option<String>,
    /// e.g. "nutrition", "yoga"
    pub interests: Vec<String>,
    /// e.g. "weight_loss", "stress_relief"
    pub wellness_goals: Vec<String>,
    pub experience_level: Difficulty,
    pub created_at: DateTime<Utc>,
}

/// Payload for registering a user profile
#[derive(Debug, Clone, Deserialize)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub interests: Vec<String>,
    #[serde(default)]
    pub wellness_goals: Vec<String>,
    #[serde(default)]
    pub experience_level: Difficulty,
}

impl NewUser {
    pub fn validated(mut self) -> AppResult<Self> {
        self.username = self.username.trim().to_string();
        self.email = self.email.trim().to_lowercase();

        if self.username.is_empty() {
            return Err(AppError::InvalidInput("Username cannot be empty".to_string()));
        }
        if !self.email.contains('@') {
            return Err(AppError::InvalidInput(format!(
                "Invalid email address: {}",
                self.email
            )));
        }
        Ok(self)
    }
}

/// What the recommendation selector knows about a user
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct UserProfile {
    pub interests: Vec<String>,
    pub wellness_goals: Vec<String>,
    pub experience_level: Difficulty,
    /// Activity counts by category over the trailing window
    pub activity_patterns: CategoryCounts,
}

impl UserProfile {
    pub fn new(user: &User, activity_patterns: CategoryCounts) -> Self {
        Self {
            interests: user.interests.clone(),
            wellness_goals: user.wellness_goals.clone(),
            experience_level: user.experience_level,
            activity_patterns,
        }
    }
}
