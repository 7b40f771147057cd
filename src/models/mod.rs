use serde::{Deserialize, Serialize};
use std::{fmt::Display, str::FromStr};

use crate::error::AppError;

pub mod activity;
pub mod recommendation;
pub mod tip;
pub mod user;

pub use activity::{
    ActivityKind, ActivityMetadata, ActivityRecord, CategoryCounts, MetadataValue, NewActivity,
};
pub use recommendation::{ItemType, RecommendationItem};
pub use tip::{Counter, NewTip, SortOrder, Tip, TipQuery, TipSort, TipUpdate, TipWithAuthor};
pub use user::{NewUser, User, UserProfile};

// ============================================================================
// Shared enumerations
// ============================================================================

/// Wellness content category
///
/// Declaration order is the canonical listing order (food, health, workout, yoga).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Food,
    Health,
    Workout,
    Yoga,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::Food,
        Category::Health,
        Category::Workout,
        Category::Yoga,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Food => "food",
            Category::Health => "health",
            Category::Workout => "workout",
            Category::Yoga => "yoga",
        }
    }
}

impl Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|category| category.as_str() == s)
            .ok_or_else(|| AppError::InvalidInput(format!("Unknown category: {}", s)))
    }
}

/// Experience / difficulty level shared by tips, users and recommendations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    #[default]
    Beginner,
    Intermediate,
    Advanced,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Beginner => "beginner",
            Difficulty::Intermediate => "intermediate",
            Difficulty::Advanced => "advanced",
        }
    }
}

impl Display for Difficulty {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Difficulty {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "beginner" => Ok(Difficulty::Beginner),
            "intermediate" => Ok(Difficulty::Intermediate),
            "advanced" => Ok(Difficulty::Advanced),
            other => Err(AppError::InvalidInput(format!(
                "Unknown difficulty level: {}",
                other
            ))),
        }
    }
}

// ============================================================================
// Analytics
// ============================================================================

/// Aggregate engagement figures for one category
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CategoryInsights {
    pub category: Category,
    pub total_tips: i64,
    pub total_views: i64,
    pub total_likes: i64,
    pub avg_engagement: f64,
    /// Placeholder, not derived from tip data yet
    pub top_tags: Vec<String>,
    /// Placeholder, not derived from tip data yet
    pub trending_score: f64,
}

/// Raw aggregates as returned by a store
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CategoryTotals {
    pub total_tips: i64,
    pub total_views: i64,
    pub total_likes: i64,
    pub avg_engagement: f64,
}

impl CategoryInsights {
    pub fn from_totals(category: Category, totals: CategoryTotals) -> Self {
        Self {
            category,
            total_tips: totals.total_tips,
            total_views: totals.total_views,
            total_likes: totals.total_likes,
            avg_engagement: totals.avg_engagement,
            top_tags: vec![
                "wellness".to_string(),
                "health".to_string(),
                "tips".to_string(),
            ],
            trending_score: 0.8,
        }
    }
}
