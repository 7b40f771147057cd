use serde::{Deserialize, Serialize};

use super::{Category, Difficulty, Tip};

/// Longest description taken from a tip body, in characters
pub const DESCRIPTION_CHARS: usize = 200;
const ELLIPSIS: &str = "...";

/// Kind of content a recommendation points at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemType {
    Tip,
    Channel,
    Article,
}

/// A single ranked suggestion. Never persisted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RecommendationItem {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub title: String,
    pub description: String,
    pub category: Category,
    #[serde(rename = "type")]
    pub item_type: ItemType,
    /// In `[0, 1]`
    pub relevance_score: f64,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub difficulty: Difficulty,
    pub source: String,
}

impl RecommendationItem {
    /// Maps a community tip to a recommendation scored by engagement
    pub fn from_tip(tip: &Tip) -> Self {
        Self {
            id: Some(format!("tip_{}", tip.id)),
            title: tip.title.clone(),
            description: truncate_description(&tip.content),
            category: tip.category,
            item_type: ItemType::Tip,
            relevance_score: engagement_relevance(tip.engagement_score()),
            tags: tip.tags.clone(),
            difficulty: tip.difficulty_level,
            source: "Community".to_string(),
        }
    }

    /// Forces the relevance score into `[0, 1]`
    pub fn clamped(mut self) -> Self {
        self.relevance_score = if self.relevance_score.is_nan() {
            0.0
        } else {
            self.relevance_score.clamp(0.0, 1.0)
        };
        self
    }
}

/// `min(0.9, engagement / 100)`
pub fn engagement_relevance(engagement: i64) -> f64 {
    (engagement as f64 / 100.0).min(0.9)
}

/// Keeps the first 200 characters of `body`, marking a cut with `...`
pub fn truncate_description(body: &str) -> String {
    match body.char_indices().nth(DESCRIPTION_CHARS) {
        Some((cut, _)) => format!("{}{}", &body[..cut], ELLIPSIS),
        None => body.to_string(),
    }
}
