use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Category, Difficulty};
use crate::error::{AppError, AppResult};

/// Shortest accepted tip body, after trimming
pub const MIN_CONTENT_CHARS: usize = 10;
/// Largest page size for tip listings
pub const MAX_PAGE_SIZE: i64 = 100;

/// A single piece of user-authored wellness content
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Tip {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub category: Category,
    pub tags: Vec<String>,
    pub author_id: i64,
    pub likes_count: i64,
    pub shares_count: i64,
    pub views_count: i64,
    pub source_url: Option<String>,
    pub difficulty_level: Difficulty,
    pub is_featured: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Tip {
    /// Ranking proxy: likes plus views
    pub fn engagement_score(&self) -> i64 {
        self.likes_count + self.views_count
    }

    pub fn is_authored_by(&self, user_id: i64) -> bool {
        self.author_id == user_id
    }
}

/// Tip joined with its author's public details
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TipWithAuthor {
    #[serde(flatten)]
    pub tip: Tip,
    pub author_username: String,
    pub author_full_name: Option<String>,
}

/// Payload for creating a tip
#[derive(Debug, Clone, Deserialize)]
pub struct NewTip {
    pub title: String,
    pub content: String,
    pub category: Category,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub source_url: Option<String>,
    #[serde(default)]
    pub difficulty_level: Difficulty,
}

impl NewTip {
    /// Trims title and content and rejects bodies that are too short
    pub fn validated(mut self) -> AppResult<Self> {
        self.title = self.title.trim().to_string();
        self.content = self.content.trim().to_string();

        if self.title.is_empty() {
            return Err(AppError::InvalidInput("Title cannot be empty".to_string()));
        }
        validate_content(&self.content)?;

        Ok(self)
    }
}

/// Partial update of a tip. Category is fixed at creation.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TipUpdate {
    pub title: Option<String>,
    pub content: Option<String>,
    pub tags: Option<Vec<String>>,
    pub source_url: Option<String>,
    pub difficulty_level: Option<Difficulty>,
}

impl TipUpdate {
    pub fn validated(mut self) -> AppResult<Self> {
        if let Some(title) = self.title.as_mut() {
            *title = title.trim().to_string();
            if title.is_empty() {
                return Err(AppError::InvalidInput("Title cannot be empty".to_string()));
            }
        }
        if let Some(content) = self.content.as_mut() {
            *content = content.trim().to_string();
            validate_content(content)?;
        }
        Ok(self)
    }

    /// Applies the provided fields to `tip`, leaving the rest untouched
    pub fn apply_to(&self, tip: &mut Tip) {
        if let Some(title) = &self.title {
            tip.title = title.clone();
        }
        if let Some(content) = &self.content {
            tip.content = content.clone();
        }
        if let Some(tags) = &self.tags {
            tip.tags = tags.clone();
        }
        if let Some(source_url) = &self.source_url {
            tip.source_url = Some(source_url.clone());
        }
        if let Some(difficulty) = self.difficulty_level {
            tip.difficulty_level = difficulty;
        }
    }
}

fn validate_content(content: &str) -> AppResult<()> {
    if content.chars().count() < MIN_CONTENT_CHARS {
        return Err(AppError::InvalidInput(format!(
            "Content must be at least {} characters long",
            MIN_CONTENT_CHARS
        )));
    }
    Ok(())
}

/// Engagement counters on a tip
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Counter {
    Likes,
    Shares,
    Views,
}

impl Counter {
    pub fn column(&self) -> &'static str {
        match self {
            Counter::Likes => "likes_count",
            Counter::Shares => "shares_count",
            Counter::Views => "views_count",
        }
    }

    /// Bumps the matching field by exactly one
    pub fn increment(&self, tip: &mut Tip) {
        match self {
            Counter::Likes => tip.likes_count += 1,
            Counter::Shares => tip.shares_count += 1,
            Counter::Views => tip.views_count += 1,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TipSort {
    #[default]
    CreatedAt,
    LikesCount,
    ViewsCount,
}

impl TipSort {
    pub fn column(&self) -> &'static str {
        match self {
            TipSort::CreatedAt => "created_at",
            TipSort::LikesCount => "likes_count",
            TipSort::ViewsCount => "views_count",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    pub fn keyword(&self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

/// Filtering, sorting and pagination for tip listings
#[derive(Debug, Clone, Deserialize)]
pub struct TipQuery {
    #[serde(default)]
    pub skip: i64,
    #[serde(default = "default_limit")]
    pub limit: i64,
    pub category: Option<Category>,
    pub search: Option<String>,
    #[serde(default)]
    pub sort_by: TipSort,
    #[serde(default)]
    pub order: SortOrder,
}

fn default_limit() -> i64 {
    20
}

impl Default for TipQuery {
    fn default() -> Self {
        Self {
            skip: 0,
            limit: default_limit(),
            category: None,
            search: None,
            sort_by: TipSort::default(),
            order: SortOrder::default(),
        }
    }
}

impl TipQuery {
    pub fn validated(mut self) -> AppResult<Self> {
        if self.skip < 0 {
            return Err(AppError::InvalidInput("skip must be >= 0".to_string()));
        }
        if !(1..=MAX_PAGE_SIZE).contains(&self.limit) {
            return Err(AppError::InvalidInput(format!(
                "limit must be between 1 and {}",
                MAX_PAGE_SIZE
            )));
        }
        self.search = self
            .search
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());
        Ok(self)
    }

    /// Case-insensitive substring match on title or content
    pub fn matches_search(&self, tip: &Tip) -> bool {
        match &self.search {
            Some(term) => {
                let term = term.to_lowercase();
                tip.title.to_lowercase().contains(&term)
                    || tip.content.to_lowercase().contains(&term)
            }
            None => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_tip(title: &str, content: &str) -> NewTip {
        NewTip {
            title: title.to_string(),
            content: content.to_string(),
            category: Category::Yoga,
            tags: vec![],
            source_url: None,
            difficulty_level: Difficulty::Beginner,
        }
    }

    #[test]
    fn test_new_tip_trims_content() {
        let tip = new_tip(" Breathe ", "   Slow exhale for calm   ")
            .validated()
            .unwrap();
        assert_eq!(tip.title, "Breathe");
        assert_eq!(tip.content, "Slow exhale for calm");
    }

    #[test]
    fn test_new_tip_rejects_short_content() {
        let result = new_tip("Breathe", "  too short  ").validated();
        assert!(matches!(result, Err(AppError::InvalidInput(_))));
    }

    #[test]
    fn test_new_tip_rejects_blank_title() {
        let result = new_tip("   ", "Long enough content here").validated();
        assert!(matches!(result, Err(AppError::InvalidInput(_))));
    }

    #[test]
    fn test_new_tip_deserialization_rejects_unknown_category() {
        let json = r#"{"title": "t", "content": "long enough body", "category": "pilates"}"#;
        assert!(serde_json::from_str::<NewTip>(json).is_err());
    }

    #[test]
    fn test_query_limit_bounds() {
        let query = TipQuery {
            limit: 101,
            ..Default::default()
        };
        assert!(query.validated().is_err());

        let query = TipQuery {
            limit: 0,
            ..Default::default()
        };
        assert!(query.validated().is_err());
    }

    #[test]
    fn test_query_deserializes_sort_options() {
        let query: TipQuery =
            serde_json::from_str(r#"{"sort_by": "likes_count", "order": "asc"}"#).unwrap();
        assert_eq!(query.sort_by, TipSort::LikesCount);
        assert_eq!(query.order, SortOrder::Asc);
        assert_eq!(query.limit, 20);
    }

    #[test]
    fn test_update_applies_only_present_fields() {
        let mut tip = Tip {
            id: 1,
            title: "Old".to_string(),
            content: "Old content body".to_string(),
            category: Category::Food,
            tags: vec!["a".to_string()],
            author_id: 1,
            likes_count: 3,
            shares_count: 0,
            views_count: 5,
            source_url: None,
            difficulty_level: Difficulty::Beginner,
            is_featured: false,
            created_at: Utc::now(),
            updated_at: None,
        };

        let update = TipUpdate {
            title: Some("New".to_string()),
            ..Default::default()
        };
        update.apply_to(&mut tip);

        assert_eq!(tip.title, "New");
        assert_eq!(tip.content, "Old content body");
        assert_eq!(tip.tags, vec!["a".to_string()]);
        assert_eq!(tip.engagement_score(), 8);
    }
}
