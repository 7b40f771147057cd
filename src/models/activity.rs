use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, fmt::Display, str::FromStr};

use super::Category;
use crate::error::AppError;

/// Kind of interaction an activity record describes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
    ViewContent,
    CreateTip,
    LikeTip,
    ShareTip,
    ViewCategory,
    ChatInteraction,
}

impl ActivityKind {
    const ALL: [ActivityKind; 6] = [
        ActivityKind::ViewContent,
        ActivityKind::CreateTip,
        ActivityKind::LikeTip,
        ActivityKind::ShareTip,
        ActivityKind::ViewCategory,
        ActivityKind::ChatInteraction,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityKind::ViewContent => "view_content",
            ActivityKind::CreateTip => "create_tip",
            ActivityKind::LikeTip => "like_tip",
            ActivityKind::ShareTip => "share_tip",
            ActivityKind::ViewCategory => "view_category",
            ActivityKind::ChatInteraction => "chat_interaction",
        }
    }
}

impl Display for ActivityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActivityKind {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ActivityKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| AppError::InvalidInput(format!("Unknown activity type: {}", s)))
    }
}

/// A single metadata value
///
/// Only flat scalars and string lists are accepted; nested objects fail to
/// deserialize.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetadataValue {
    Bool(bool),
    Integer(i64),
    Float(f64),
    Text(String),
    List(Vec<String>),
}

impl From<bool> for MetadataValue {
    fn from(value: bool) -> Self {
        MetadataValue::Bool(value)
    }
}

impl From<i64> for MetadataValue {
    fn from(value: i64) -> Self {
        MetadataValue::Integer(value)
    }
}

impl From<usize> for MetadataValue {
    fn from(value: usize) -> Self {
        MetadataValue::Integer(i64::try_from(value).unwrap_or(i64::MAX))
    }
}

impl From<f64> for MetadataValue {
    fn from(value: f64) -> Self {
        MetadataValue::Float(value)
    }
}

impl From<&str> for MetadataValue {
    fn from(value: &str) -> Self {
        MetadataValue::Text(value.to_string())
    }
}

impl From<String> for MetadataValue {
    fn from(value: String) -> Self {
        MetadataValue::Text(value)
    }
}

/// Free-form activity context, keyed by name
pub type ActivityMetadata = BTreeMap<String, MetadataValue>;

/// Activity counts per category over some window. Absent means zero.
pub type CategoryCounts = BTreeMap<Category, i64>;

/// An activity about to be appended to the log
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct NewActivity {
    #[serde(skip)]
    pub user_id: i64,
    #[serde(rename = "activity_type")]
    pub kind: ActivityKind,
    #[serde(default)]
    pub category: Option<Category>,
    #[serde(default)]
    pub content_id: Option<String>,
    #[serde(default)]
    pub metadata: ActivityMetadata,
    #[serde(default)]
    pub session_id: Option<String>,
}

impl NewActivity {
    pub fn new(user_id: i64, kind: ActivityKind) -> Self {
        Self {
            user_id,
            kind,
            category: None,
            content_id: None,
            metadata: ActivityMetadata::new(),
            session_id: None,
        }
    }

    pub fn category(mut self, category: Option<Category>) -> Self {
        self.category = category;
        self
    }

    pub fn content_id(mut self, content_id: impl Into<String>) -> Self {
        self.content_id = Some(content_id.into());
        self
    }

    pub fn metadata(mut self, key: impl Into<String>, value: impl Into<MetadataValue>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

/// Immutable entry in the activity log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityRecord {
    pub id: i64,
    pub user_id: i64,
    #[serde(rename = "activity_type")]
    pub kind: ActivityKind,
    pub category: Option<Category>,
    pub content_id: Option<String>,
    pub metadata: ActivityMetadata,
    pub session_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_activity_kind_parses_wire_names() {
        assert_eq!(
            "view_category".parse::<ActivityKind>().unwrap(),
            ActivityKind::ViewCategory
        );
        assert!("click".parse::<ActivityKind>().is_err());
    }

    #[test]
    fn test_metadata_accepts_flat_values() {
        let json = r#"{
            "activity_type": "chat_interaction",
            "metadata": {"turns": 3, "ratio": 0.5, "topic": "sleep", "helpful": true, "tags": ["a", "b"]}
        }"#;
        let activity: NewActivity = serde_json::from_str(json).unwrap();

        assert_eq!(activity.metadata["turns"], MetadataValue::Integer(3));
        assert_eq!(activity.metadata["ratio"], MetadataValue::Float(0.5));
        assert_eq!(activity.metadata["topic"], MetadataValue::Text("sleep".to_string()));
        assert_eq!(activity.metadata["helpful"], MetadataValue::Bool(true));
        assert_eq!(
            activity.metadata["tags"],
            MetadataValue::List(vec!["a".to_string(), "b".to_string()])
        );
    }

    #[test]
    fn test_metadata_rejects_nested_objects() {
        let json = r#"{"activity_type": "view_content", "metadata": {"nested": {"a": 1}}}"#;
        assert!(serde_json::from_str::<NewActivity>(json).is_err());
    }

    #[test]
    fn test_builder_sets_recommendation_count() {
        let activity = NewActivity::new(7, ActivityKind::ViewCategory)
            .category(Some(Category::Yoga))
            .metadata("recommendation_count", 3usize);

        assert_eq!(activity.user_id, 7);
        assert_eq!(activity.category, Some(Category::Yoga));
        assert_eq!(
            activity.metadata.get("recommendation_count"),
            Some(&MetadataValue::Integer(3))
        );
    }
}
