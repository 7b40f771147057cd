use serde::Deserialize;
use std::sync::Arc;

use crate::{
    config::RecommenderConfig,
    error::{AppError, AppResult},
    models::{Category, RecommendationItem, UserProfile},
    services::{
        providers::{ChatMessage, ChatRequest, CompletionProvider},
        recommendations::RecommendationStrategy,
    },
};

const SYSTEM_PROMPT: &str = "You are an expert wellness content curator. Generate personalized \
wellness recommendations based on user behavior and preferences. Respond only with valid JSON.";

#[derive(Debug, Deserialize)]
struct AiRecommendations {
    recommendations: Vec<RecommendationItem>,
}

/// Delegates ranking to a chat-completion model
pub struct AiStrategy {
    provider: Arc<dyn CompletionProvider>,
    config: RecommenderConfig,
}

impl AiStrategy {
    pub fn new(provider: Arc<dyn CompletionProvider>, config: RecommenderConfig) -> Self {
        Self { provider, config }
    }

    fn chat_request(
        &self,
        profile: &UserProfile,
        category: Option<Category>,
        limit: usize,
    ) -> ChatRequest {
        ChatRequest {
            model: self.config.model.clone(),
            messages: vec![
                ChatMessage::system(SYSTEM_PROMPT),
                ChatMessage::user(build_prompt(profile, category, limit)),
            ],
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
            json_response: true,
        }
    }
}

/// Renders the user turn of the recommendation request
pub fn build_prompt(profile: &UserProfile, category: Option<Category>, limit: usize) -> String {
    let interests = profile.interests.join(", ");
    let goals = profile.wellness_goals.join(", ");
    let available = Category::ALL
        .iter()
        .map(Category::as_str)
        .collect::<Vec<_>>()
        .join(", ");
    let category_filter = category
        .map(|c| format!("Focus specifically on {} category.\n", c))
        .unwrap_or_default();

    format!(
        r#"Generate {limit} personalized wellness content recommendations for a user with:
- Interests: {interests}
- Wellness goals: {goals}
- Experience level: {experience}

{category_filter}
Categories available: {available}

Return JSON format:
{{
    "recommendations": [
        {{
            "title": "Content title",
            "description": "Brief description focusing on practical benefits",
            "category": "food|health|workout|yoga",
            "type": "tip|channel|article",
            "relevance_score": 0.95,
            "tags": ["tag1", "tag2"],
            "difficulty": "beginner|intermediate|advanced",
            "source": "Trusted source name"
        }}
    ]
}}

Focus on:
- Beginner-friendly content for new users
- Evidence-based wellness practices
- Practical, actionable advice
- Positive, supportive tone
"#,
        experience = profile.experience_level,
    )
}

/// Parses the model's JSON object into at most `limit` items
pub fn parse_recommendations(content: &str, limit: usize) -> AppResult<Vec<RecommendationItem>> {
    let parsed: AiRecommendations = serde_json::from_str(content)
        .map_err(|e| AppError::ExternalApi(format!("Unusable AI recommendation payload: {}", e)))?;

    Ok(parsed
        .recommendations
        .into_iter()
        .map(RecommendationItem::clamped)
        .take(limit)
        .collect())
}

#[async_trait::async_trait]
impl RecommendationStrategy for AiStrategy {
    async fn select(
        &self,
        profile: &UserProfile,
        category: Option<Category>,
        limit: usize,
    ) -> AppResult<Vec<RecommendationItem>> {
        let request = self.chat_request(profile, category, limit);

        let content = tokio::time::timeout(self.config.timeout, self.provider.complete(&request))
            .await
            .map_err(|_| {
                AppError::ExternalApi(format!(
                    "{} did not answer within {:?}",
                    self.provider.name(),
                    self.config.timeout
                ))
            })??;

        let items = parse_recommendations(&content, limit)?;

        tracing::info!(
            provider = self.provider.name(),
            model = %self.config.model,
            items = items.len(),
            "AI recommendations generated"
        );

        Ok(items)
    }

    fn name(&self) -> &'static str {
        "ai"
    }
}
