use serde::Serialize;
use std::sync::Arc;

use crate::{
    config::RecommenderConfig,
    error::{AppError, AppResult},
    models::{ActivityKind, NewActivity},
    services::{
        activity::ActivityService,
        providers::{ChatMessage, ChatRequest, CompletionProvider},
    },
};

const SYSTEM_PROMPT: &str = "You are a supportive wellness assistant for Wellspire, a wellness \
platform. You help users with:
- Nutrition and healthy eating advice
- Exercise and workout suggestions
- Mindfulness and yoga practices
- General health and wellness guidance

Guidelines:
- Be encouraging and supportive, especially for beginners
- Provide practical, actionable advice
- Keep responses concise but helpful
- Never provide medical diagnosis or treatment advice
- Suggest consulting healthcare professionals for serious concerns
- Reference the platform's content categories: Food & Nutrition, Health & Wellness, \
Workout & Exercise, Yoga & Mindfulness
- Maintain a warm, non-judgmental tone";

const DEFAULT_REPLY: &str = "I'm here to support your wellness journey! I can provide guidance on \
nutrition, exercise, stress management, sleep, and healthy lifestyle habits. What specific \
wellness topic would you like to discuss today?";

/// Keyword-matched replies, checked in order. The first entry with any
/// keyword contained in the lowercased message wins.
const CANNED_REPLIES: &[(&[&str], &str)] = &[
    (
        &["breakfast", "morning meal"],
        "For a healthy breakfast, try: Greek yogurt with berries and nuts, oatmeal with banana \
         and chia seeds, or avocado toast with a poached egg. These provide protein, fiber, and \
         sustained energy to start your day right!",
    ),
    (
        &["food", "eat", "nutrition", "diet", "meal"],
        "Focus on whole foods: lean proteins, colorful vegetables, whole grains, and healthy \
         fats. Aim for balanced meals with protein, complex carbs, and vegetables. Stay hydrated \
         and eat mindfully. Small, consistent changes work better than drastic restrictions.",
    ),
    (
        &["exercise", "workout", "fitness", "gym", "cardio", "strength"],
        "Start with 150 minutes of moderate exercise weekly. Try: 30-minute walks, bodyweight \
         exercises (push-ups, squats, planks), or beginner yoga. Mix cardio with strength \
         training. Listen to your body and progress gradually.",
    ),
    (
        &["stress", "anxiety", "mindful", "meditation", "mental", "calm"],
        "Try these stress-relief techniques: deep breathing (4-7-8 method), 10-minute daily \
         meditation, gentle yoga, or mindful walking. Regular exercise, adequate sleep, and \
         limiting caffeine also help manage stress naturally.",
    ),
    (
        &["sleep", "tired", "insomnia", "rest"],
        "For better sleep: maintain a consistent bedtime, avoid screens 1 hour before bed, keep \
         your room cool and dark, try chamomile tea, and consider gentle stretching or reading. \
         Aim for 7-9 hours nightly.",
    ),
    (
        &["weight", "lose", "gain", "fat", "muscle"],
        "Sustainable weight management combines balanced nutrition with regular exercise. Focus \
         on whole foods, portion control, staying hydrated, and being patient with progress. \
         Aim for 1-2 pounds per week for healthy weight loss.",
    ),
    (
        &["water", "hydrat", "drink"],
        "Aim for 8-10 glasses of water daily. Start your day with a glass of water, carry a \
         water bottle, and eat water-rich foods like cucumbers and watermelon. Proper hydration \
         supports energy, skin health, and overall wellness.",
    ),
    (
        &["pain", "ache", "sore", "hurt"],
        "For natural pain relief: try gentle stretching, apply heat or ice as appropriate, \
         practice deep breathing, consider anti-inflammatory foods like turmeric and cherries, \
         and ensure adequate rest. Consult a healthcare provider for persistent pain.",
    ),
    (
        &["energy", "fatigue", "boost"],
        "Boost energy naturally: eat balanced meals with protein and complex carbs, stay \
         hydrated, get 7-9 hours of sleep, take short walks, limit processed sugar, and consider \
         B-vitamins from whole foods.",
    ),
    (
        &["goal", "motivat", "start", "begin", "plan"],
        "Set SMART goals: Specific, Measurable, Achievable, Relevant, Time-bound. Start small \
         (like 10-minute daily walks), track progress, celebrate wins, and be flexible. \
         Consistency beats perfection every time!",
    ),
    (
        &["vitamin", "supplement", "nutrient"],
        "Focus on nutrients from whole foods first: vitamin D from sunlight and fish, vitamin C \
         from citrus and berries, iron from leafy greens and lean meats. Consult a healthcare \
         provider before starting supplements.",
    ),
    (
        &["health", "wellness", "healthy", "tips"],
        "Key wellness habits: eat whole foods, exercise regularly, get quality sleep, manage \
         stress, stay hydrated, maintain social connections, and schedule regular health \
         check-ups. Small daily choices create lasting health benefits.",
    ),
];

/// Picks the canned reply for `message`
pub fn canned_reply(message: &str) -> &'static str {
    let message = message.to_lowercase();

    CANNED_REPLIES
        .iter()
        .find(|(keywords, _)| keywords.iter().any(|k| message.contains(k)))
        .map(|(_, reply)| *reply)
        .unwrap_or(DEFAULT_REPLY)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ReplySource {
    Ai,
    Canned,
}

impl ReplySource {
    fn as_str(&self) -> &'static str {
        match self {
            ReplySource::Ai => "ai",
            ReplySource::Canned => "canned",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatReply {
    pub response: String,
    pub source: ReplySource,
    /// Set when the exchange was logged against a user
    #[serde(skip_serializing_if = "Option::is_none")]
    pub activity_id: Option<i64>,
}

/// Wellness chat backed by the completion provider, with canned replies
/// when no provider is configured or the call fails
#[derive(Clone)]
pub struct ChatService {
    provider: Option<Arc<dyn CompletionProvider>>,
    config: RecommenderConfig,
    activity: ActivityService,
}

impl ChatService {
    pub fn new(
        provider: Option<Arc<dyn CompletionProvider>>,
        config: RecommenderConfig,
        activity: ActivityService,
    ) -> Self {
        let provider = provider.filter(|_| config.ai_enabled());
        Self {
            provider,
            config,
            activity,
        }
    }

    /// Answers one message. Only an empty message is an error.
    pub async fn reply(&self, user_id: Option<i64>, message: &str) -> AppResult<ChatReply> {
        let message = message.trim();
        if message.is_empty() {
            return Err(AppError::InvalidInput("Message is required".to_string()));
        }

        let (response, source) = match self.ai_reply(message).await {
            Some(text) => (text, ReplySource::Ai),
            None => (canned_reply(message).to_string(), ReplySource::Canned),
        };

        let activity_id = match user_id {
            Some(user_id) => self.log_exchange(user_id, source).await,
            None => None,
        };

        Ok(ChatReply {
            response,
            source,
            activity_id,
        })
    }

    async fn ai_reply(&self, message: &str) -> Option<String> {
        let provider = self.provider.as_ref()?;

        let request = ChatRequest {
            model: self.config.model.clone(),
            messages: vec![ChatMessage::system(SYSTEM_PROMPT), ChatMessage::user(message)],
            max_tokens: self.config.chat_max_tokens,
            temperature: self.config.temperature,
            json_response: false,
        };

        match tokio::time::timeout(self.config.timeout, provider.complete(&request)).await {
            Ok(Ok(text)) if !text.trim().is_empty() => Some(text),
            Ok(Ok(_)) => {
                tracing::warn!(provider = provider.name(), "Empty chat completion, using canned reply");
                None
            }
            Ok(Err(e)) => {
                tracing::warn!(provider = provider.name(), error = %e, "Chat completion failed, using canned reply");
                None
            }
            Err(_) => {
                tracing::warn!(provider = provider.name(), "Chat completion timed out, using canned reply");
                None
            }
        }
    }

    /// Chat still answers when the log write fails
    async fn log_exchange(&self, user_id: i64, source: ReplySource) -> Option<i64> {
        let activity = NewActivity::new(user_id, ActivityKind::ChatInteraction)
            .metadata("reply_source", source.as_str());

        match self.activity.record(activity).await {
            Ok(record) => Some(record.id),
            Err(e) => {
                tracing::warn!(user_id, error = %e, "Failed to record chat interaction");
                None
            }
        }
    }
}
