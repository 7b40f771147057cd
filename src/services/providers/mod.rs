/// Chat-completion provider abstraction
///
/// The AI recommendation strategy only needs "send role-tagged messages, get
/// text back".
use serde::Serialize;
use std::sync::Arc;

use crate::{config::RecommenderConfig, error::AppResult};

pub mod openai;

pub use openai::OpenAiProvider;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// One chat-style completion call
#[derive(Debug, Clone, PartialEq)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub max_tokens: u32,
    pub temperature: f32,
    /// Ask the provider to constrain output to a JSON object
    pub json_response: bool,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Returns the text of the first completion choice
    async fn complete(&self, request: &ChatRequest) -> AppResult<String>;

    /// Provider name for logging
    fn name(&self) -> &'static str;
}

/// Builds the OpenAI provider when `config` carries a key
pub fn from_config(config: &RecommenderConfig) -> AppResult<Option<Arc<dyn CompletionProvider>>> {
    let Some(key) = &config.api_key else {
        return Ok(None);
    };

    let provider = OpenAiProvider::new(key.clone(), config.api_url.clone(), config.timeout)?;
    Ok(Some(Arc::new(provider)))
}
