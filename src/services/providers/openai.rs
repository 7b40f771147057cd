/// OpenAI chat completions provider
///
/// Speaks the `/chat/completions` wire format, which other OpenAI-compatible
/// gateways accept as well.
use reqwest::Client as HttpClient;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::{
    error::{AppError, AppResult},
    services::providers::{ChatMessage, ChatRequest, CompletionProvider},
};

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Serialize)]
struct CompletionBody<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    max_tokens: u32,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[derive(Clone)]
pub struct OpenAiProvider {
    http_client: HttpClient,
    api_key: String,
    api_url: String,
}

impl OpenAiProvider {
    /// Builds a provider whose every call is cut off after `timeout`
    pub fn new(api_key: String, api_url: String, timeout: Duration) -> AppResult<Self> {
        let http_client = HttpClient::builder().timeout(timeout).build()?;

        Ok(Self {
            http_client,
            api_key,
            api_url: api_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait::async_trait]
impl CompletionProvider for OpenAiProvider {
    async fn complete(&self, request: &ChatRequest) -> AppResult<String> {
        let url = format!("{}/chat/completions", self.api_url);

        let body = CompletionBody {
            model: &request.model,
            messages: &request.messages,
            max_tokens: request.max_tokens,
            temperature: request.temperature,
            response_format: request.json_response.then_some(ResponseFormat {
                kind: "json_object",
            }),
        };

        let response = self
            .http_client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::ExternalApi(format!(
                "OpenAI API returned status {}: {}",
                status, body
            )));
        }

        let completion: CompletionResponse = response.json().await?;

        let content = completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| AppError::ExternalApi("OpenAI response had no content".to_string()))?;

        tracing::debug!(
            model = %request.model,
            chars = content.len(),
            provider = "openai",
            "Completion received"
        );

        Ok(content)
    }

    fn name(&self) -> &'static str {
        "openai"
    }
}
