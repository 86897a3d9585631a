// Chat-completion client for OpenAI-compatible APIs.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use thiserror::Error;

use crate::config::Config;
use crate::metrics;

/// Role of a message in the conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: MessageRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }
}

/// Request body for `POST {base_url}/chat/completions`.
#[derive(Debug, Serialize)]
pub struct ChatCompletionRequest<'a> {
    pub model: &'a str,
    pub messages: &'a [ChatMessage],
    pub temperature: f32,
}

#[derive(Debug, Deserialize)]
pub struct ChatCompletionResponse {
    #[serde(default)]
    pub choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
pub struct ChatChoice {
    pub message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
pub struct ChoiceMessage {
    #[serde(default)]
    pub content: Option<String>,
}

/// Why a completion call produced no text.
#[derive(Debug, Error)]
pub enum CompletionError {
    #[error("OpenAI API key is not configured")]
    MissingApiKey,
    #[error("request to completion service failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("completion service returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("failed to decode completion response: {0}")]
    Decode(String),
    #[error("completion response contained no choices")]
    EmptyChoices,
}

impl CompletionError {
    /// Short label used for the failure-kind metric.
    pub fn kind(&self) -> &'static str {
        match self {
            CompletionError::MissingApiKey => "missing_api_key",
            CompletionError::Transport(e) if e.is_timeout() => "timeout",
            CompletionError::Transport(_) => "transport",
            CompletionError::Status { .. } => "status",
            CompletionError::Decode(_) => "decode",
            CompletionError::EmptyChoices => "empty_choices",
        }
    }
}

/// Anything that can turn a conversation into one reply.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Request a single completion and return the first choice's text.
    async fn complete(
        &self,
        messages: &[ChatMessage],
        temperature: f32,
    ) -> Result<String, CompletionError>;

    fn model_name(&self) -> &str;
}

/// Production provider talking to an OpenAI-compatible endpoint.
pub struct OpenAiClient {
    client: Client,
    base_url: String,
    model: String,
    api_key: Option<String>,
}

impl OpenAiClient {
    pub fn new(config: &Config) -> Result<Self, CompletionError> {
        let client = Client::builder().timeout(config.openai_timeout).build()?;

        Ok(Self {
            client,
            base_url: config.openai_base_url.clone(),
            model: config.openai_model.clone(),
            api_key: config.openai_api_key.clone(),
        })
    }

    async fn send(
        &self,
        api_key: &str,
        messages: &[ChatMessage],
        temperature: f32,
    ) -> Result<String, CompletionError> {
        let request = ChatCompletionRequest {
            model: &self.model,
            messages,
            temperature,
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(CompletionError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body = response.bytes().await?;
        first_choice_text(&body)
    }
}

/// Pull the first choice's content out of a raw response body.
pub fn first_choice_text(body: &[u8]) -> Result<String, CompletionError> {
    let parsed: ChatCompletionResponse =
        serde_json::from_slice(body).map_err(|e| CompletionError::Decode(e.to_string()))?;

    parsed
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .filter(|text| !text.trim().is_empty())
        .ok_or(CompletionError::EmptyChoices)
}

#[async_trait]
impl CompletionProvider for OpenAiClient {
    async fn complete(
        &self,
        messages: &[ChatMessage],
        temperature: f32,
    ) -> Result<String, CompletionError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(CompletionError::MissingApiKey)?;

        let started = Instant::now();
        let result = self.send(api_key, messages, temperature).await;
        metrics::COMPLETION_DURATION_SECONDS.observe(started.elapsed().as_secs_f64());

        result
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
