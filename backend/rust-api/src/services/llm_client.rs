//! Chat-completion provider seam and its OpenRouter implementation.

use anyhow::Context;
use async_trait::async_trait;
use serde_json::{json, Value};
use std::time::Duration;

use crate::config::LlmSettings;
use crate::utils::json_extract::EMPTY_OBJECT;

/// Provider bodies can be large HTML error pages; keep only the head.
const ERROR_BODY_LIMIT: usize = 512;

#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("chat-completion request timed out")]
    Timeout,

    #[error("chat-completion transport failure: {0}")]
    Network(String),

    #[error("chat-completion provider returned {status}: {body}")]
    Status { status: u16, body: String },
}

impl ProviderError {
    /// Timeouts and 5xx responses are worth another attempt; nothing else is.
    pub fn is_transient(&self) -> bool {
        match self {
            ProviderError::Timeout => true,
            ProviderError::Status { status, .. } => *status >= 500,
            ProviderError::Network(_) => false,
        }
    }

    /// Metric label for the failure class.
    pub fn kind(&self) -> &'static str {
        match self {
            ProviderError::Timeout => "timeout",
            ProviderError::Network(_) => "network",
            ProviderError::Status { .. } => "http_error",
        }
    }
}

impl From<reqwest::Error> for ProviderError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            ProviderError::Timeout
        } else {
            ProviderError::Network(e.to_string())
        }
    }
}

/// Sends one system + user prompt pair and returns the assistant's raw text.
#[async_trait]
pub trait ChatCompletion: Send + Sync {
    async fn complete(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        max_tokens: u32,
        temperature: f64,
    ) -> Result<String, ProviderError>;
}

pub struct OpenRouterClient {
    http_client: reqwest::Client,
    api_url: String,
    api_key: String,
    model: String,
    referer: String,
    title: String,
}

impl OpenRouterClient {
    pub fn new(settings: &LlmSettings) -> anyhow::Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .context("Failed to build chat-completion HTTP client")?;

        Ok(Self {
            http_client,
            api_url: settings.api_url.clone(),
            api_key: settings.api_key.clone(),
            model: settings.model.clone(),
            referer: settings.referer.clone(),
            title: settings.title.clone(),
        })
    }

    fn request_body(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        max_tokens: u32,
        temperature: f64,
    ) -> Value {
        json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": system_prompt },
                { "role": "user", "content": user_prompt }
            ],
            "max_tokens": max_tokens,
            "temperature": temperature,
            "response_format": { "type": "json_object" }
        })
    }
}

#[async_trait]
impl ChatCompletion for OpenRouterClient {
    async fn complete(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        max_tokens: u32,
        temperature: f64,
    ) -> Result<String, ProviderError> {
        let body = self.request_body(system_prompt, user_prompt, max_tokens, temperature);

        let mut request = self
            .http_client
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(&body);
        if !self.referer.is_empty() {
            request = request.header("HTTP-Referer", &self.referer);
        }
        if !self.title.is_empty() {
            request = request.header("X-Title", &self.title);
        }

        let response = request.send().await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ProviderError::Status {
                status: status.as_u16(),
                body: error_text.chars().take(ERROR_BODY_LIMIT).collect(),
            });
        }

        let envelope: Value = match response.json().await {
            Ok(envelope) => envelope,
            Err(e) if e.is_timeout() => return Err(ProviderError::Timeout),
            Err(e) => {
                tracing::warn!("Chat-completion envelope was not JSON: {}", e);
                return Ok(EMPTY_OBJECT.to_string());
            }
        };

        Ok(message_content(&envelope))
    }
}

/// Pulls `choices[0].message.content` out of an OpenAI-style envelope.
/// Unexpected shapes yield `"{}"`.
pub fn message_content(envelope: &Value) -> String {
    let content = envelope
        .get("choices")
        .and_then(|choices| choices.get(0))
        .and_then(|choice| choice.get("message"))
        .and_then(|message| message.get("content"));

    match content {
        Some(Value::String(text)) => text.clone(),
        // Some providers return content as a list of typed parts.
        Some(Value::Array(parts)) => {
            let text: String = parts
                .iter()
                .filter_map(|part| part.get("text").and_then(Value::as_str))
                .collect();
            if text.is_empty() {
                EMPTY_OBJECT.to_string()
            } else {
                text
            }
        }
        _ => {
            tracing::warn!("Chat-completion envelope had no message content");
            EMPTY_OBJECT.to_string()
        }
    }
}
