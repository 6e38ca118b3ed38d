//! LLM API HTTP Client
//!
//! Supports both the Anthropic Messages API and OpenAI-compatible APIs.

use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::config::{LlmConfig, LlmProvider};
use crate::error::{Error, Result};
use crate::history::Turn;

use super::types::*;

/// Remote service producing one assistant turn for an ordered conversation
#[async_trait]
pub trait CompletionService: Send + Sync {
    async fn complete(&self, turns: &[Turn]) -> Result<Turn>;
}

/// LLM API client (supports Claude and OpenAI-compatible APIs)
#[derive(Clone)]
pub struct LlmClient {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
    provider: LlmProvider,
    max_tokens: u64,
}

impl LlmClient {
    /// Create a new LLM client
    pub fn new(config: &LlmConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout() + Duration::from_secs(5))
            .build()
            .map_err(Error::Http)?;

        let base_url = match &config.base_url {
            Some(url) => url.trim_end_matches('/').to_string(),
            None => match config.provider {
                LlmProvider::Claude => "https://api.anthropic.com/v1".to_string(),
                LlmProvider::OpenAi => "https://api.openai.com/v1".to_string(),
            },
        };

        Ok(Self {
            client,
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            base_url,
            provider: config.provider.clone(),
            max_tokens: config.max_tokens,
        })
    }

    /// Get the model name
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Get the provider type
    pub fn provider(&self) -> &LlmProvider {
        &self.provider
    }

    /// Send request to the Anthropic Messages API
    async fn send_claude_request(&self, turns: &[Turn]) -> Result<String> {
        let url = format!("{}/messages", self.base_url);
        let request = MessagesRequest::from_turns(&self.model, self.max_tokens, turns);

        debug!("Sending request to Claude API: {}", url);

        let response = self
            .client
            .post(&url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", "2023-06-01")
            .header("content-type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(Error::Http)?;

        let status = response.status();
        let body = response.text().await.map_err(Error::Http)?;

        if !status.is_success() {
            warn!("Claude API error: {} - {}", status, body);
            return Err(Error::Completion(format!("{}: {}", status, body)));
        }

        let parsed: MessagesResponse = serde_json::from_str(&body).map_err(|e| {
            Error::Completion(format!("Failed to parse response: {} - {}", e, body))
        })?;

        info!(
            "Claude API response: stop_reason={:?}, tokens={}",
            parsed.stop_reason,
            parsed.usage.as_ref().map(|u| u.output_tokens).unwrap_or(0)
        );

        Ok(parsed.text())
    }

    /// Send request to an OpenAI-compatible API
    async fn send_openai_request(&self, turns: &[Turn]) -> Result<String> {
        let url = format!("{}/chat/completions", self.base_url);
        let request = ChatCompletionRequest::from_turns(&self.model, self.max_tokens, turns);

        debug!("Sending request to OpenAI-compatible API: {}", url);

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("content-type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(Error::Http)?;

        let status = response.status();
        let body = response.text().await.map_err(Error::Http)?;

        if !status.is_success() {
            warn!("OpenAI API error: {} - {}", status, body);
            return Err(Error::Completion(format!("{}: {}", status, body)));
        }

        let parsed: ChatCompletionResponse = serde_json::from_str(&body).map_err(|e| {
            Error::Completion(format!("Failed to parse response: {} - {}", e, body))
        })?;

        info!(
            "OpenAI API response: finish_reason={:?}, tokens={}",
            parsed.choices.first().and_then(|c| c.finish_reason.as_deref()),
            parsed.usage.as_ref().map(|u| u.completion_tokens).unwrap_or(0)
        );

        Ok(parsed.text().unwrap_or_default().to_string())
    }
}

#[async_trait]
impl CompletionService for LlmClient {
    async fn complete(&self, turns: &[Turn]) -> Result<Turn> {
        let text = match self.provider {
            LlmProvider::Claude => self.send_claude_request(turns).await?,
            LlmProvider::OpenAi => self.send_openai_request(turns).await?,
        };

        if text.trim().is_empty() {
            return Err(Error::Completion("completion returned no text".to_string()));
        }

        Ok(Turn::assistant(text))
    }
}
