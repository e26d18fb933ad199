//! OpenAI chat-completions adapter.
//!
//! Also serves any OpenAI-compatible endpoint via [`OpenAiProvider::custom`];
//! only the base URL, credentials, and adapter name differ.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::errors::{AnalysisError, AnalysisResult};
use crate::domain::models::{CustomProviderConfig, OpenAiConfig, UsageMetrics};
use crate::domain::ports::{Completion, CompletionRequest, Provider};
use crate::services::tokens;

use super::{model_supports_temperature, DEFAULT_TEMPERATURE};

/// Request timeout for hosted chat APIs.
pub const HOSTED_TIMEOUT_SECS: u64 = 60;

/// A chat message on the wire.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct ChatMessage {
    pub role: String,
    pub content: String,
}

/// Chat-completions request body.
#[derive(Debug, Serialize)]
pub(crate) struct ChatCompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    /// Omitted entirely for models that reject the parameter.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
}

impl ChatCompletionRequest {
    /// Build the standard system+user message pair with temperature gated
    /// by the model capability table.
    pub fn from_completion(model: &str, request: &CompletionRequest) -> Self {
        Self {
            model: model.to_string(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: request.system_prompt.clone(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: request.user_content.clone(),
                },
            ],
            temperature: model_supports_temperature(model).then_some(DEFAULT_TEMPERATURE),
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChatCompletionResponse {
    #[serde(default)]
    pub choices: Vec<ChatChoice>,
    pub usage: Option<ApiUsage>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChatChoice {
    pub message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChatChoiceMessage {
    pub content: Option<String>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub(crate) struct ApiUsage {
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
    pub total_tokens: u64,
}

impl From<ApiUsage> for UsageMetrics {
    fn from(usage: ApiUsage) -> Self {
        Self {
            prompt_tokens: usage.prompt_tokens,
            completion_tokens: usage.completion_tokens,
            total_tokens: usage.total_tokens,
        }
    }
}

/// Map a reqwest transport error, keeping timeouts distinct.
pub(crate) fn map_transport_error(backend: &str, err: &reqwest::Error) -> AnalysisError {
    if err.is_timeout() {
        AnalysisError::Timeout(format!("{backend} request did not respond in time"))
    } else {
        AnalysisError::Provider(format!("{backend} request failed: {err}"))
    }
}

/// Extract text and usage from a chat-completions response, estimating
/// usage when the endpoint omits it.
pub(crate) fn extract_completion(
    backend: &str,
    response: ChatCompletionResponse,
    request: &CompletionRequest,
    model: &str,
) -> AnalysisResult<Completion> {
    let raw_text = response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .ok_or_else(|| {
            AnalysisError::Provider(format!("{backend} returned an invalid response structure"))
        })?;

    let usage = response.usage.map_or_else(
        || {
            let completion_tokens = tokens::estimate(&raw_text, model) as u64;
            UsageMetrics {
                prompt_tokens: request.prompt_tokens as u64,
                completion_tokens,
                total_tokens: request.prompt_tokens as u64 + completion_tokens,
            }
        },
        UsageMetrics::from,
    );

    Ok(Completion { raw_text, usage })
}

/// OpenAI (or OpenAI-compatible) provider.
#[derive(Debug)]
pub struct OpenAiProvider {
    name: &'static str,
    base_url: String,
    api_key: String,
    model: String,
    client: Client,
}

impl OpenAiProvider {
    /// Create an adapter for the hosted OpenAI API.
    pub fn new(config: &OpenAiConfig) -> AnalysisResult<Self> {
        if config.api_key.is_empty() {
            return Err(AnalysisError::Configuration(
                "OpenAI API key is not set".to_string(),
            ));
        }
        Self::build("openai", &config.base_url, &config.api_key, &config.model)
    }

    /// Create an adapter for a custom OpenAI-compatible endpoint.
    pub fn custom(config: &CustomProviderConfig) -> AnalysisResult<Self> {
        if config.base_url.is_empty() {
            return Err(AnalysisError::Configuration(
                "Custom provider base URL is not set".to_string(),
            ));
        }
        if config.model.is_empty() {
            return Err(AnalysisError::Configuration(
                "Custom provider model is not set".to_string(),
            ));
        }
        Self::build("custom", &config.base_url, &config.api_key, &config.model)
    }

    fn build(
        name: &'static str,
        base_url: &str,
        api_key: &str,
        model: &str,
    ) -> AnalysisResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(HOSTED_TIMEOUT_SECS))
            .build()
            .map_err(|e| {
                AnalysisError::Configuration(format!("failed to create HTTP client: {e}"))
            })?;

        Ok(Self {
            name,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            model: model.to_string(),
            client,
        })
    }

    /// Model id this adapter sends.
    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl Provider for OpenAiProvider {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn complete(&self, request: CompletionRequest) -> AnalysisResult<Completion> {
        let body = ChatCompletionRequest::from_completion(&self.model, &request);

        debug!(
            model = %self.model,
            temperature = ?body.temperature,
            "Sending chat completion request"
        );

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| map_transport_error(self.name, &e))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AnalysisError::Provider(format!(
                "{} returned HTTP {status}: {body}",
                self.name
            )));
        }

        let parsed: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| AnalysisError::Provider(format!("failed to parse response: {e}")))?;

        extract_completion(self.name, parsed, &request, &self.model)
    }
}
