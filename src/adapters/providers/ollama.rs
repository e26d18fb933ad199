//! Ollama adapter for local model inference.
//!
//! The generate endpoint takes one combined prompt rather than a
//! system/user role split, and needs an explicit context window size: we
//! compute `num_ctx` per request from the token estimate instead of letting
//! the server default swallow long documents. Local inference is slow, so
//! the timeout is much longer than for hosted APIs.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::errors::{AnalysisError, AnalysisResult};
use crate::domain::models::{OllamaConfig, TokenConfig, UsageMetrics};
use crate::domain::ports::{Completion, CompletionRequest, Provider};
use crate::services::tokens;

use super::openai::map_transport_error;

/// Request timeout for local inference.
pub const OLLAMA_TIMEOUT_SECS: u64 = 300;

/// Fixed nucleus-sampling probability.
const TOP_P: f64 = 0.9;

/// Fixed repetition penalty.
const REPEAT_PENALTY: f64 = 1.1;

/// Sampling temperature for local generation.
const TEMPERATURE: f64 = 0.7;

#[derive(Debug, Serialize)]
struct GenerateRequest {
    model: String,
    prompt: String,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Debug, Serialize)]
struct GenerateOptions {
    temperature: f64,
    top_p: f64,
    repeat_penalty: f64,
    num_ctx: usize,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    response: Option<String>,
}

/// Dynamic context window: just enough for prompt plus expected response,
/// capped by the configured limit.
pub fn calculate_num_ctx(
    prompt_tokens: usize,
    expected_response_tokens: usize,
    max_context: usize,
) -> usize {
    (prompt_tokens + expected_response_tokens).min(max_context)
}

/// Ollama provider.
#[derive(Debug)]
pub struct OllamaProvider {
    api_url: String,
    model: String,
    expected_response_tokens: usize,
    max_context_tokens: usize,
    client: Client,
}

impl OllamaProvider {
    /// Create an adapter for a local Ollama server.
    pub fn new(config: &OllamaConfig, token_config: &TokenConfig) -> AnalysisResult<Self> {
        if config.api_url.is_empty() {
            return Err(AnalysisError::Configuration(
                "Ollama API URL is not set".to_string(),
            ));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(OLLAMA_TIMEOUT_SECS))
            .build()
            .map_err(|e| {
                AnalysisError::Configuration(format!("failed to create HTTP client: {e}"))
            })?;

        Ok(Self {
            api_url: config.api_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            expected_response_tokens: token_config.response_tokens,
            max_context_tokens: token_config.limit,
            client,
        })
    }
}

#[async_trait]
impl Provider for OllamaProvider {
    fn name(&self) -> &'static str {
        "ollama"
    }

    async fn complete(&self, request: CompletionRequest) -> AnalysisResult<Completion> {
        let num_ctx = calculate_num_ctx(
            request.prompt_tokens,
            self.expected_response_tokens,
            self.max_context_tokens,
        );

        debug!(
            prompt_tokens = request.prompt_tokens,
            expected_response_tokens = self.expected_response_tokens,
            num_ctx,
            "Computed dynamic context window"
        );

        // No role split on this endpoint: send one combined prompt.
        let body = GenerateRequest {
            model: self.model.clone(),
            prompt: format!("{}\n\n{}", request.system_prompt, request.user_content),
            stream: false,
            options: GenerateOptions {
                temperature: TEMPERATURE,
                top_p: TOP_P,
                repeat_penalty: REPEAT_PENALTY,
                num_ctx,
            },
        };

        let response = self
            .client
            .post(format!("{}/api/generate", self.api_url))
            .json(&body)
            .send()
            .await
            .map_err(|e| map_transport_error("ollama", &e))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AnalysisError::Provider(format!(
                "ollama returned HTTP {status}: {body}"
            )));
        }

        let parsed: GenerateResponse = response
            .json()
            .await
            .map_err(|e| AnalysisError::Provider(format!("failed to parse response: {e}")))?;

        let raw_text = parsed.response.ok_or_else(|| {
            AnalysisError::Provider("ollama returned an invalid response structure".to_string())
        })?;

        // The generate endpoint reports no usage object; estimate locally.
        let completion_tokens = tokens::estimate(&raw_text, &self.model) as u64;
        let usage = UsageMetrics {
            prompt_tokens: request.prompt_tokens as u64,
            completion_tokens,
            total_tokens: request.prompt_tokens as u64 + completion_tokens,
        };

        Ok(Completion { raw_text, usage })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_num_ctx_below_limit() {
        assert_eq!(calculate_num_ctx(300, 1024, 2048), 1324);
    }

    #[test]
    fn test_num_ctx_capped_at_limit() {
        assert_eq!(calculate_num_ctx(4000, 1024, 2048), 2048);
    }

    #[test]
    fn test_num_ctx_exactly_at_limit() {
        assert_eq!(calculate_num_ctx(1024, 1024, 2048), 2048);
    }

    #[test]
    fn test_provider_construction() {
        let provider =
            OllamaProvider::new(&OllamaConfig::default(), &TokenConfig::default()).unwrap();
        assert_eq!(provider.name(), "ollama");
        assert_eq!(provider.api_url, "http://localhost:11434");
        assert_eq!(provider.expected_response_tokens, 1024);
    }

    #[test]
    fn test_empty_api_url_is_configuration_error() {
        let config = OllamaConfig {
            api_url: String::new(),
            model: "llama3.1".to_string(),
        };
        let err = OllamaProvider::new(&config, &TokenConfig::default()).unwrap_err();
        assert!(matches!(err, AnalysisError::Configuration(_)));
    }
}
