//! Azure OpenAI adapter.
//!
//! Same chat-completions wire format as OpenAI, but the model is addressed
//! as a deployment in the URL path, authentication uses an `api-key`
//! header, and an `api-version` query parameter is mandatory.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use crate::domain::errors::{AnalysisError, AnalysisResult};
use crate::domain::models::AzureConfig;
use crate::domain::ports::{Completion, CompletionRequest, Provider};

use super::openai::{
    extract_completion, map_transport_error, ChatCompletionRequest, ChatCompletionResponse,
    HOSTED_TIMEOUT_SECS,
};

/// Azure OpenAI provider.
#[derive(Debug)]
pub struct AzureProvider {
    endpoint: String,
    api_key: String,
    deployment: String,
    api_version: String,
    client: Client,
}

impl AzureProvider {
    /// Create an adapter for an Azure OpenAI deployment.
    pub fn new(config: &AzureConfig) -> AnalysisResult<Self> {
        if config.api_key.is_empty() {
            return Err(AnalysisError::Configuration(
                "Azure API key is not set".to_string(),
            ));
        }
        if config.endpoint.is_empty() || config.deployment.is_empty() {
            return Err(AnalysisError::Configuration(
                "Azure endpoint and deployment name are required".to_string(),
            ));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(HOSTED_TIMEOUT_SECS))
            .build()
            .map_err(|e| {
                AnalysisError::Configuration(format!("failed to create HTTP client: {e}"))
            })?;

        Ok(Self {
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            deployment: config.deployment.clone(),
            api_version: config.api_version.clone(),
            client,
        })
    }

    fn completions_url(&self) -> String {
        format!(
            "{}/openai/deployments/{}/chat/completions?api-version={}",
            self.endpoint, self.deployment, self.api_version
        )
    }
}

#[async_trait]
impl Provider for AzureProvider {
    fn name(&self) -> &'static str {
        "azure"
    }

    async fn complete(&self, request: CompletionRequest) -> AnalysisResult<Completion> {
        // The deployment name stands in for the model id on Azure.
        let body = ChatCompletionRequest::from_completion(&self.deployment, &request);

        debug!(deployment = %self.deployment, "Sending Azure chat completion request");

        let response = self
            .client
            .post(self.completions_url())
            .header("api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| map_transport_error("azure", &e))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AnalysisError::Provider(format!(
                "azure returned HTTP {status}: {body}"
            )));
        }

        let parsed: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| AnalysisError::Provider(format!("failed to parse response: {e}")))?;

        extract_completion("azure", parsed, &request, &self.deployment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> AzureConfig {
        AzureConfig {
            api_key: "key".to_string(),
            endpoint: "https://my-resource.openai.azure.com".to_string(),
            deployment: "gpt-4o-docs".to_string(),
            api_version: "2024-02-15-preview".to_string(),
        }
    }

    #[test]
    fn test_missing_credentials() {
        let err = AzureProvider::new(&AzureConfig::default()).unwrap_err();
        assert!(matches!(err, AnalysisError::Configuration(_)));

        let mut config = valid_config();
        config.endpoint = String::new();
        assert!(AzureProvider::new(&config).is_err());
    }

    #[test]
    fn test_completions_url_shape() {
        let provider = AzureProvider::new(&valid_config()).unwrap();
        assert_eq!(
            provider.completions_url(),
            "https://my-resource.openai.azure.com/openai/deployments/gpt-4o-docs/chat/completions?api-version=2024-02-15-preview"
        );
    }

    #[test]
    fn test_trailing_slash_normalized() {
        let mut config = valid_config();
        config.endpoint = "https://my-resource.openai.azure.com/".to_string();
        let provider = AzureProvider::new(&config).unwrap();
        assert!(!provider.completions_url().contains(".com//"));
    }
}
