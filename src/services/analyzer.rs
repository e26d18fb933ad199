//! Analysis orchestration.
//!
//! Drives one document through the full pipeline: compose the prompt,
//! estimate its token cost, budget the remaining window, truncate the
//! document text to fit, call the provider, and validate the response.
//! Failures never escape as `Err`: every error is converted at this
//! boundary into an empty outcome carrying the message, so batch callers
//! keep going.

use std::sync::Arc;

use tracing::{debug, error, info, warn};

use crate::adapters::paperless::PaperlessClient;
use crate::domain::errors::AnalysisResult;
use crate::domain::models::{
    AnalysisOutcome, AnalysisRequest, Config, ProviderKind, TokenBudget, TokenConfig,
};
use crate::domain::ports::{CompletionRequest, Provider};
use crate::services::prompt::PromptComposer;
use crate::services::{response, tokens, truncation};

/// Orchestrates document analyses against a single configured provider.
pub struct DocumentAnalyzer {
    provider: Arc<dyn Provider>,
    composer: PromptComposer,
    paperless: Option<PaperlessClient>,
    /// Model id used for local token estimation.
    model: String,
    tokens: TokenConfig,
}

impl DocumentAnalyzer {
    /// Build an analyzer around an already-constructed provider.
    pub fn new(provider: Arc<dyn Provider>, config: &Config) -> Self {
        Self {
            provider,
            composer: PromptComposer::new(config.analysis.clone()),
            paperless: PaperlessClient::from_config(&config.paperless),
            model: estimation_model(config),
            tokens: config.tokens,
        }
    }

    /// Analyze one document, always producing an outcome.
    pub async fn analyze(&self, request: AnalysisRequest) -> AnalysisOutcome {
        self.cache_thumbnail(&request).await;

        match self.try_analyze(&request).await {
            Ok(outcome) => {
                info!(
                    document_id = ?request.document_id,
                    tags = outcome.suggestions.tags.len(),
                    truncated = outcome.truncated,
                    "Document analysis complete"
                );
                outcome
            }
            Err(err) => {
                error!(
                    document_id = ?request.document_id,
                    stage = err.stage(),
                    error = %err,
                    "Document analysis failed"
                );
                AnalysisOutcome::failed(err.to_string())
            }
        }
    }

    async fn try_analyze(&self, request: &AnalysisRequest) -> AnalysisResult<AnalysisOutcome> {
        let prompt = self.composer.compose(request, &self.model);
        let prompt_tokens = tokens::estimate_fragments(prompt.fragments(), &self.model);

        let budget = TokenBudget {
            max_context_tokens: self.tokens.limit,
            reserved_response_tokens: self.tokens.response_tokens,
            prompt_tokens,
        };
        let available = budget.available()?;
        debug!(prompt_tokens, available, "Token budget computed");

        let content = truncation::truncate(&request.content, available, &self.model)?;
        let truncated = content.len() < request.content.len();
        let total_prompt_tokens = prompt_tokens + tokens::estimate(&content, &self.model);

        let completion = self
            .provider
            .complete(CompletionRequest {
                system_prompt: prompt.fragments().join("\n\n"),
                user_content: content.into_owned(),
                prompt_tokens: total_prompt_tokens,
            })
            .await?;

        let suggestions = response::parse(&completion.raw_text)?;
        Ok(AnalysisOutcome::success(
            suggestions,
            completion.usage,
            truncated,
        ))
    }

    /// Best-effort thumbnail caching; failures are logged and ignored.
    async fn cache_thumbnail(&self, request: &AnalysisRequest) {
        let (Some(client), Some(id)) = (&self.paperless, request.document_id) else {
            return;
        };
        if let Err(err) = client.cache_thumbnail(id).await {
            warn!(document_id = id, "Thumbnail caching failed: {err:#}");
        }
    }
}

/// Model id to estimate tokens with, taken from the active provider config.
fn estimation_model(config: &Config) -> String {
    match config.ai_provider {
        ProviderKind::OpenAi => config.openai.model.clone(),
        ProviderKind::Azure => config.azure.deployment.clone(),
        ProviderKind::Ollama => config.ollama.model.clone(),
        ProviderKind::Custom => config.custom.model.clone(),
    }
}
