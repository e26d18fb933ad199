//! Port traits implemented by the adapter layer.

use async_trait::async_trait;

use crate::domain::errors::AnalysisResult;
use crate::domain::models::UsageMetrics;

/// One completion request, provider-agnostic.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    /// Composed system prompt.
    pub system_prompt: String,

    /// Document content (already truncated to the budget).
    pub user_content: String,

    /// Estimator's token count for the whole request.
    ///
    /// Backends that size their context window explicitly (Ollama) derive
    /// `num_ctx` from this; hosted APIs ignore it.
    pub prompt_tokens: usize,
}

/// Raw completion plus usage accounting.
#[derive(Debug, Clone)]
pub struct Completion {
    /// Unparsed completion text.
    pub raw_text: String,

    /// Token usage, reported by the API or estimated locally when the
    /// backend returns none.
    pub usage: UsageMetrics,
}

/// A completion provider backend.
///
/// Implementations are built once at startup by the provider registry and
/// shared read-only across calls. One HTTP request per `complete` call, no
/// retries at this layer; a transport timeout must surface as
/// [`AnalysisError::Timeout`](crate::domain::errors::AnalysisError::Timeout)
/// rather than a generic failure.
#[async_trait]
pub trait Provider: Send + Sync + std::fmt::Debug {
    /// Short backend name for logs and CLI output.
    fn name(&self) -> &'static str;

    /// Send one chat completion and return the raw text plus usage.
    async fn complete(&self, request: CompletionRequest) -> AnalysisResult<Completion>;
}
