//! Domain errors for the Tagsmith analysis pipeline.

use thiserror::Error;

/// Errors that can occur while analyzing a document.
///
/// Internal components fail with one of these typed conditions; only the
/// orchestrator boundary converts them into the empty-outcome shape handed
/// to callers.
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// No provider client could be built from the active configuration.
    #[error("Provider not configured: {0}")]
    Configuration(String),

    /// Prompt plus reserved response tokens exhaust the context window.
    #[error("Token limit exceeded: {reserved} tokens required but only {max} available")]
    BudgetExceeded {
        /// Tokens required by the prompt and the expected response.
        reserved: usize,
        /// Token count actually available.
        max: usize,
    },

    /// The provider did not answer within its timeout.
    #[error("Analysis timed out: {0}. Please try again.")]
    Timeout(String),

    /// Non-timeout provider or network failure.
    #[error("Provider request failed: {0}")]
    Provider(String),

    /// The completion was not the JSON contract we asked for.
    #[error("Invalid response from provider: {0}")]
    InvalidResponse(String),

    /// JSON (de)serialization failure outside the response contract.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl AnalysisError {
    /// Pipeline stage label used when logging which step failed.
    pub const fn stage(&self) -> &'static str {
        match self {
            Self::Configuration(_) => "configuration",
            Self::BudgetExceeded { .. } => "budget",
            Self::Timeout(_) => "provider_timeout",
            Self::Provider(_) => "provider",
            Self::InvalidResponse(_) => "response_validation",
            Self::Serialization(_) => "serialization",
        }
    }
}

/// Convenience alias used throughout the crate.
pub type AnalysisResult<T> = Result<T, AnalysisError>;

impl From<serde_json::Error> for AnalysisError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}
