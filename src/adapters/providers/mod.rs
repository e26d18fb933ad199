//! Completion provider adapters.
//!
//! One adapter per backend, all implementing [`Provider`]. The registry
//! builds exactly one immutable adapter from the active configuration at
//! startup; nothing here is ambient module state.

pub mod azure;
pub mod mock;
pub mod ollama;
pub mod openai;

use std::sync::Arc;

use crate::domain::errors::AnalysisResult;
use crate::domain::models::{Config, ProviderKind};
use crate::domain::ports::Provider;

pub use azure::AzureProvider;
pub use mock::MockProvider;
pub use ollama::OllamaProvider;
pub use openai::OpenAiProvider;

/// Sampling temperature for hosted chat models that accept one.
pub const DEFAULT_TEMPERATURE: f64 = 0.3;

/// Model families whose API rejects a sampling-temperature parameter.
///
/// Capability table rather than literal model comparisons so new reasoning
/// models only need a prefix entry here.
const NO_TEMPERATURE_MODEL_PREFIXES: &[&str] = &["o1", "o3", "o4"];

/// Whether the given model id accepts a sampling-temperature parameter.
pub fn model_supports_temperature(model: &str) -> bool {
    let m = model.to_lowercase();
    !NO_TEMPERATURE_MODEL_PREFIXES
        .iter()
        .any(|prefix| m.starts_with(prefix))
}

/// Builds the provider adapter selected by configuration.
pub struct ProviderRegistry;

impl ProviderRegistry {
    /// Create the configured provider.
    ///
    /// Called once at startup; the returned adapter is immutable and shared
    /// across analyses. Credential problems surface here as configuration
    /// errors, before any document is touched.
    pub fn create(config: &Config) -> AnalysisResult<Arc<dyn Provider>> {
        Ok(match config.ai_provider {
            ProviderKind::OpenAi => Arc::new(OpenAiProvider::new(&config.openai)?),
            ProviderKind::Azure => Arc::new(AzureProvider::new(&config.azure)?),
            ProviderKind::Ollama => Arc::new(OllamaProvider::new(&config.ollama, &config.tokens)?),
            ProviderKind::Custom => Arc::new(OpenAiProvider::custom(&config.custom)?),
        })
    }
}
