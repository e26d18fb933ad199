//! Domain models.

pub mod analysis;
pub mod config;

pub use analysis::{
    AnalysisOutcome, AnalysisRequest, ComposedPrompt, DocumentSuggestions, TagRef, TokenBudget,
    UsageMetrics,
};
pub use config::{
    AnalysisConfig, AzureConfig, Config, CustomField, CustomProviderConfig, LoggingConfig,
    OllamaConfig, OpenAiConfig, PaperlessConfig, ProviderKind, TokenConfig,
};
