//! Configuration models.
//!
//! One provider variant is active per deployment; configuration is loaded
//! once at startup and treated as immutable for the duration of a batch.

use serde::{Deserialize, Serialize};

/// Which completion provider is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    /// Hosted OpenAI chat-completions API.
    OpenAi,
    /// Azure OpenAI deployment.
    Azure,
    /// Local Ollama generation endpoint.
    Ollama,
    /// Any OpenAI-compatible endpoint.
    Custom,
}

impl ProviderKind {
    /// Stable string form used in logs and CLI output.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::OpenAi => "openai",
            Self::Azure => "azure",
            Self::Ollama => "ollama",
            Self::Custom => "custom",
        }
    }

    /// Parse a provider name, tolerating common spellings.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "openai" | "open_ai" => Some(Self::OpenAi),
            "azure" | "azure_openai" => Some(Self::Azure),
            "ollama" => Some(Self::Ollama),
            "custom" => Some(Self::Custom),
            _ => None,
        }
    }
}

impl Default for ProviderKind {
    fn default() -> Self {
        Self::OpenAi
    }
}

/// Main configuration structure for Tagsmith.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Config {
    /// Active provider.
    #[serde(default)]
    pub ai_provider: ProviderKind,

    /// OpenAI credentials and model.
    #[serde(default)]
    pub openai: OpenAiConfig,

    /// Azure OpenAI credentials and deployment.
    #[serde(default)]
    pub azure: AzureConfig,

    /// Ollama endpoint and model.
    #[serde(default)]
    pub ollama: OllamaConfig,

    /// Custom OpenAI-compatible endpoint.
    #[serde(default)]
    pub custom: CustomProviderConfig,

    /// Global token accounting.
    #[serde(default)]
    pub tokens: TokenConfig,

    /// Prompt and tag/field policy.
    #[serde(default)]
    pub analysis: AnalysisConfig,

    /// Document store connection for the thumbnail side channel.
    #[serde(default)]
    pub paperless: PaperlessConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// OpenAI provider configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct OpenAiConfig {
    /// API key; empty means the provider cannot be initialized.
    #[serde(default)]
    pub api_key: String,

    /// Chat-completions base URL.
    #[serde(default = "default_openai_base_url")]
    pub base_url: String,

    /// Model identifier.
    #[serde(default = "default_openai_model")]
    pub model: String,
}

fn default_openai_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_openai_model() -> String {
    "gpt-4o-mini".to_string()
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: default_openai_base_url(),
            model: default_openai_model(),
        }
    }
}

/// Azure OpenAI provider configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct AzureConfig {
    /// API key for the resource.
    #[serde(default)]
    pub api_key: String,

    /// Resource endpoint, e.g. `https://my-resource.openai.azure.com`.
    #[serde(default)]
    pub endpoint: String,

    /// Deployment name (stands in for the model id on Azure).
    #[serde(default)]
    pub deployment: String,

    /// API version query parameter.
    #[serde(default = "default_azure_api_version")]
    pub api_version: String,
}

fn default_azure_api_version() -> String {
    "2024-02-15-preview".to_string()
}

impl Default for AzureConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            endpoint: String::new(),
            deployment: String::new(),
            api_version: default_azure_api_version(),
        }
    }
}

/// Ollama provider configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct OllamaConfig {
    /// Base URL of the local Ollama server.
    #[serde(default = "default_ollama_api_url")]
    pub api_url: String,

    /// Model identifier, e.g. `llama3.1`.
    #[serde(default = "default_ollama_model")]
    pub model: String,
}

fn default_ollama_api_url() -> String {
    "http://localhost:11434".to_string()
}

fn default_ollama_model() -> String {
    "llama3.1".to_string()
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            api_url: default_ollama_api_url(),
            model: default_ollama_model(),
        }
    }
}

/// Custom OpenAI-compatible provider configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct CustomProviderConfig {
    /// API key, passed as a bearer token.
    #[serde(default)]
    pub api_key: String,

    /// Chat-completions base URL.
    #[serde(default)]
    pub base_url: String,

    /// Model identifier.
    #[serde(default)]
    pub model: String,
}

/// Global token accounting configuration.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct TokenConfig {
    /// Context window size shared by prompt, content, and response.
    #[serde(default = "default_token_limit")]
    pub limit: usize,

    /// Tokens reserved for the model's answer.
    #[serde(default = "default_response_tokens")]
    pub response_tokens: usize,
}

const fn default_token_limit() -> usize {
    8192
}

const fn default_response_tokens() -> usize {
    1024
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self {
            limit: default_token_limit(),
            response_tokens: default_response_tokens(),
        }
    }
}

/// Operator-defined custom field in the output schema.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct CustomField {
    /// Field name as configured in the document store.
    pub name: String,

    /// Data type label (string, date, monetary, ...).
    #[serde(default = "default_custom_field_type")]
    pub data_type: String,

    /// Currency code for monetary fields.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
}

fn default_custom_field_type() -> String {
    "string".to_string()
}

/// Prompt and tag/field policy configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct AnalysisConfig {
    /// Base instruction text for the system prompt.
    #[serde(default = "default_system_prompt")]
    pub system_prompt: String,

    /// Offer existing tags/correspondents to the model.
    ///
    /// Master switch: restriction flags below only take effect while this
    /// is enabled.
    #[serde(default)]
    pub use_existing_data: bool,

    /// Restrict suggested tags to the existing tag list.
    #[serde(default)]
    pub restrict_to_existing_tags: bool,

    /// Restrict the suggested correspondent to the existing list.
    #[serde(default)]
    pub restrict_to_existing_correspondents: bool,

    /// Prompt-tags mode: the model matches against a fixed tag list.
    #[serde(default)]
    pub use_prompt_tags: bool,

    /// Fixed candidate tag list for prompt-tags mode.
    #[serde(default)]
    pub prompt_tags: Vec<String>,

    /// Custom fields the model is asked to populate.
    #[serde(default)]
    pub custom_fields: Vec<CustomField>,

    /// Token budget for appended external context data.
    #[serde(default = "default_external_context_budget")]
    pub external_context_budget: usize,
}

fn default_system_prompt() -> String {
    "You are a document classification assistant. Analyze the document \
     content and extract a concise title, the correspondent, a small set of \
     relevant tags, the document date, the document type, and the language. \
     The title and tags must be in the language of the document."
        .to_string()
}

const fn default_external_context_budget() -> usize {
    500
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            system_prompt: default_system_prompt(),
            use_existing_data: false,
            restrict_to_existing_tags: false,
            restrict_to_existing_correspondents: false,
            use_prompt_tags: false,
            prompt_tags: vec![],
            custom_fields: vec![],
            external_context_budget: default_external_context_budget(),
        }
    }
}

/// Document store connection configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct PaperlessConfig {
    /// Paperless API base URL, e.g. `http://localhost:8000/api`.
    #[serde(default)]
    pub api_url: String,

    /// API token for the `Authorization` header.
    #[serde(default)]
    pub api_token: String,

    /// Directory where fetched thumbnails are cached.
    #[serde(default = "default_thumbnail_cache_dir")]
    pub thumbnail_cache_dir: String,
}

fn default_thumbnail_cache_dir() -> String {
    ".tagsmith/thumbnails".to_string()
}

impl Default for PaperlessConfig {
    fn default() -> Self {
        Self {
            api_url: String::new(),
            api_token: String::new(),
            thumbnail_cache_dir: default_thumbnail_cache_dir(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format: json or pretty.
    #[serde(default = "default_log_format")]
    pub format: String,

    /// Optional directory for daily-rotated log files.
    #[serde(default)]
    pub log_dir: Option<String>,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            log_dir: None,
        }
    }
}
