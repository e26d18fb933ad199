//! Tagsmith - AI-assisted document classification for Paperless-ngx
//!
//! Tagsmith sends OCR'd document text to a configurable completion provider
//! (OpenAI, Azure OpenAI, Ollama, or any OpenAI-compatible endpoint) and
//! validates the structured metadata it returns: tags, correspondent, title,
//! date, type, language, and operator-defined custom fields.
//!
//! # Architecture
//!
//! This crate follows Clean Architecture / Hexagonal Architecture principles:
//!
//! - **Domain Layer** (`domain`): Models, errors, and the provider port
//! - **Service Layer** (`services`): Token accounting, prompt composition,
//!   response validation, and the analysis orchestrator
//! - **Adapter Layer** (`adapters`): Provider backends and the Paperless client
//! - **Infrastructure Layer** (`infrastructure`): Configuration and logging
//! - **CLI Layer** (`cli`): Command-line interface
//!
//! # Example
//!
//! ```ignore
//! use tagsmith::adapters::providers::ProviderRegistry;
//! use tagsmith::domain::models::AnalysisRequest;
//! use tagsmith::infrastructure::config::ConfigLoader;
//! use tagsmith::services::DocumentAnalyzer;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = ConfigLoader::load()?;
//!     let provider = ProviderRegistry::create(&config)?;
//!     let analyzer = DocumentAnalyzer::new(provider, &config);
//!     let outcome = analyzer.analyze(AnalysisRequest::new("document text")).await;
//!     println!("{}", serde_json::to_string_pretty(&outcome)?);
//!     Ok(())
//! }
//! ```

pub mod adapters;
pub mod cli;
pub mod domain;
pub mod infrastructure;
pub mod services;

// Re-export commonly used types for convenience
pub use adapters::providers::ProviderRegistry;
pub use domain::errors::{AnalysisError, AnalysisResult};
pub use domain::models::{
    AnalysisOutcome, AnalysisRequest, Config, DocumentSuggestions, ProviderKind, TagRef,
    UsageMetrics,
};
pub use domain::ports::Provider;
pub use infrastructure::config::{ConfigError, ConfigLoader};
pub use services::{DocumentAnalyzer, PromptComposer};
