//! Analysis services: token accounting, prompt composition, response
//! validation, and the orchestrator tying them together.

pub mod analyzer;
pub mod prompt;
pub mod response;
pub mod tokens;
pub mod truncation;

pub use analyzer::DocumentAnalyzer;
pub use prompt::PromptComposer;
