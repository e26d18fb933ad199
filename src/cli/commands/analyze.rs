//! Implementation of the `tagsmith analyze` command.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use tokio::fs;

use crate::adapters::providers::ProviderRegistry;
use crate::cli::output::{output, CommandOutput};
use crate::domain::models::{AnalysisOutcome, AnalysisRequest, Config, TagRef};
use crate::services::DocumentAnalyzer;

/// Arguments for `tagsmith analyze`.
#[derive(Args, Debug)]
pub struct AnalyzeArgs {
    /// Path to the document text (OCR output)
    pub file: PathBuf,

    /// Paperless document id, enables thumbnail caching
    #[arg(long)]
    pub id: Option<u64>,

    /// Replace the configured system prompt for this run
    #[arg(long)]
    pub prompt: Option<String>,

    /// Existing tag names offered as context or restriction candidates
    #[arg(long, value_delimiter = ',')]
    pub tags: Vec<String>,

    /// Existing correspondent names
    #[arg(long, value_delimiter = ',')]
    pub correspondents: Vec<String>,

    /// JSON file with external context to append to the prompt
    #[arg(long)]
    pub context_file: Option<PathBuf>,
}

#[derive(Debug, serde::Serialize)]
struct AnalyzeOutput {
    success: bool,
    #[serde(flatten)]
    outcome: AnalysisOutcome,
}

impl CommandOutput for AnalyzeOutput {
    fn to_human(&self) -> String {
        if let Some(error) = &self.outcome.error {
            return format!("Analysis failed: {error}");
        }

        let suggestions = &self.outcome.suggestions;
        let mut lines = Vec::new();
        if let Some(title) = &suggestions.title {
            lines.push(format!("Title:         {title}"));
        }
        lines.push(format!(
            "Correspondent: {}",
            suggestions.correspondent.as_deref().unwrap_or("-")
        ));
        lines.push(format!("Tags:          {}", suggestions.tags.join(", ")));
        if let Some(date) = &suggestions.document_date {
            lines.push(format!("Date:          {date}"));
        }
        if let Some(doc_type) = &suggestions.document_type {
            lines.push(format!("Type:          {doc_type}"));
        }
        if let Some(language) = &suggestions.language {
            lines.push(format!("Language:      {language}"));
        }
        if let Some(fields) = &suggestions.custom_fields {
            lines.push(format!(
                "Custom fields: {}",
                serde_json::to_string(fields).unwrap_or_default()
            ));
        }
        if self.outcome.truncated {
            lines.push("Note: document text was truncated to fit the token budget".to_string());
        }
        if let Some(metrics) = &self.outcome.metrics {
            lines.push(format!(
                "Tokens:        {} prompt + {} completion = {}",
                metrics.prompt_tokens, metrics.completion_tokens, metrics.total_tokens
            ));
        }
        lines.join("\n")
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

/// Run one analysis and print the outcome.
pub async fn execute(args: AnalyzeArgs, config: &Config, json_mode: bool) -> Result<()> {
    let content = fs::read_to_string(&args.file)
        .await
        .with_context(|| format!("Failed to read document {}", args.file.display()))?;

    let mut request = AnalysisRequest::new(content)
        .with_existing_tags(args.tags.into_iter().map(TagRef::new).collect())
        .with_existing_correspondents(args.correspondents);
    if let Some(id) = args.id {
        request = request.with_document_id(id);
    }
    if let Some(prompt) = args.prompt {
        request = request.with_override_prompt(prompt);
    }
    if let Some(path) = args.context_file {
        let raw = fs::read_to_string(&path)
            .await
            .with_context(|| format!("Failed to read context file {}", path.display()))?;
        let context: serde_json::Value =
            serde_json::from_str(&raw).context("Context file is not valid JSON")?;
        request = request.with_external_context(context);
    }

    let provider = ProviderRegistry::create(config)?;
    let analyzer = DocumentAnalyzer::new(provider, config);
    let outcome = analyzer.analyze(request).await;

    let output_data = AnalyzeOutput {
        success: outcome.error.is_none(),
        outcome,
    };
    output(&output_data, json_mode);
    Ok(())
}
