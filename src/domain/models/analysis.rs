//! Analysis request/response models.
//!
//! Everything here is transient: a request is built per document, the
//! composed prompt and token budget are recomputed on every call, and the
//! outcome is handed to the caller and forgotten.

use serde::{Deserialize, Serialize};

use crate::domain::errors::{AnalysisError, AnalysisResult};

/// Reference to an existing tag in the document store.
///
/// Paperless tag objects carry more fields (color, matching rules); only the
/// name participates in prompt composition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TagRef {
    /// Tag display name.
    pub name: String,
}

impl TagRef {
    /// Create a tag reference by name.
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// Per-document analysis request.
#[derive(Debug, Clone, Default)]
pub struct AnalysisRequest {
    /// Document store id, used only for the thumbnail cache side channel.
    pub document_id: Option<u64>,
    /// Plain document text (OCR already applied upstream).
    pub content: String,
    /// Existing tags offered as context or as a restriction candidate list.
    pub existing_tags: Vec<TagRef>,
    /// Existing correspondent names.
    pub existing_correspondents: Vec<String>,
    /// Replacement instruction prose, e.g. injected by a webhook trigger.
    pub override_prompt: Option<String>,
    /// Arbitrary structured context from an external API.
    pub external_context: Option<serde_json::Value>,
}

impl AnalysisRequest {
    /// Create a request for the given document text.
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ..Default::default()
        }
    }

    /// Attach the document store id for thumbnail caching.
    pub fn with_document_id(mut self, id: u64) -> Self {
        self.document_id = Some(id);
        self
    }

    /// Attach the existing tag list.
    pub fn with_existing_tags(mut self, tags: Vec<TagRef>) -> Self {
        self.existing_tags = tags;
        self
    }

    /// Attach the existing correspondent list.
    pub fn with_existing_correspondents(mut self, correspondents: Vec<String>) -> Self {
        self.existing_correspondents = correspondents;
        self
    }

    /// Replace the instructional prose with a caller-supplied prompt.
    pub fn with_override_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.override_prompt = Some(prompt.into());
        self
    }

    /// Attach external context data to be appended to the prompt.
    pub fn with_external_context(mut self, context: serde_json::Value) -> Self {
        self.external_context = Some(context);
        self
    }
}

/// Token accounting for one analysis call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenBudget {
    /// Configured context window size.
    pub max_context_tokens: usize,
    /// Tokens held back for the model's answer.
    pub reserved_response_tokens: usize,
    /// Estimated cost of the composed prompt (all fragments).
    pub prompt_tokens: usize,
}

impl TokenBudget {
    /// Tokens left for document content.
    ///
    /// Exhaustion is a hard error, never a silent clamp to zero: it signals
    /// that prompt overhead alone exceeds the configured limit.
    pub fn available(&self) -> AnalysisResult<usize> {
        let reserved = self.prompt_tokens + self.reserved_response_tokens;
        if reserved >= self.max_context_tokens {
            Err(AnalysisError::BudgetExceeded {
                reserved,
                max: self.max_context_tokens,
            })
        } else {
            Ok(self.max_context_tokens - reserved)
        }
    }
}

/// A fully assembled system prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComposedPrompt {
    /// The system prompt text sent to the provider.
    pub system_prompt: String,
    /// Fixed candidate tag list, present only in prompt-tags mode.
    ///
    /// When set, the free-form tag instructions have been replaced by a
    /// match-from-list instruction and this fragment is billed separately.
    pub prompt_tags: Option<String>,
}

impl ComposedPrompt {
    /// All billable prompt fragments, main prompt first.
    pub fn fragments(&self) -> Vec<&str> {
        let mut fragments = vec![self.system_prompt.as_str()];
        if let Some(tags) = &self.prompt_tags {
            fragments.push(tags.as_str());
        }
        fragments
    }
}

/// Token usage reported by (or estimated for) a provider call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageMetrics {
    /// Tokens consumed by the prompt.
    pub prompt_tokens: u64,
    /// Tokens in the completion.
    pub completion_tokens: u64,
    /// Prompt plus completion.
    pub total_tokens: u64,
}

/// Structured metadata suggestions extracted from the completion.
///
/// `tags` and `correspondent` are the mandatory part of the validated
/// contract; everything else is best effort.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentSuggestions {
    /// Suggested tags, possibly restricted to an existing candidate list.
    #[serde(default)]
    pub tags: Vec<String>,
    /// Suggested correspondent, if the model found one.
    pub correspondent: Option<String>,
    /// Suggested document title.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Document date as written in the document (YYYY-MM-DD).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document_date: Option<String>,
    /// Document type, e.g. invoice or contract.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document_type: Option<String>,
    /// Document language code (en/de/es/...).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    /// Operator-defined custom field values keyed by schema position.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_fields: Option<serde_json::Value>,
}

impl DocumentSuggestions {
    /// The well-formed empty result returned when an analysis fails.
    pub fn empty() -> Self {
        Self::default()
    }
}

/// Result of one `analyze` call, including usage metrics.
///
/// This shape never carries an `Err`: failed analyses produce an empty
/// suggestion set with `error` populated so batch processing continues.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisOutcome {
    /// Extracted metadata, empty on failure.
    pub suggestions: DocumentSuggestions,
    /// Usage metrics, absent when the provider was never reached.
    pub metrics: Option<UsageMetrics>,
    /// True iff the document text was shortened to fit the budget.
    pub truncated: bool,
    /// Human-readable failure message, if the analysis failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AnalysisOutcome {
    /// Successful outcome.
    pub fn success(
        suggestions: DocumentSuggestions,
        metrics: UsageMetrics,
        truncated: bool,
    ) -> Self {
        Self {
            suggestions,
            metrics: Some(metrics),
            truncated,
            error: None,
        }
    }

    /// Empty outcome annotated with the failure message.
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            suggestions: DocumentSuggestions::empty(),
            metrics: None,
            truncated: false,
            error: Some(error.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_budget_available() {
        let budget = TokenBudget {
            max_context_tokens: 1000,
            reserved_response_tokens: 200,
            prompt_tokens: 150,
        };
        assert_eq!(budget.available().unwrap(), 650);
    }

    #[test]
    fn test_budget_exhausted_is_error() {
        let budget = TokenBudget {
            max_context_tokens: 1000,
            reserved_response_tokens: 900,
            prompt_tokens: 150,
        };
        let err = budget.available().unwrap_err();
        assert!(matches!(
            err,
            AnalysisError::BudgetExceeded {
                reserved: 1050,
                max: 1000
            }
        ));
    }

    #[test]
    fn test_budget_exactly_full_is_error() {
        // reserved == max leaves zero tokens for content, which must fail
        let budget = TokenBudget {
            max_context_tokens: 1000,
            reserved_response_tokens: 850,
            prompt_tokens: 150,
        };
        assert!(budget.available().is_err());
    }

    #[test]
    fn test_composed_prompt_fragments() {
        let prompt = ComposedPrompt {
            system_prompt: "main".to_string(),
            prompt_tags: Some("Invoice, Receipt".to_string()),
        };
        assert_eq!(prompt.fragments(), vec!["main", "Invoice, Receipt"]);

        let plain = ComposedPrompt {
            system_prompt: "main".to_string(),
            prompt_tags: None,
        };
        assert_eq!(plain.fragments(), vec!["main"]);
    }

    #[test]
    fn test_failed_outcome_shape() {
        let outcome = AnalysisOutcome::failed("boom");
        assert!(outcome.suggestions.tags.is_empty());
        assert!(outcome.suggestions.correspondent.is_none());
        assert!(outcome.metrics.is_none());
        assert!(!outcome.truncated);
        assert_eq!(outcome.error.as_deref(), Some("boom"));
    }

    #[test]
    fn test_suggestions_deserialize_minimal() {
        let suggestions: DocumentSuggestions =
            serde_json::from_str(r#"{"tags":["a"],"correspondent":"X"}"#).unwrap();
        assert_eq!(suggestions.tags, vec!["a"]);
        assert_eq!(suggestions.correspondent.as_deref(), Some("X"));
        assert!(suggestions.title.is_none());
    }

    #[test]
    fn test_request_builder() {
        let request = AnalysisRequest::new("text")
            .with_document_id(42)
            .with_existing_tags(vec![TagRef::new("Invoice")])
            .with_existing_correspondents(vec!["Acme".to_string()])
            .with_override_prompt("do it differently");
        assert_eq!(request.document_id, Some(42));
        assert_eq!(request.existing_tags[0].name, "Invoice");
        assert_eq!(request.existing_correspondents, vec!["Acme"]);
        assert!(request.override_prompt.is_some());
        assert!(request.external_context.is_none());
    }
}
