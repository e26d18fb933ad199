//! System prompt composition.
//!
//! Assembles the final prompt from conditionally included fragments in a
//! fixed order: instructional prose, restriction clauses, external context,
//! and the mandatory output-schema footer. Only document content is ever
//! truncated to fit the token budget; the prompt itself never is.

use std::borrow::Cow;

use serde_json::json;
use tracing::{debug, warn};

use crate::domain::models::{AnalysisConfig, AnalysisRequest, ComposedPrompt, CustomField};
use crate::services::{tokens, truncation};

/// Placeholder substituted with the custom-fields schema template.
const CUSTOM_FIELDS_PLACEHOLDER: &str = "%CUSTOMFIELDS%";

/// Mandatory output contract appended to every prompt, override or not.
const MUST_HAVE_PROMPT: &str = r#"Return the result EXCLUSIVELY as a JSON object. The title and tags MUST be in the language that is used in the document:
{
  "title": "xxxxx",
  "correspondent": "xxxxxxxx",
  "tags": ["Tag1", "Tag2", "Tag3", "Tag4"],
  "document_date": "YYYY-MM-DD",
  "document_type": "Invoice/Contract/...",
  "language": "en/de/es/...",
  %CUSTOMFIELDS%
}"#;

/// Replacement tag instruction used in prompt-tags mode.
const MATCH_FROM_LIST_PROMPT: &str = "Take the tags from the provided list and match one or \
     more of them to the document content. You MUST NOT invent tags that are not in the list.";

/// Delimiter heading for validated external context data.
const EXTERNAL_CONTEXT_HEADING: &str = "Additional context from external API:";

/// Composes system prompts from operator policy and per-document context.
///
/// Stateless apart from the immutable policy configuration; safe to share
/// across concurrent analyses.
#[derive(Debug, Clone)]
pub struct PromptComposer {
    config: AnalysisConfig,
}

impl PromptComposer {
    /// Create a composer over the operator's analysis policy.
    pub const fn new(config: AnalysisConfig) -> Self {
        Self { config }
    }

    /// Whether prompt-tags mode is in effect.
    ///
    /// The flag without a candidate list would produce an empty match
    /// instruction, so both are required.
    fn prompt_tags_active(&self) -> bool {
        self.config.use_prompt_tags && !self.config.prompt_tags.is_empty()
    }

    /// Assemble the system prompt for one analysis request.
    ///
    /// `model` is needed to budget-check external context data.
    pub fn compose(&self, request: &AnalysisRequest, model: &str) -> ComposedPrompt {
        let footer = MUST_HAVE_PROMPT.replace(
            CUSTOM_FIELDS_PLACEHOLDER,
            &render_custom_fields(&self.config.custom_fields),
        );

        let mut prompt_tags = None;
        let mut sections: Vec<String> = Vec::new();

        if let Some(override_prompt) = &request.override_prompt {
            // A webhook-injected prompt replaces all instructional prose.
            // The output contract footer is appended below regardless.
            debug!("Replacing system prompt with caller-supplied override");
            sections.push(override_prompt.clone());
        } else if self.prompt_tags_active() {
            // Fixed-list matching replaces the free-form tag instructions;
            // the list itself travels as a separate billable fragment.
            sections.push(MATCH_FROM_LIST_PROMPT.to_string());
            prompt_tags = Some(self.config.prompt_tags.join(", "));
            if let Some(clause) = self.correspondent_restriction(request) {
                sections.push(clause);
            }
            if let Some(context) = self.external_context_section(request, model) {
                sections.push(context);
            }
        } else {
            if self.existing_data_as_context() {
                sections.push(format!(
                    "Existing tags: {}\n\nExisting correspondents: {}",
                    join_tag_names(request),
                    request.existing_correspondents.join(", "),
                ));
            }
            sections.push(self.config.system_prompt.clone());
            if let Some(clause) = self.tag_restriction(request) {
                sections.push(clause);
            }
            if let Some(clause) = self.correspondent_restriction(request) {
                sections.push(clause);
            }
            if let Some(context) = self.external_context_section(request, model) {
                sections.push(context);
            }
        }

        sections.push(footer);

        ComposedPrompt {
            system_prompt: sections.join("\n\n"),
            prompt_tags,
        }
    }

    /// Existing data is offered as informational context only when no
    /// restriction flag narrows the output.
    fn existing_data_as_context(&self) -> bool {
        self.config.use_existing_data
            && !self.config.restrict_to_existing_tags
            && !self.config.restrict_to_existing_correspondents
    }

    /// Hard tag-restriction clause.
    ///
    /// Takes effect only while `use_existing_data` is also enabled; the
    /// coupling is operator-visible behavior and flagged for product
    /// confirmation, but implemented as configured.
    fn tag_restriction(&self, request: &AnalysisRequest) -> Option<String> {
        if !(self.config.use_existing_data && self.config.restrict_to_existing_tags) {
            return None;
        }
        let list = join_tag_names(request);
        if list.trim().is_empty() {
            warn!("Tag restriction enabled but no existing tags provided");
            Some(
                "IMPORTANT: No existing tags available for restriction. \
                 Please provide minimal, relevant tags."
                    .to_string(),
            )
        } else {
            Some(format!(
                "IMPORTANT: You MUST ONLY use tags from this list: {list}. \
                 Do not suggest any tags that are not in this list."
            ))
        }
    }

    /// Hard correspondent-restriction clause, same coupling as tags.
    fn correspondent_restriction(&self, request: &AnalysisRequest) -> Option<String> {
        if !(self.config.use_existing_data && self.config.restrict_to_existing_correspondents) {
            return None;
        }
        let list = request.existing_correspondents.join(", ");
        if list.trim().is_empty() {
            warn!("Correspondent restriction enabled but no existing correspondents provided");
            Some(
                "IMPORTANT: No existing correspondents available for restriction. \
                 Leave the correspondent empty or use a generic value."
                    .to_string(),
            )
        } else {
            Some(format!(
                "IMPORTANT: You MUST ONLY use correspondents from this list: {list}. \
                 Do not suggest any correspondent that is not in this list."
            ))
        }
    }

    /// Validated and budget-checked external context section.
    fn external_context_section(&self, request: &AnalysisRequest, model: &str) -> Option<String> {
        let data = request.external_context.as_ref()?;
        match validate_external_context(data, self.config.external_context_budget, model) {
            Some(validated) => {
                debug!("External context data validated and included");
                Some(format!("{EXTERNAL_CONTEXT_HEADING}\n{validated}"))
            }
            None => {
                // Non-fatal: composition proceeds without the section.
                warn!("External context data validation failed, omitting section");
                None
            }
        }
    }
}

fn join_tag_names(request: &AnalysisRequest) -> String {
    request
        .existing_tags
        .iter()
        .map(|tag| tag.name.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Render the custom-fields schema template injected into the footer.
///
/// Zero configured fields produce an empty `custom_fields` object so the
/// contract shape stays stable.
fn render_custom_fields(fields: &[CustomField]) -> String {
    let mut template = serde_json::Map::new();
    for (index, field) in fields.iter().enumerate() {
        template.insert(
            index.to_string(),
            json!({
                "field_name": field.name,
                "value": "Fill in the value based on your analysis",
            }),
        );
    }
    let rendered = serde_json::to_string_pretty(&serde_json::Value::Object(template))
        .unwrap_or_else(|_| "{}".to_string());
    format!("\"custom_fields\": {rendered}")
}

/// Serialize, budget-check, and truncate external context data.
///
/// Returns `None` on any internal error so prompt composition can proceed
/// without the section.
pub fn validate_external_context(
    data: &serde_json::Value,
    max_tokens: usize,
    model: &str,
) -> Option<String> {
    let rendered = match data {
        serde_json::Value::String(s) => s.clone(),
        other => serde_json::to_string_pretty(other).ok()?,
    };

    let cost = tokens::estimate(&rendered, model);
    if cost > max_tokens {
        warn!(
            cost,
            max_tokens, "External context data exceeds budget, truncating"
        );
        return truncation::truncate(&rendered, max_tokens, model)
            .ok()
            .map(Cow::into_owned);
    }

    debug!(cost, "External context data validated");
    Some(rendered)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::TagRef;

    const MODEL: &str = "gpt-4o-mini";

    fn base_config() -> AnalysisConfig {
        AnalysisConfig {
            system_prompt: "Analyze the document.".to_string(),
            ..Default::default()
        }
    }

    fn request_with_lists() -> AnalysisRequest {
        AnalysisRequest::new("doc text")
            .with_existing_tags(vec![TagRef::new("Invoice"), TagRef::new("Tax")])
            .with_existing_correspondents(vec!["Acme GmbH".to_string(), "City Hall".to_string()])
    }

    #[test]
    fn test_footer_always_present() {
        let composer = PromptComposer::new(base_config());
        let prompt = composer.compose(&AnalysisRequest::new("x"), MODEL);
        assert!(prompt.system_prompt.contains("EXCLUSIVELY as a JSON object"));
        assert!(prompt.system_prompt.contains("\"custom_fields\": {}"));
    }

    #[test]
    fn test_footer_survives_override_prompt() {
        let composer = PromptComposer::new(base_config());
        let request = AnalysisRequest::new("x").with_override_prompt("Use my rules instead.");
        let prompt = composer.compose(&request, MODEL);
        assert!(prompt.system_prompt.starts_with("Use my rules instead."));
        assert!(prompt.system_prompt.contains("EXCLUSIVELY as a JSON object"));
        // the configured base prompt is fully replaced
        assert!(!prompt.system_prompt.contains("Analyze the document."));
    }

    #[test]
    fn test_custom_fields_template_injected() {
        let mut config = base_config();
        config.custom_fields = vec![
            CustomField {
                name: "invoice_total".to_string(),
                data_type: "monetary".to_string(),
                currency: Some("EUR".to_string()),
            },
            CustomField {
                name: "iban".to_string(),
                data_type: "string".to_string(),
                currency: None,
            },
        ];
        let composer = PromptComposer::new(config);
        let prompt = composer.compose(&AnalysisRequest::new("x"), MODEL);
        assert!(prompt.system_prompt.contains("invoice_total"));
        assert!(prompt.system_prompt.contains("iban"));
        assert!(!prompt.system_prompt.contains(CUSTOM_FIELDS_PLACEHOLDER));
    }

    #[test]
    fn test_existing_data_listed_as_context_when_unrestricted() {
        let mut config = base_config();
        config.use_existing_data = true;
        let composer = PromptComposer::new(config);
        let prompt = composer.compose(&request_with_lists(), MODEL);
        assert!(prompt.system_prompt.contains("Existing tags: Invoice, Tax"));
        assert!(prompt
            .system_prompt
            .contains("Existing correspondents: Acme GmbH, City Hall"));
        assert!(!prompt.system_prompt.contains("MUST ONLY"));
    }

    #[test]
    fn test_tag_restriction_clause() {
        let mut config = base_config();
        config.use_existing_data = true;
        config.restrict_to_existing_tags = true;
        let composer = PromptComposer::new(config);
        let prompt = composer.compose(&request_with_lists(), MODEL);
        assert!(prompt
            .system_prompt
            .contains("MUST ONLY use tags from this list: Invoice, Tax"));
        // restricted mode never lists data as loose context
        assert!(!prompt.system_prompt.contains("Existing tags:"));
    }

    #[test]
    fn test_restriction_without_master_flag_is_inert() {
        let mut config = base_config();
        config.restrict_to_existing_tags = true;
        config.restrict_to_existing_correspondents = true;
        let composer = PromptComposer::new(config);
        let prompt = composer.compose(&request_with_lists(), MODEL);
        assert!(!prompt.system_prompt.contains("MUST ONLY"));
    }

    #[test]
    fn test_empty_candidate_list_gets_fallback_clause() {
        let mut config = base_config();
        config.use_existing_data = true;
        config.restrict_to_existing_tags = true;
        let composer = PromptComposer::new(config);
        let prompt = composer.compose(&AnalysisRequest::new("x"), MODEL);
        assert!(prompt
            .system_prompt
            .contains("No existing tags available for restriction"));
        assert!(!prompt.system_prompt.contains("tags from this list:"));
    }

    #[test]
    fn test_correspondent_fallback_clause() {
        let mut config = base_config();
        config.use_existing_data = true;
        config.restrict_to_existing_correspondents = true;
        let composer = PromptComposer::new(config);
        let prompt = composer.compose(&AnalysisRequest::new("x"), MODEL);
        assert!(prompt
            .system_prompt
            .contains("No existing correspondents available for restriction"));
    }

    #[test]
    fn test_prompt_tags_mode_overrides_free_form() {
        let mut config = base_config();
        config.use_prompt_tags = true;
        config.prompt_tags = vec!["Invoice".to_string(), "Receipt".to_string()];
        let composer = PromptComposer::new(config);
        let prompt = composer.compose(&request_with_lists(), MODEL);
        assert!(prompt.system_prompt.contains("match one or"));
        assert!(!prompt.system_prompt.contains("Analyze the document."));
        assert_eq!(prompt.prompt_tags.as_deref(), Some("Invoice, Receipt"));
        // the contract footer still closes the prompt
        assert!(prompt.system_prompt.contains("EXCLUSIVELY as a JSON object"));
    }

    #[test]
    fn test_prompt_tags_flag_without_list_is_inactive() {
        let mut config = base_config();
        config.use_prompt_tags = true;
        let composer = PromptComposer::new(config);
        let prompt = composer.compose(&request_with_lists(), MODEL);
        assert!(prompt.prompt_tags.is_none());
        assert!(prompt.system_prompt.contains("Analyze the document."));
    }

    #[test]
    fn test_external_context_appended() {
        let composer = PromptComposer::new(base_config());
        let request = AnalysisRequest::new("x")
            .with_external_context(json!({"order_id": 42, "customer": "Acme"}));
        let prompt = composer.compose(&request, MODEL);
        assert!(prompt.system_prompt.contains(EXTERNAL_CONTEXT_HEADING));
        assert!(prompt.system_prompt.contains("order_id"));
    }

    #[test]
    fn test_external_context_truncated_to_budget() {
        let mut config = base_config();
        config.external_context_budget = 10;
        let composer = PromptComposer::new(config);
        let big = json!({ "history": "entry ".repeat(500) });
        let request = AnalysisRequest::new("x").with_external_context(big);
        let prompt = composer.compose(&request, "local-model");
        // still included, but shortened
        assert!(prompt.system_prompt.contains(EXTERNAL_CONTEXT_HEADING));
        let section = prompt
            .system_prompt
            .split(EXTERNAL_CONTEXT_HEADING)
            .nth(1)
            .unwrap();
        let body = section.split("\n\n").next().unwrap();
        assert!(tokens::estimate(body, "local-model") <= 11);
    }

    #[test]
    fn test_section_order_is_fixed() {
        let mut config = base_config();
        config.use_existing_data = true;
        config.restrict_to_existing_tags = true;
        let composer = PromptComposer::new(config);
        let request = request_with_lists().with_external_context(json!("invoice context"));
        let prompt = composer.compose(&request, MODEL).system_prompt;

        let base = prompt.find("Analyze the document.").unwrap();
        let restriction = prompt.find("MUST ONLY use tags").unwrap();
        let external = prompt.find(EXTERNAL_CONTEXT_HEADING).unwrap();
        let footer = prompt.find("EXCLUSIVELY as a JSON object").unwrap();
        assert!(base < restriction);
        assert!(restriction < external);
        assert!(external < footer);
    }

    #[test]
    fn test_validate_external_context_string_passthrough() {
        let value = json!("plain context string");
        let validated = validate_external_context(&value, 500, MODEL).unwrap();
        assert_eq!(validated, "plain context string");
    }
}
