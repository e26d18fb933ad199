//! Completion parsing and contract validation.
//!
//! Models routinely wrap their JSON answer in fenced code blocks; the
//! parser strips those, parses the remainder, and enforces the minimal
//! structural contract before anything flows upstream. Malformed JSON and a
//! structurally invalid payload are the same condition: callers never see
//! half-parsed data.

use serde_json::Value;

use crate::domain::errors::{AnalysisError, AnalysisResult};
use crate::domain::models::DocumentSuggestions;

/// Strip fenced code-block markers (language-tagged or bare) around the
/// payload.
fn strip_code_fences(raw: &str) -> String {
    raw.replace("```json", "").replace("```", "").trim().to_string()
}

/// Parse a raw completion into validated document suggestions.
///
/// The contract requires `tags` to be an array and `correspondent` to be a
/// string or null; absence of either field is a violation, not a
/// best-effort fallback.
pub fn parse(raw: &str) -> AnalysisResult<DocumentSuggestions> {
    let cleaned = strip_code_fences(raw);

    let value: Value = serde_json::from_str(&cleaned)
        .map_err(|e| AnalysisError::InvalidResponse(format!("malformed JSON: {e}")))?;

    let object = value
        .as_object()
        .ok_or_else(|| AnalysisError::InvalidResponse("payload is not a JSON object".to_string()))?;

    match object.get("tags") {
        Some(Value::Array(_)) => {}
        Some(_) => {
            return Err(AnalysisError::InvalidResponse(
                "tags is not an array".to_string(),
            ))
        }
        None => {
            return Err(AnalysisError::InvalidResponse(
                "missing tags array".to_string(),
            ))
        }
    }

    match object.get("correspondent") {
        Some(Value::String(_) | Value::Null) => {}
        Some(_) => {
            return Err(AnalysisError::InvalidResponse(
                "correspondent is not a string".to_string(),
            ))
        }
        None => {
            return Err(AnalysisError::InvalidResponse(
                "missing correspondent".to_string(),
            ))
        }
    }

    serde_json::from_value(value)
        .map_err(|e| AnalysisError::InvalidResponse(format!("invalid payload: {e}")))
}
