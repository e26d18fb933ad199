//! Token estimation across provider tokenization schemes.
//!
//! Uses tiktoken encoders for model families with a known vocabulary and a
//! conservative chars-per-token heuristic for everything else (local model
//! ids in particular). Budget computation must never under-count, so the
//! heuristic rounds up.

use std::sync::OnceLock;

use tiktoken_rs::CoreBPE;

/// Approximate characters per token for the heuristic fallback.
pub const CHARS_PER_TOKEN: usize = 4;

/// Tokenization scheme selected for a model id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scheme {
    /// o200k_base: gpt-4o and the o-series reasoning family.
    O200k,
    /// cl100k_base: gpt-4, gpt-3.5 and embedding models.
    Cl100k,
    /// chars/4 heuristic for unknown and local model ids.
    Heuristic,
}

fn scheme_for_model(model: &str) -> Scheme {
    let m = model.to_lowercase();
    if m.starts_with("gpt-4o")
        || m.starts_with("gpt-4.1")
        || m.starts_with("o1")
        || m.starts_with("o3")
        || m.starts_with("o4")
    {
        Scheme::O200k
    } else if m.starts_with("gpt-4") || m.starts_with("gpt-3.5") || m.contains("embedding") {
        Scheme::Cl100k
    } else {
        Scheme::Heuristic
    }
}

fn o200k() -> Option<&'static CoreBPE> {
    static ENCODER: OnceLock<Option<CoreBPE>> = OnceLock::new();
    ENCODER
        .get_or_init(|| tiktoken_rs::o200k_base().ok())
        .as_ref()
}

fn cl100k() -> Option<&'static CoreBPE> {
    static ENCODER: OnceLock<Option<CoreBPE>> = OnceLock::new();
    ENCODER
        .get_or_init(|| tiktoken_rs::cl100k_base().ok())
        .as_ref()
}

/// Conservative chars/4 estimate, rounded up.
pub fn heuristic_estimate(text: &str) -> usize {
    text.chars().count().div_ceil(CHARS_PER_TOKEN)
}

/// Estimate the token count of `text` under `model`'s tokenization scheme.
///
/// Deterministic for a given (text, model) pair. When no exact tokenizer is
/// known for the model id, falls back to the heuristic rather than failing:
/// classification tolerates estimate error, budget math does not tolerate a
/// hard stop.
pub fn estimate(text: &str, model: &str) -> usize {
    if text.is_empty() {
        return 0;
    }
    let encoder = match scheme_for_model(model) {
        Scheme::O200k => o200k(),
        Scheme::Cl100k => cl100k(),
        Scheme::Heuristic => None,
    };
    encoder.map_or_else(
        || heuristic_estimate(text),
        |bpe| bpe.encode_with_special_tokens(text).len(),
    )
}

/// Total token cost of a composed prompt: every fragment billed separately.
pub fn estimate_fragments<'a>(fragments: impl IntoIterator<Item = &'a str>, model: &str) -> usize {
    fragments.into_iter().map(|f| estimate(f, model)).sum()
}
