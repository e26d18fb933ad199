//! Content truncation under a token budget.
//!
//! Always returns a prefix of the input, never an excerpt, so the start of
//! the document (letterhead, subject, date) survives. Prompt text is never
//! truncated; only document content passes through here.

use std::borrow::Cow;

use crate::domain::errors::{AnalysisError, AnalysisResult};
use crate::services::tokens;

/// Truncate `text` so that its estimated token count fits `max_tokens`.
///
/// Returns the input unchanged (borrowed) when it already fits. A zero
/// budget is a capacity error, not an empty string: it means prompt overhead
/// alone exceeds the configured limit and the operator must be told.
pub fn truncate<'a>(text: &'a str, max_tokens: usize, model: &str) -> AnalysisResult<Cow<'a, str>> {
    if max_tokens == 0 {
        return Err(AnalysisError::BudgetExceeded {
            reserved: tokens::estimate(text, model).max(1),
            max: 0,
        });
    }
    if tokens::estimate(text, model) <= max_tokens {
        return Ok(Cow::Borrowed(text));
    }

    // Binary search the longest char-boundary prefix that fits. The
    // estimator is monotonic over prefixes, so the search invariant holds:
    // lo always fits (the empty prefix costs 0), hi never does.
    let starts: Vec<usize> = text.char_indices().map(|(i, _)| i).collect();
    let char_count = starts.len();
    let end_of = |chars: usize| {
        if chars < char_count {
            starts[chars]
        } else {
            text.len()
        }
    };

    let mut lo = 0;
    let mut hi = char_count;
    while hi - lo > 1 {
        let mid = lo + (hi - lo) / 2;
        if tokens::estimate(&text[..end_of(mid)], model) <= max_tokens {
            lo = mid;
        } else {
            hi = mid;
        }
    }

    // Walk down if a BPE merge boundary made the candidate overshoot.
    let mut keep = lo;
    while keep > 0 && tokens::estimate(&text[..end_of(keep)], model) > max_tokens {
        keep -= 1;
    }

    Ok(Cow::Owned(text[..end_of(keep)].to_string()))
}
