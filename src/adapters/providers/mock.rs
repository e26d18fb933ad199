//! Mock provider for deterministic testing.

use std::sync::Mutex;

use async_trait::async_trait;

use crate::domain::errors::{AnalysisError, AnalysisResult};
use crate::domain::models::UsageMetrics;
use crate::domain::ports::{Completion, CompletionRequest, Provider};

/// Scripted response behavior for the next `complete` call.
#[derive(Debug, Clone)]
enum Script {
    Respond(String),
    Timeout,
    Fail(String),
}

/// Provider that returns pre-configured completions without network calls.
#[derive(Debug)]
pub struct MockProvider {
    script: Script,
    calls: Mutex<Vec<CompletionRequest>>,
}

impl MockProvider {
    /// Respond to every request with the given raw text.
    pub fn new(raw_text: impl Into<String>) -> Self {
        Self {
            script: Script::Respond(raw_text.into()),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Fail every request with a timeout.
    pub fn timing_out() -> Self {
        Self {
            script: Script::Timeout,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Fail every request with a provider error.
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            script: Script::Fail(message.into()),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Number of completed `complete` calls.
    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// The most recent request, if any.
    pub fn last_request(&self) -> Option<CompletionRequest> {
        self.calls.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl Provider for MockProvider {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn complete(&self, request: CompletionRequest) -> AnalysisResult<Completion> {
        let prompt_tokens = request.prompt_tokens as u64;
        self.calls.lock().unwrap().push(request);

        match &self.script {
            Script::Respond(text) => Ok(Completion {
                raw_text: text.clone(),
                usage: UsageMetrics {
                    prompt_tokens,
                    completion_tokens: 10,
                    total_tokens: prompt_tokens + 10,
                },
            }),
            Script::Timeout => Err(AnalysisError::Timeout(
                "mock request did not respond in time".to_string(),
            )),
            Script::Fail(message) => Err(AnalysisError::Provider(message.clone())),
        }
    }
}
