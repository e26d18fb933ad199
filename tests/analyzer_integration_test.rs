//! End-to-end analysis tests against mocked provider backends.

use std::sync::Arc;

use mockito::Matcher;
use serde_json::json;

use tagsmith::adapters::providers::{MockProvider, ProviderRegistry};
use tagsmith::domain::models::{Config, ProviderKind, TagRef};
use tagsmith::services::DocumentAnalyzer;
use tagsmith::AnalysisRequest;

fn openai_config(server_url: &str) -> Config {
    let mut config = Config::default();
    config.openai.api_key = "sk-test".to_string();
    config.openai.base_url = server_url.to_string();
    config
}

#[tokio::test]
async fn openai_end_to_end() {
    let mut server = mockito::Server::new_async().await;
    let response = json!({
        "choices": [{
            "message": {
                "content": r#"{"tags": ["Invoice"], "correspondent": "Acme Corp", "title": "March invoice", "document_date": "2024-03-01", "language": "en"}"#
            }
        }],
        "usage": {"prompt_tokens": 120, "completion_tokens": 25, "total_tokens": 145}
    });
    let mock = server
        .mock("POST", "/chat/completions")
        .match_header("authorization", "Bearer sk-test")
        .match_body(Matcher::PartialJson(json!({"model": "gpt-4o-mini"})))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(response.to_string())
        .create_async()
        .await;

    let config = openai_config(&server.url());
    let provider = ProviderRegistry::create(&config).unwrap();
    let analyzer = DocumentAnalyzer::new(provider, &config);

    let outcome = analyzer
        .analyze(AnalysisRequest::new(
            "Invoice No. 2024-001 from Acme Corp, issued 2024-03-01.",
        ))
        .await;

    mock.assert_async().await;
    assert!(outcome.error.is_none(), "error: {:?}", outcome.error);
    assert_eq!(outcome.suggestions.tags, vec!["Invoice"]);
    assert_eq!(outcome.suggestions.correspondent.as_deref(), Some("Acme Corp"));
    assert_eq!(outcome.suggestions.title.as_deref(), Some("March invoice"));
    assert_eq!(outcome.metrics.unwrap().total_tokens, 145);
    assert!(!outcome.truncated);
}

#[tokio::test]
async fn openai_http_error_becomes_empty_outcome() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/chat/completions")
        .with_status(429)
        .with_body(r#"{"error": {"message": "rate limited"}}"#)
        .create_async()
        .await;

    let config = openai_config(&server.url());
    let provider = ProviderRegistry::create(&config).unwrap();
    let analyzer = DocumentAnalyzer::new(provider, &config);

    let outcome = analyzer.analyze(AnalysisRequest::new("some text")).await;

    assert!(outcome.suggestions.tags.is_empty());
    assert!(outcome.suggestions.correspondent.is_none());
    assert!(outcome.metrics.is_none());
    assert!(outcome.error.unwrap().contains("429"));
}

#[tokio::test]
async fn ollama_end_to_end_with_fenced_response() {
    let mut server = mockito::Server::new_async().await;
    let response = json!({
        "response": "```json\n{\"tags\": [\"Receipt\"], \"correspondent\": null}\n```"
    });
    let mock = server
        .mock("POST", "/api/generate")
        .match_body(Matcher::PartialJson(json!({
            "model": "llama3.1",
            "stream": false
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(response.to_string())
        .create_async()
        .await;

    let mut config = Config::default();
    config.ai_provider = ProviderKind::Ollama;
    config.ollama.api_url = server.url();

    let provider = ProviderRegistry::create(&config).unwrap();
    let analyzer = DocumentAnalyzer::new(provider, &config);

    let outcome = analyzer
        .analyze(AnalysisRequest::new("Grocery receipt, total 23.50 EUR"))
        .await;

    mock.assert_async().await;
    assert!(outcome.error.is_none(), "error: {:?}", outcome.error);
    assert_eq!(outcome.suggestions.tags, vec!["Receipt"]);
    assert!(outcome.suggestions.correspondent.is_none());
    // usage is estimated locally for this backend
    assert!(outcome.metrics.unwrap().total_tokens > 0);
}

#[tokio::test]
async fn restriction_clause_reaches_the_wire() {
    let mut server = mockito::Server::new_async().await;
    let response = json!({
        "choices": [{"message": {"content": r#"{"tags": ["Invoice"], "correspondent": null}"#}}],
        "usage": {"prompt_tokens": 80, "completion_tokens": 10, "total_tokens": 90}
    });
    let mock = server
        .mock("POST", "/chat/completions")
        .match_body(Matcher::Regex(
            "MUST ONLY use tags from this list".to_string(),
        ))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(response.to_string())
        .create_async()
        .await;

    let mut config = openai_config(&server.url());
    config.analysis.use_existing_data = true;
    config.analysis.restrict_to_existing_tags = true;

    let provider = ProviderRegistry::create(&config).unwrap();
    let analyzer = DocumentAnalyzer::new(provider, &config);

    let outcome = analyzer
        .analyze(
            AnalysisRequest::new("Invoice text")
                .with_existing_tags(vec![TagRef::new("Invoice"), TagRef::new("Receipt")]),
        )
        .await;

    mock.assert_async().await;
    assert!(outcome.error.is_none());
}

#[tokio::test]
async fn mock_provider_records_budgeted_prompt() {
    let provider = Arc::new(MockProvider::new(
        r#"{"tags": ["Contract"], "correspondent": "Legal Dept"}"#,
    ));
    let mut config = Config::default();
    config.tokens.limit = 2048;
    config.tokens.response_tokens = 256;

    let analyzer = DocumentAnalyzer::new(provider.clone(), &config);
    let outcome = analyzer
        .analyze(AnalysisRequest::new("Employment contract between parties"))
        .await;

    assert!(outcome.error.is_none());
    let sent = provider.last_request().unwrap();
    // prompt cost plus content must fit inside limit minus the reservation
    assert!(sent.prompt_tokens <= 2048 - 256);
    assert!(sent.system_prompt.contains("Return the result EXCLUSIVELY as a JSON object"));
}
