use convogen_core::domain::{GenerationRequest, PromptSpec, Transcript};
use convogen_core::logging::NoopEventLogger;
use convogen_core::provider::{GenerationClient, TransportError};
use convogen_core::providers::{
    MockClient, OllamaClient, OpenRouterClient, ScriptClient, ScriptConfig,
};
use httpmock::prelude::*;
use std::sync::Arc;
use std::time::Duration;

fn request() -> GenerationRequest {
    GenerationRequest {
        scenario_id: "basic_payment_willing".to_string(),
        variation_index: 1,
        attempt: 1,
        prompt: PromptSpec {
            system: Some("generate conversations".to_string()),
            user: "generate one now".to_string(),
        },
    }
}

#[test]
fn openrouter_metadata() {
    let client = OpenRouterClient::new(
        "or",
        "https://openrouter.ai/api/v1".to_string(),
        "sk-test".to_string(),
        "gpt-4.1-mini".to_string(),
    );
    let m = client.metadata();
    assert_eq!(m.id, "or");
    assert_eq!(m.model, "gpt-4.1-mini");
}

#[tokio::test]
async fn openrouter_returns_message_content() {
    let server = MockServer::start();
    let transcript = "[{\"role\":\"assistant\",\"content\":\"Good morning.\"}]";
    let mock = server.mock(|when, then| {
        when.method(POST)
            .path("/chat/completions")
            .header("authorization", "Bearer sk-test");
        then.status(200).json_body(serde_json::json!({
            "choices": [{"message": {"role": "assistant", "content": transcript}}]
        }));
    });

    let client = OpenRouterClient::new(
        "or",
        server.base_url(),
        "sk-test".to_string(),
        "gpt-4.1-mini".to_string(),
    );
    let raw = client.generate(&request()).await.unwrap();
    mock.assert();
    assert_eq!(raw, transcript);
    assert!(Transcript::parse(&raw).is_some());
}

#[tokio::test]
async fn openrouter_maps_429_to_rate_limited() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/chat/completions");
        then.status(429).body("slow down");
    });

    let client = OpenRouterClient::new(
        "or",
        server.base_url(),
        "sk-test".to_string(),
        "gpt-4.1-mini".to_string(),
    );
    let err = client.generate(&request()).await.unwrap_err();
    assert!(matches!(err, TransportError::RateLimited));
}

#[tokio::test]
async fn openrouter_surfaces_service_errors() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/chat/completions");
        then.status(500).body("backend exploded");
    });

    let client = OpenRouterClient::new(
        "or",
        server.base_url(),
        "sk-test".to_string(),
        "gpt-4.1-mini".to_string(),
    );
    let err = client.generate(&request()).await.unwrap_err();
    match err {
        TransportError::Service { status, body } => {
            assert_eq!(status, 500);
            assert!(body.contains("backend exploded"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn ollama_streams_and_concatenates_chunks() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/api/generate");
        then.status(200)
            .header("content-type", "application/json")
            .body(
                "{\"response\":\"[{\\\"role\\\":\",\"done\":false}\n\
                 {\"response\":\"\\\"assistant\\\",\\\"content\\\":\\\"Hello\\\"}]\",\"done\":false}\n\
                 {\"response\":\"\",\"done\":true}\n",
            );
    });

    let client = OllamaClient::with_client_and_timeout(
        "ol",
        server.base_url(),
        "llama3".to_string(),
        reqwest::Client::new(),
        Arc::new(NoopEventLogger),
        Duration::from_secs(5),
    );
    let raw = client.generate(&request()).await.unwrap();
    assert_eq!(raw, "[{\"role\":\"assistant\",\"content\":\"Hello\"}]");
    assert!(Transcript::parse(&raw).is_some());
}

#[tokio::test]
async fn ollama_health_check_hits_tags_endpoint() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(GET).path("/api/tags");
        then.status(200).json_body(serde_json::json!({"models": []}));
    });

    let client = OllamaClient::with_client_and_timeout(
        "ol",
        server.base_url(),
        "llama3".to_string(),
        reqwest::Client::new(),
        Arc::new(NoopEventLogger),
        Duration::from_secs(5),
    );
    client.health_check().await.unwrap();
    mock.assert();
}

#[tokio::test]
async fn ollama_error_status_is_a_service_error() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/api/generate");
        then.status(404).body("model not found");
    });

    let client = OllamaClient::with_client_and_timeout(
        "ol",
        server.base_url(),
        "llama3".to_string(),
        reqwest::Client::new(),
        Arc::new(NoopEventLogger),
        Duration::from_secs(5),
    );
    let err = client.generate(&request()).await.unwrap_err();
    assert!(matches!(err, TransportError::Service { status: 404, .. }));
}

#[tokio::test]
async fn mock_client_output_parses_as_a_transcript() {
    let client = MockClient::new("mock");
    let raw = client.generate(&request()).await.unwrap();
    let transcript = Transcript::parse(&raw).unwrap();
    assert!(transcript.len() >= 4);
    assert!(raw.contains("(function_1)"));
}

#[tokio::test]
async fn script_client_unwraps_json_envelope() {
    let client = ScriptClient::new(
        "sc",
        ScriptConfig {
            command: "echo".to_string(),
            args: vec!["{\"content\": \"hello from the script\"}".to_string()],
            timeout_ms: Some(5000),
        },
    );
    let raw = client.generate(&request()).await.unwrap();
    assert_eq!(raw, "hello from the script");
}

#[tokio::test]
async fn script_client_missing_command_is_unavailable() {
    let client = ScriptClient::new(
        "sc",
        ScriptConfig {
            command: "definitely-not-a-real-command-xyz".to_string(),
            args: vec![],
            timeout_ms: Some(1000),
        },
    );
    let err = client.generate(&request()).await.unwrap_err();
    assert!(matches!(err, TransportError::Unavailable));
}
