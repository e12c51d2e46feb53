//! End-to-end integration tests for the Stepwise agent.
//!
//! These tests exercise the full pipeline from user question to emitted
//! events: engine, parser, loop guard, the real built-in tools, the
//! OpenAI-compatible backend over HTTP, and the SSE gateway.

use std::sync::{Arc, Mutex};

use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use stepwise_agent::{AgentEvent, TurnEngine, build_engine};
use stepwise_config::{AppConfig, ToolsConfig};
use stepwise_core::error::ProviderError;
use stepwise_core::message::Message;
use stepwise_core::provider::{Provider, ProviderRequest, ProviderResponse};
use stepwise_tools::{default_registry, registry_from_config};
use tower::ServiceExt;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ── Mock Provider ────────────────────────────────────────────────────────

/// A mock provider that returns scripted replies in sequence.
struct ScriptedProvider {
    replies: Mutex<Vec<String>>,
    calls: Mutex<usize>,
}

impl ScriptedProvider {
    fn new(replies: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.iter().map(|r| r.to_string()).collect()),
            calls: Mutex::new(0),
        })
    }

    fn calls(&self) -> usize {
        *self.calls.lock().unwrap()
    }
}

#[async_trait::async_trait]
impl Provider for ScriptedProvider {
    fn name(&self) -> &str {
        "e2e_mock"
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        let mut calls = self.calls.lock().unwrap();
        let replies = self.replies.lock().unwrap();
        let reply = replies.get(*calls).cloned().unwrap_or_else(|| {
            panic!("ScriptedProvider exhausted: call #{}, have {}", *calls, replies.len())
        });
        *calls += 1;
        Ok(ProviderResponse {
            message: Message::assistant(reply),
            usage: None,
            model: request.model,
        })
    }
}

fn action(tool: &str, params: serde_json::Value) -> String {
    format!(
        "Thought: I need {tool}.\nAction:\n{}\nPAUSE",
        serde_json::to_string_pretty(&serde_json::json!({
            "function_name": tool,
            "function_params": params
        }))
        .unwrap()
    )
}

fn engine_with(provider: Arc<ScriptedProvider>) -> TurnEngine {
    TurnEngine::new(provider, Arc::new(default_registry()), "mistral")
}

fn kinds(events: &[AgentEvent]) -> Vec<&'static str> {
    events.iter().map(|e| e.event_type()).collect()
}

// ── Scenarios ────────────────────────────────────────────────────────────

#[tokio::test]
async fn e2e_direct_answer_no_tools() {
    let provider = ScriptedProvider::new(&[
        "Thought: This is general knowledge.\nAnswer: The capital of France is Paris.",
    ]);
    let outcome = engine_with(provider.clone())
        .run("What is the capital of France?")
        .await;

    assert_eq!(kinds(&outcome.events), vec!["thought", "answer"]);
    assert_eq!(outcome.answer(), Some("The capital of France is Paris."));
    assert_eq!(provider.calls(), 1);
}

#[tokio::test]
async fn e2e_weather_answers_with_exact_tool_output() {
    let weather = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/London"))
        .respond_with(ResponseTemplate::new(200).set_body_string("Partly cloudy +12°C"))
        .expect(1)
        .mount(&weather)
        .await;

    let tools = registry_from_config(&ToolsConfig {
        weather_url: weather.uri(),
        ..ToolsConfig::default()
    });
    let reply = action("get_weather", serde_json::json!({"city": "London"}));
    let provider = ScriptedProvider::new(&[reply.as_str()]);
    let engine = TurnEngine::new(provider.clone(), Arc::new(tools), "mistral");

    let outcome = engine.run("What is the weather in London?").await;

    assert_eq!(
        outcome.events,
        vec![
            AgentEvent::thought("Thinking..."),
            AgentEvent::tool("Running get_weather..."),
            AgentEvent::thought("Got result. Answering immediately."),
            AgentEvent::answer("Current weather in London: Partly cloudy +12°C"),
        ]
    );
    assert_eq!(provider.calls(), 1);
}

#[tokio::test]
async fn e2e_duplicate_calculate_uses_cached_result() {
    let call = action("calculate", serde_json::json!({"expression": "6 * 7"}));
    let provider = ScriptedProvider::new(&[call.as_str(), call.as_str()]);

    let outcome = engine_with(provider.clone()).run("What is 6 times 7?").await;

    let tool_events = outcome
        .events
        .iter()
        .filter(|e| matches!(e, AgentEvent::Tool { .. }))
        .count();
    assert_eq!(tool_events, 1);
    assert_eq!(outcome.answer(), Some("42"));
    assert_eq!(provider.calls(), 2);
}

#[tokio::test]
async fn e2e_invalid_payload_twice_stops() {
    let provider = ScriptedProvider::new(&[
        "Action: {\"function_name\": calculate} PAUSE",
        "Action: [\"still wrong\"] PAUSE",
    ]);

    let outcome = engine_with(provider.clone()).run("Compute something").await;

    assert_eq!(
        outcome.terminal(),
        Some(&AgentEvent::error("Multiple parsing failures. Stopping."))
    );
    assert_eq!(provider.calls(), 2);
}

#[tokio::test]
async fn e2e_calculator_error_is_observed_and_model_recovers() {
    let call = action("calculate", serde_json::json!({"expression": "__import__('os')"}));
    let provider = ScriptedProvider::new(&[call.as_str(), "Answer: I cannot evaluate that."]);

    let outcome = engine_with(provider).run("Run os").await;

    assert!(outcome.events.iter().any(|e| matches!(
        e,
        AgentEvent::Thought { content } if content.starts_with("Observed: Error evaluating expression")
    )));
    assert_eq!(outcome.answer(), Some("I cannot evaluate that."));
}

// ── Full HTTP pipeline ───────────────────────────────────────────────────

#[tokio::test]
async fn e2e_openai_backend_round_trip() {
    let backend = MockServer::start().await;
    let first = action("calculate", serde_json::json!({"expression": "40 + 2"}));
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "choices": [{"message": {"role": "assistant", "content": first}}]
        })))
        .up_to_n_times(1)
        .mount(&backend)
        .await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(body_string_contains("Observation: 42"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "choices": [{"message": {"role": "assistant", "content": "Answer: 40 + 2 = 42"}}]
        })))
        .expect(1)
        .mount(&backend)
        .await;

    let mut config = AppConfig::default();
    config.provider.api_url = backend.uri();
    let engine = build_engine(&config).unwrap();

    let outcome = engine.run("What is 40 + 2?").await;
    assert_eq!(outcome.answer(), Some("40 + 2 = 42"));
    assert_eq!(outcome.turns, 2);
}

#[tokio::test]
async fn e2e_unreachable_backend_is_model_error() {
    let mut config = AppConfig::default();
    config.provider.api_url = "http://127.0.0.1:9".into();
    let engine = build_engine(&config).unwrap();

    let outcome = engine.run("hello").await;
    let terminal = outcome.terminal().unwrap();
    assert_eq!(terminal.event_type(), "error");
    assert!(terminal.content().starts_with("Model error: "));
}

#[tokio::test]
async fn e2e_gateway_streams_sse() {
    let provider = ScriptedProvider::new(&["Answer: Hello!"]);
    let state = Arc::new(stepwise_gateway::GatewayState {
        engine: engine_with(provider),
        allowed_origins: Vec::new(),
    });
    let app = stepwise_gateway::build_router(state);

    let req = Request::builder()
        .method("POST")
        .uri("/api/chat")
        .header("content-type", "application/json")
        .body(Body::from(r#"{"message": "Hi"}"#))
        .unwrap();
    let response = app.oneshot(req).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = String::from_utf8(bytes.to_vec()).unwrap();
    let data: Vec<&str> = body
        .lines()
        .filter_map(|l| l.strip_prefix("data: "))
        .collect();
    assert_eq!(data.len(), 3);
    let last_event: AgentEvent = serde_json::from_str(data[1]).unwrap();
    assert_eq!(last_event, AgentEvent::answer("Hello!"));
    assert_eq!(data[2], "[DONE]");
}

// ── Configuration ────────────────────────────────────────────────────────

#[tokio::test]
async fn e2e_config_file_controls_turn_budget() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(
        &path,
        "[agent]\nmax_turns = 1\nforce_stop_tools = []\n\n[provider]\nmodel = \"llama3\"\n",
    )
    .unwrap();

    let config = AppConfig::load_from(&path).unwrap();
    assert_eq!(config.agent.max_turns, 1);

    let call = action("calculate", serde_json::json!({"expression": "1 + 1"}));
    let provider = ScriptedProvider::new(&[call.as_str()]);
    let engine = TurnEngine::from_config(provider.clone(), Arc::new(default_registry()), &config);
    assert_eq!(engine.model(), "llama3");

    let outcome = engine.run("1 + 1?").await;
    assert_eq!(
        outcome.terminal(),
        Some(&AgentEvent::error("Max turns reached without final answer."))
    );
    assert_eq!(provider.calls(), 1);
}
