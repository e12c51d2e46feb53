//! Shared test helpers for engine tests.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use stepwise_core::error::{ProviderError, ToolError};
use stepwise_core::message::Message;
use stepwise_core::provider::{Provider, ProviderRequest, ProviderResponse};
use stepwise_core::tool::{Tool, ToolResult};

/// A mock provider that replays scripted replies in order.
///
/// Every request it receives is kept for inspection. Panics if more calls
/// are made than replies provided.
pub struct ScriptedProvider {
    replies: Mutex<VecDeque<Result<String, ProviderError>>>,
    requests: Mutex<Vec<ProviderRequest>>,
}

impl ScriptedProvider {
    pub fn new(replies: &[&str]) -> Self {
        Self::from_results(replies.iter().map(|r| Ok(r.to_string())).collect())
    }

    pub fn from_results(replies: Vec<Result<String, ProviderError>>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// A provider whose first call fails.
    pub fn failing(error: ProviderError) -> Self {
        Self::from_results(vec![Err(error)])
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<ProviderRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Provider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        let call = {
            let mut requests = self.requests.lock().unwrap();
            requests.push(request.clone());
            requests.len()
        };
        let reply = self
            .replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| panic!("ScriptedProvider: no reply scripted for call #{call}"));

        reply.map(|text| ProviderResponse {
            message: Message::assistant(text),
            usage: None,
            model: request.model,
        })
    }
}

/// A tool that returns a fixed result and counts how often it ran.
pub struct CountingTool {
    name: String,
    result: ToolResult,
    calls: AtomicUsize,
}

impl CountingTool {
    pub fn new(name: &str, result: ToolResult) -> Self {
        Self {
            name: name.into(),
            result,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Tool for CountingTool {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        "Returns a canned result"
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": { "input": { "type": "string" } },
            "required": ["input"]
        })
    }

    async fn execute(&self, _arguments: serde_json::Value) -> Result<ToolResult, ToolError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.result.clone())
    }
}

/// An `Arc`-shared tool that can be registered while the test keeps a
/// handle for counting calls.
pub struct SharedTool(pub std::sync::Arc<CountingTool>);

#[async_trait]
impl Tool for SharedTool {
    fn name(&self) -> &str {
        self.0.name()
    }

    fn description(&self) -> &str {
        self.0.description()
    }

    fn parameters_schema(&self) -> serde_json::Value {
        self.0.parameters_schema()
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<ToolResult, ToolError> {
        self.0.execute(arguments).await
    }
}

/// Format a tool request the way the model is asked to.
pub fn action_reply(tool: &str, params: serde_json::Value) -> String {
    format!(
        "Thought: I should use {tool}.\nAction:\n{}\nPAUSE",
        serde_json::to_string_pretty(&serde_json::json!({
            "function_name": tool,
            "function_params": params,
        }))
        .unwrap()
    )
}
