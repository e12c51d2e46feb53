//! Tool trait — the abstraction over agent capabilities.
//!
//! Tools are the only way the agent touches the outside world: searching
//! the web, checking the weather, timing a URL, evaluating arithmetic.
//!
//! The registry never hands an error back to the engine. Whatever happens
//! inside a tool (bad arguments, network failure, a panic) comes out as a
//! [`ToolResult`] with `success == false`, so every outcome can be fed to
//! the model as an observation.

use crate::error::ToolError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

/// The outcome of one tool invocation.
///
/// `success` is the only failure signal the engine looks at; `output` is
/// free text meant for the model and may say anything.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolResult {
    /// Whether the tool produced a usable answer
    pub success: bool,

    /// The output content
    pub output: String,
}

impl ToolResult {
    pub fn ok(output: impl Into<String>) -> Self {
        Self {
            success: true,
            output: output.into(),
        }
    }

    pub fn failure(output: impl Into<String>) -> Self {
        Self {
            success: false,
            output: output.into(),
        }
    }
}

/// A tool definition, used to describe the tool to the model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// The tool name
    pub name: String,

    /// Description of what the tool does
    pub description: String,

    /// JSON Schema describing the tool's parameters
    pub parameters: serde_json::Value,
}

/// The core Tool trait.
///
/// Implementations must be safe to call from unrelated conversations at
/// the same time.
#[async_trait]
pub trait Tool: Send + Sync {
    /// The unique name of this tool (e.g., "web_search").
    fn name(&self) -> &str;

    /// A description of what this tool does (sent to the model).
    fn description(&self) -> &str;

    /// JSON Schema describing this tool's parameters.
    fn parameters_schema(&self) -> serde_json::Value;

    /// Execute the tool with the given arguments.
    async fn execute(
        &self,
        arguments: serde_json::Value,
    ) -> std::result::Result<ToolResult, ToolError>;

    /// Convert this tool into a ToolDefinition.
    fn to_definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.name().to_string(),
            description: self.description().to_string(),
            parameters: self.parameters_schema(),
        }
    }
}

/// A registry of available tools.
///
/// Built once at startup and then shared read-only behind an `Arc`.
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
        }
    }

    /// Register a tool. Replaces any existing tool with the same name.
    pub fn register(&mut self, tool: Box<dyn Tool>) {
        let name = tool.name().to_string();
        self.tools.insert(name, Arc::from(tool));
    }

    /// Get a tool by name.
    pub fn get(&self, name: &str) -> Option<&dyn Tool> {
        self.tools.get(name).map(|t| t.as_ref())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    /// All tool definitions, sorted by name.
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        let mut defs: Vec<ToolDefinition> =
            self.tools.values().map(|t| t.to_definition()).collect();
        defs.sort_by(|a, b| a.name.cmp(&b.name));
        defs
    }

    /// List all registered tool names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.tools.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }

    /// Invoke a tool by name.
    ///
    /// The call runs as its own task so a slow network tool never ties up
    /// the caller's task, and a panicking tool cannot take the run down.
    /// Unknown names and tool errors come back as failed results whose
    /// text starts with `Error: `.
    pub async fn invoke(&self, name: &str, arguments: serde_json::Value) -> ToolResult {
        let Some(tool) = self.tools.get(name).cloned() else {
            debug!(tool = name, "Tool not registered");
            return ToolResult::failure(format!(
                "Error: {}",
                ToolError::NotFound(name.to_string())
            ));
        };

        let task = tokio::spawn(async move { tool.execute(arguments).await });
        match task.await {
            Ok(Ok(result)) => result,
            Ok(Err(e)) => {
                debug!(tool = name, error = %e, "Tool returned an error");
                ToolResult::failure(format!("Error: {e}"))
            }
            Err(e) => {
                warn!(tool = name, error = %e, "Tool task did not complete");
                ToolResult::failure(format!("Error: {name} did not complete: {e}"))
            }
        }
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}
