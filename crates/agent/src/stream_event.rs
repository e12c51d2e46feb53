//! Progress events emitted by the turn engine.
//!
//! Each event serializes as `{"type": "...", "content": "..."}` so the
//! gateway can forward it over SSE unchanged.

use serde::{Deserialize, Serialize};

/// Events emitted during one run.
///
/// - `thought` — progress note (not part of the answer)
/// - `tool`    — a tool is about to run
/// - `answer`  — final answer, ends the run
/// - `error`   — the run failed, ends the run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AgentEvent {
    Thought { content: String },
    Tool { content: String },
    Answer { content: String },
    Error { content: String },
}

impl AgentEvent {
    pub fn thought(content: impl Into<String>) -> Self {
        Self::Thought {
            content: content.into(),
        }
    }

    pub fn tool(content: impl Into<String>) -> Self {
        Self::Tool {
            content: content.into(),
        }
    }

    pub fn answer(content: impl Into<String>) -> Self {
        Self::Answer {
            content: content.into(),
        }
    }

    pub fn error(content: impl Into<String>) -> Self {
        Self::Error {
            content: content.into(),
        }
    }

    /// Wire name for this event type.
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::Thought { .. } => "thought",
            Self::Tool { .. } => "tool",
            Self::Answer { .. } => "answer",
            Self::Error { .. } => "error",
        }
    }

    pub fn content(&self) -> &str {
        match self {
            Self::Thought { content }
            | Self::Tool { content }
            | Self::Answer { content }
            | Self::Error { content } => content,
        }
    }

    /// Whether this event ends the run.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Answer { .. } | Self::Error { .. })
    }

    /// Text shown before the content in terminal output.
    pub fn console_prefix(&self) -> &'static str {
        match self {
            Self::Thought { .. } => "[Thought] ",
            Self::Tool { .. } => "[Tool] ",
            Self::Answer { .. } => "\nAnswer: ",
            Self::Error { .. } => "\n[Error] ",
        }
    }
}
