//! # Stepwise Core
//!
//! Domain types, traits, and error definitions for the Stepwise agent.
//! This crate has no framework dependencies: it defines the model that
//! the provider, tool, and agent crates implement against.
//!
//! The two seams that matter are [`Provider`] (the language model backend)
//! and [`Tool`] (a capability the model may invoke). Everything else in
//! the workspace talks to those traits, which keeps the turn engine
//! testable with scripted mocks.

pub mod error;
pub mod message;
pub mod provider;
pub mod tool;

// Re-export key types at crate root for ergonomics
pub use error::{Error, ProviderError, Result, ToolError};
pub use message::{Conversation, ConversationId, Message, Role};
pub use provider::{Provider, ProviderRequest, ProviderResponse, Usage};
pub use tool::{Tool, ToolDefinition, ToolRegistry, ToolResult};
