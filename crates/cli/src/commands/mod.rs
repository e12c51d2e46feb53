pub mod ask;
pub mod chat;
pub mod doctor;
pub mod serve;
pub mod tools;

use anyhow::Context;
use std::path::Path;
use stepwise_agent::AgentEvent;
use stepwise_config::AppConfig;
use tokio::sync::mpsc;

/// Load the config from `path`, or from the default location.
pub fn load_config(path: Option<&Path>) -> anyhow::Result<AppConfig> {
    match path {
        Some(p) => AppConfig::load_with_env(p)
            .with_context(|| format!("Failed to load config from {}", p.display())),
        None => AppConfig::load().context("Failed to load config"),
    }
}

/// Print events as they arrive. Returns the terminal event, if any.
pub async fn print_events(mut rx: mpsc::Receiver<AgentEvent>) -> Option<AgentEvent> {
    let mut terminal = None;
    while let Some(event) = rx.recv().await {
        println!("{}{}", event.console_prefix(), event.content());
        if event.is_terminal() {
            terminal = Some(event);
        }
    }
    terminal
}
