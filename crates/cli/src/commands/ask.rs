//! `stepwise ask` — Answer one question and exit.

use std::path::Path;
use stepwise_agent::{AgentEvent, build_engine};

pub async fn run(config_path: Option<&Path>, question: &str) -> anyhow::Result<()> {
    let config = super::load_config(config_path)?;
    let engine = build_engine(&config)?;

    println!("User: {question}");
    match super::print_events(engine.run_stream(question)).await {
        Some(AgentEvent::Error { .. }) => anyhow::bail!("the run ended without an answer"),
        Some(_) => Ok(()),
        None => anyhow::bail!("the run stopped before finishing"),
    }
}
