//! `stepwise chat` — Interactive question loop.

use std::io::Write;
use std::path::Path;
use stepwise_agent::build_engine;
use tokio::io::{AsyncBufReadExt, BufReader};

pub async fn run(config_path: Option<&Path>) -> anyhow::Result<()> {
    let config = super::load_config(config_path)?;
    let engine = build_engine(&config)?;

    println!();
    println!("  Stepwise — Interactive Mode");
    println!();
    println!("  Model:     {} via {}", config.provider.model, config.provider.api_url);
    println!("  Tools:     {}", engine.tools().names().join(", "));
    println!("  Max turns: {}", engine.max_turns());
    println!();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("\nEnter your question (or 'quit' to exit): ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let question = line.trim();
        if question.is_empty() {
            continue;
        }
        if is_exit(question) {
            break;
        }

        println!("User: {question}");
        super::print_events(engine.run_stream(question)).await;
    }

    Ok(())
}

fn is_exit(input: &str) -> bool {
    input.eq_ignore_ascii_case("quit") || input.eq_ignore_ascii_case("exit")
}
