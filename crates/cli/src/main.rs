//! Stepwise CLI — the main entry point.
//!
//! Commands:
//! - `ask`     — Answer one question and exit
//! - `chat`    — Interactive question loop
//! - `serve`   — Start the HTTP gateway
//! - `tools`   — List the built-in tools
//! - `doctor`  — Diagnose configuration and backend reachability

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;

#[derive(Parser)]
#[command(
    name = "stepwise",
    about = "Stepwise — a reason, act, observe agent for local language models",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file to use instead of ~/.stepwise/config.toml
    #[arg(short, long, global = true, env = "STEPWISE_CONFIG")]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Ask a single question
    Ask {
        /// The question; several words are joined with spaces
        #[arg(required = true)]
        question: Vec<String>,
    },

    /// Ask questions interactively until `quit` or `exit`
    Chat,

    /// Start the HTTP gateway server
    Serve {
        /// Override the port
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// List the tools the agent can call
    Tools,

    /// Diagnose configuration and backend health
    Doctor,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config_path = cli.config.as_deref();
    match cli.command {
        Commands::Ask { question } => commands::ask::run(config_path, &question.join(" ")).await?,
        Commands::Chat => commands::chat::run(config_path).await?,
        Commands::Serve { port } => commands::serve::run(config_path, port).await?,
        Commands::Tools => commands::tools::run(config_path)?,
        Commands::Doctor => commands::doctor::run(config_path).await?,
    }

    Ok(())
}
