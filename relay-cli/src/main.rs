//! The `llm-relay` binary.

use clap::Parser;
use llm_relay::cli::Cli;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let fallback = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));

    // Logs go to stderr so stdout carries only model output.
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = llm_relay::commands::run(cli).await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
