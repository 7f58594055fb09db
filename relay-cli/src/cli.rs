//! Command-line surface.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Forward chat requests to external model-serving command-line tools.
#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to a JSON config file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Log at debug level (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Send a prompt to a provider and print the answer
    Complete(CompleteArgs),
    /// List the models each provider serves, with their limits
    Models {
        /// Only show this provider
        #[arg(long)]
        provider: Option<String>,
    },
    /// Initialize every provider and report its health
    Health,
    /// Locate every configured command and print its version
    Doctor,
    /// Run an arbitrary command through the retrying executor
    Exec(ExecArgs),
}

/// Arguments for `complete`.
#[derive(Debug, Args)]
pub struct CompleteArgs {
    /// Prompt text; read from stdin when omitted
    pub prompt: Option<String>,

    /// System message placed before the prompt
    #[arg(long)]
    pub system: Option<String>,

    /// Provider name (defaults to the configured default)
    #[arg(long)]
    pub provider: Option<String>,

    /// Model label to report
    #[arg(long)]
    pub model: Option<String>,

    /// Retry budget for transient spawn failures
    #[arg(long)]
    pub retries: Option<u32>,

    /// Print the answer as stream events
    #[arg(long)]
    pub stream: bool,

    /// Print JSON instead of plain text
    #[arg(long)]
    pub json: bool,
}

/// Arguments for `exec`.
#[derive(Debug, Args)]
pub struct ExecArgs {
    /// Retry budget for transient spawn failures
    #[arg(long, default_value_t = 0)]
    pub retries: u32,

    /// Pause between attempts, in milliseconds
    #[arg(long, default_value_t = 500)]
    pub retry_delay_ms: u64,

    /// Text written to the command's stdin
    #[arg(long)]
    pub stdin: Option<String>,

    /// Command to run
    pub command: String,

    /// Arguments passed to the command
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    pub args: Vec<String>,
}
