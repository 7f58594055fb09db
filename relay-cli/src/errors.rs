//! Public error types for the relay CLI.

use llm_relay_process::AdapterError;
use thiserror::Error;

/// Errors that can occur while running a relay command.
#[derive(Debug, Error)]
pub enum Error {
    /// The configuration file is missing, unreadable or inconsistent.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Error from the provider adapter layer.
    ///
    /// Displayed unchanged so that a tool's own stderr reaches the user as-is.
    #[error(transparent)]
    Adapter(#[from] AdapterError),

    /// I/O error while reading input or writing output.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Output serialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
