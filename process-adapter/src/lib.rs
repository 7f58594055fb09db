//! Resilient external-process adapter for text-in/text-out model CLIs.
//!
//! This crate turns any command that reads a prompt on stdin and writes an
//! answer on stdout into a uniform [`Provider`]. Spawning is handled by
//! [`run_command`], which retries spawn failures classified as transient
//! (network or filesystem) with a fixed back-off and reports everything else
//! as a value instead of an error.
//!
//! ```no_run
//! # use llm_relay_process::{ExternalProcessProvider, Provider, ProviderConfig, Request};
//! # async fn example() -> Result<(), llm_relay_process::AdapterError> {
//! let mut provider = ExternalProcessProvider::new(
//!     ProviderConfig::new("local", "ollama-wrapper", "llama3").with_retries(2),
//! );
//! provider.initialize().await?;
//! let response = provider.complete(&Request::user("Hello!")).await?;
//! println!("{}", response.content);
//! # Ok(())
//! # }
//! ```

/// Spawn-failure classification.
pub mod classify;
/// Static per-provider capability metadata.
pub mod capabilities;
/// Command resolution and version probing.
pub mod discovery;
/// Error types returned by adapter operations.
pub mod error;
/// Subprocess execution with retry.
pub mod exec;
/// The provider trait and its external-process implementation.
pub mod provider;
/// Named provider collection.
pub mod registry;
/// Request, response and stream event types.
pub mod types;

pub use capabilities::{Capabilities, Feature, ModelLimits, DEFAULT_CONTEXT_LENGTH};
pub use classify::{classify_errno, classify_io_error, ErrorKind};
pub use discovery::{discover_command, probe_version};
pub use error::AdapterError;
pub use exec::{
    run_command, ExecOptions, ExecutionResult, DEFAULT_RETRY_DELAY, DEFAULT_RETRY_DELAY_MS,
};
pub use provider::{EventStream, ExternalProcessProvider, Provider, ProviderConfig};
pub use registry::ProviderRegistry;
pub use types::*;
