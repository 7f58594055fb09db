use crate::classify::ErrorKind;
use thiserror::Error;

/// Errors surfaced by the provider adapter layer.
///
/// The executor itself never fails; it reports spawn problems inside
/// [`ExecutionResult`](crate::exec::ExecutionResult). The adapter lifts those
/// results into this enum once the retry budget is spent.
#[derive(Debug, Error)]
pub enum AdapterError {
    /// The process could not be created and the failure is not retryable.
    #[error("Failed to spawn '{command}': {message}")]
    Spawn {
        /// Command that failed to start.
        command: String,
        /// OS error message.
        message: String,
    },

    /// Network-classified spawn failure that persisted across every retry.
    #[error("Network error spawning '{command}' after {attempts} attempt(s): {message}")]
    NetworkTransient {
        /// Command that failed to start.
        command: String,
        /// Number of spawn attempts made.
        attempts: u32,
        /// OS error message.
        message: String,
    },

    /// Filesystem-classified spawn failure that persisted across every retry.
    #[error("Filesystem error spawning '{command}' after {attempts} attempt(s): {message}")]
    FilesystemTransient {
        /// Command that failed to start.
        command: String,
        /// Number of spawn attempts made.
        attempts: u32,
        /// OS error message.
        message: String,
    },

    /// The tool ran, exited non-zero and explained itself on stderr.
    ///
    /// Displays as the tool's own (trimmed) message.
    #[error("{message}")]
    ExternalTool {
        /// Exit code reported by the tool.
        exit_code: i32,
        /// Trimmed stderr text.
        message: String,
    },

    /// The `--version` probe could not even be spawned.
    #[error("Health check for '{command}' failed: {message}")]
    HealthCheck {
        /// Command that was probed.
        command: String,
        /// OS error message.
        message: String,
    },

    /// `complete` was called before `initialize`.
    #[error("Provider '{0}' has not been initialized")]
    NotInitialized(String),

    /// The command could not be located on this system.
    #[error("Command not found: {0}")]
    NotFound(String),

    /// No provider is registered under this name.
    #[error("Unknown provider: {0}")]
    UnknownProvider(String),
}

impl AdapterError {
    /// Builds the error matching a classified spawn failure.
    pub(crate) fn from_spawn_failure(
        command: &str,
        kind: ErrorKind,
        attempts: u32,
        message: String,
    ) -> Self {
        let command = command.to_string();
        match kind {
            ErrorKind::Network => Self::NetworkTransient {
                command,
                attempts,
                message,
            },
            ErrorKind::Filesystem => Self::FilesystemTransient {
                command,
                attempts,
                message,
            },
            ErrorKind::General => Self::Spawn { command, message },
        }
    }
}
