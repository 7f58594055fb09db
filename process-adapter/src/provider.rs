//! Uniform provider interface and the external-process implementation.
//!
//! [`ExternalProcessProvider`] wraps one text-in/text-out command. Each
//! `complete` call spawns the command with no arguments, writes the flattened
//! conversation to its stdin and reads the answer from its stdout.
//!
//! # Pseudo-streaming
//!
//! The wrapped tool is a batch process, so [`Provider::stream_complete`] only
//! returns once the process has exited. The stream it hands back always holds
//! exactly two events: one [`StreamEvent::Content`] with the whole output,
//! then [`StreamEvent::Done`]. No partial output is ever observable.

use crate::capabilities::{Capabilities, ModelLimits, DEFAULT_CONTEXT_LENGTH};
use crate::discovery::discover_command;
use crate::error::AdapterError;
use crate::exec::{run_command, ExecOptions, DEFAULT_RETRY_DELAY_MS};
use crate::types::{HealthStatus, ModelInfo, Request, Response, StreamEvent, Usage};
use async_trait::async_trait;
use futures::stream::{self, BoxStream, StreamExt};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

/// Stream returned by [`Provider::stream_complete`].
pub type EventStream = BoxStream<'static, StreamEvent>;

/// Flag passed to the wrapped command by the initialization probe.
pub const VERSION_FLAG: &str = "--version";

const fn default_retry_delay_ms() -> u64 {
    DEFAULT_RETRY_DELAY_MS
}

/// Everything needed to build an [`ExternalProcessProvider`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Provider identifier reported in responses.
    pub name: String,
    /// Executable name or path of the wrapped tool.
    pub command: String,
    /// Model identifier the tool serves.
    pub model: String,
    /// Retry budget for transient spawn failures.
    #[serde(default)]
    pub retries: u32,
    /// Pause between spawn attempts, in milliseconds.
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
    /// Environment overrides for the child process.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub env: BTreeMap<String, String>,
    /// Working directory for the child process.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cwd: Option<PathBuf>,
    /// Context window of `model`, in tokens.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context_length: Option<u32>,
    /// Output ceiling of `model`, in tokens.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_output_tokens: Option<u32>,
}

impl ProviderConfig {
    /// Creates a config with default retry settings and no limits.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        command: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            command: command.into(),
            model: model.into(),
            retries: 0,
            retry_delay_ms: default_retry_delay_ms(),
            env: BTreeMap::new(),
            cwd: None,
            context_length: None,
            max_output_tokens: None,
        }
    }

    /// Sets the retry budget.
    #[must_use]
    pub const fn with_retries(mut self, retries: u32) -> Self {
        self.retries = retries;
        self
    }

    /// Sets the pause between attempts.
    #[must_use]
    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Sets the model's token ceilings.
    #[must_use]
    pub const fn with_limits(
        mut self,
        context_length: Option<u32>,
        max_output_tokens: Option<u32>,
    ) -> Self {
        self.context_length = context_length;
        self.max_output_tokens = max_output_tokens;
        self
    }

    fn exec_options(&self) -> ExecOptions {
        ExecOptions {
            retries: self.retries,
            retry_delay: Duration::from_millis(self.retry_delay_ms),
            env: self.env.iter().map(|(k, v)| (k.clone(), v.clone())).collect(),
            cwd: self.cwd.clone(),
            stdin: None,
        }
    }
}

/// The interface an orchestration layer uses to drive any provider.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Provider identifier.
    fn name(&self) -> &str;

    /// Prepares the provider; must succeed before `complete` is callable.
    async fn initialize(&mut self) -> Result<(), AdapterError>;

    /// Runs a request to completion.
    async fn complete(&self, request: &Request) -> Result<Response, AdapterError>;

    /// Runs a request and replays the result as a stream of events.
    async fn stream_complete(&self, request: &Request) -> Result<EventStream, AdapterError>;

    /// Models this provider can serve.
    fn list_models(&self) -> Vec<String>;

    /// Token ceilings for `model`.
    fn model_info(&self, model: &str) -> ModelInfo;

    /// Reports whether the provider is usable.
    async fn health_check(&self) -> HealthStatus;

    /// Static capability record.
    fn capabilities(&self) -> &Capabilities;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Uninitialized,
    Initialized,
}

/// Provider backed by an external command speaking plain text over stdio.
#[derive(Debug, Clone)]
pub struct ExternalProcessProvider {
    config: ProviderConfig,
    capabilities: Capabilities,
    state: State,
    version: Option<String>,
}

impl ExternalProcessProvider {
    /// Builds an uninitialized provider and its capability record.
    #[must_use]
    pub fn new(config: ProviderConfig) -> Self {
        let limits = ModelLimits {
            context_length: config.context_length,
            max_output_tokens: config.max_output_tokens,
        };
        let capabilities = Capabilities::for_model(config.model.clone(), limits);
        Self {
            config,
            capabilities,
            state: State::Uninitialized,
            version: None,
        }
    }

    /// Configuration this provider was built from.
    #[must_use]
    pub const fn config(&self) -> &ProviderConfig {
        &self.config
    }

    /// First line of the tool's `--version` output, if the probe produced one.
    #[must_use]
    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    /// Returns `true` once `initialize` has succeeded.
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.state == State::Initialized
    }
}

#[async_trait]
impl Provider for ExternalProcessProvider {
    fn name(&self) -> &str {
        &self.config.name
    }

    async fn initialize(&mut self) -> Result<(), AdapterError> {
        let command = self.config.command.as_str();
        let result = run_command(command, &[VERSION_FLAG], &self.config.exec_options()).await;

        if result.is_spawn_failure() {
            return Err(AdapterError::HealthCheck {
                command: command.to_string(),
                message: result.stderr.trim().to_string(),
            });
        }

        if !result.success {
            tracing::warn!(
                provider = %self.config.name,
                exit_code = result.exit_code,
                "version probe exited non-zero"
            );
        }

        match discover_command(command) {
            Ok(path) => tracing::debug!(
                provider = %self.config.name,
                path = %path.display(),
                "resolved command"
            ),
            Err(e) => tracing::debug!(
                provider = %self.config.name,
                error = %e,
                "could not resolve command path"
            ),
        }

        self.version = result
            .stdout
            .lines()
            .next()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(ToOwned::to_owned);
        self.state = State::Initialized;

        tracing::info!(
            provider = %self.config.name,
            command,
            version = self.version.as_deref().unwrap_or("unknown"),
            "provider initialized"
        );
        Ok(())
    }

    async fn complete(&self, request: &Request) -> Result<Response, AdapterError> {
        if !self.is_initialized() {
            return Err(AdapterError::NotInitialized(self.config.name.clone()));
        }

        let command = self.config.command.as_str();
        let options = self.config.exec_options().with_stdin(request.to_prompt());
        let result = run_command::<&str>(command, &[], &options).await;

        if let Some(kind) = result.error_kind {
            return Err(AdapterError::from_spawn_failure(
                command,
                kind,
                result.attempts,
                result.stderr.trim().to_string(),
            ));
        }

        if result.exit_code != 0 {
            if !result.stderr.is_empty() {
                return Err(AdapterError::ExternalTool {
                    exit_code: result.exit_code,
                    message: result.stderr.trim().to_string(),
                });
            }
            // Exit status alone is not treated as failure; stdout is the answer.
            tracing::warn!(
                provider = %self.config.name,
                exit_code = result.exit_code,
                "tool exited non-zero without diagnostics, using stdout"
            );
        }

        Ok(Response {
            id: Response::new_id(),
            model: request
                .model
                .clone()
                .unwrap_or_else(|| self.config.model.clone()),
            provider: self.config.name.clone(),
            content: result.stdout.trim().to_string(),
            usage: Usage::default(),
        })
    }

    async fn stream_complete(&self, request: &Request) -> Result<EventStream, AdapterError> {
        let response = self.complete(request).await?;
        let events = [
            StreamEvent::Content {
                delta: response.content,
                usage: response.usage,
            },
            StreamEvent::Done,
        ];
        Ok(stream::iter(events).boxed())
    }

    fn list_models(&self) -> Vec<String> {
        self.capabilities.models().to_vec()
    }

    fn model_info(&self, model: &str) -> ModelInfo {
        let limits = self.capabilities.limits(model).unwrap_or_default();
        ModelInfo {
            id: model.to_string(),
            context_length: limits.context_length.unwrap_or(DEFAULT_CONTEXT_LENGTH),
            max_output_tokens: limits.max_output_tokens,
        }
    }

    async fn health_check(&self) -> HealthStatus {
        HealthStatus {
            healthy: true,
            detail: self.version.clone(),
        }
    }

    fn capabilities(&self) -> &Capabilities {
        &self.capabilities
    }
}
