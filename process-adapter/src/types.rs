//! Request, response and stream types shared by every provider.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Author of a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Instructions framing the conversation.
    System,
    /// The human side.
    User,
    /// Prior model output.
    Assistant,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::System => "system",
            Self::User => "user",
            Self::Assistant => "assistant",
        };
        f.write_str(s)
    }
}

/// A single chat message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Who wrote it.
    pub role: Role,
    /// Message text.
    pub content: String,
}

impl Message {
    /// Creates a message.
    #[must_use]
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

/// A completion request: ordered messages plus an optional model override.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Request {
    /// Conversation so far, oldest first.
    pub messages: Vec<Message>,
    /// Overrides the provider's configured model in the response.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

impl Request {
    /// Creates a request from messages.
    #[must_use]
    pub const fn new(messages: Vec<Message>) -> Self {
        Self {
            messages,
            model: None,
        }
    }

    /// Single user-message request.
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(vec![Message::new(Role::User, content)])
    }

    /// Appends a message.
    #[must_use]
    pub fn with_message(mut self, role: Role, content: impl Into<String>) -> Self {
        self.messages.push(Message::new(role, content));
        self
    }

    /// Sets the model override.
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Flattens the conversation into the text fed to a wrapped tool.
    ///
    /// One `"<role>: <content>"` line per message, joined with `\n`. An empty
    /// request yields an empty string.
    #[must_use]
    pub fn to_prompt(&self) -> String {
        self.messages
            .iter()
            .map(|m| format!("{}: {}", m.role, m.content))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Token accounting. Zero when the wrapped tool does not report usage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    /// Tokens in the prompt.
    pub prompt_tokens: u64,
    /// Tokens in the completion.
    pub completion_tokens: u64,
    /// Sum of both.
    pub total_tokens: u64,
}

/// A finished completion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Response {
    /// Process-unique, time-ordered identifier.
    pub id: String,
    /// Model that produced the content.
    pub model: String,
    /// Name of the provider that served the request.
    pub provider: String,
    /// Full response text.
    pub content: String,
    /// Token usage.
    pub usage: Usage,
}

impl Response {
    /// Returns a fresh response id.
    ///
    /// UUIDv7 ids carry a millisecond timestamp and are unique within the
    /// process.
    #[must_use]
    pub fn new_id() -> String {
        format!("extproc-{}", uuid::Uuid::now_v7())
    }
}

/// Event emitted by `stream_complete`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamEvent {
    /// A chunk of content with usage so far.
    Content {
        /// The text delta.
        delta: String,
        /// Usage accumulated so far.
        usage: Usage,
    },
    /// End of stream.
    Done,
}

/// Context and output ceilings for one model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelInfo {
    /// Model identifier.
    pub id: String,
    /// Context window in tokens.
    pub context_length: u32,
    /// Output ceiling in tokens, when known.
    pub max_output_tokens: Option<u32>,
}

/// Result of a provider health check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthStatus {
    /// Whether the provider considers itself usable.
    pub healthy: bool,
    /// Free-form detail, e.g. the wrapped tool's version line.
    pub detail: Option<String>,
}
