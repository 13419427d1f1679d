//! LLM provider abstraction.
//!
//! The runtime never builds HTTP requests itself. A host application plugs in
//! an [`LlmProvider`] that turns chat messages into raw reply text, and
//! reports failures as [`ProviderError`]s the classifier understands.
//!
//! ## Security
//!
//! Credentials reach providers only as [`ApiCredential`]s from the
//! [`secrets`] module; see there for the handling rules.

use async_trait::async_trait;
use nutriguard_core::{Failure, TransportFailure};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

pub mod secrets;

pub use secrets::{
    ApiCredential, CredentialSource, CredentialStore, EnvCredentialStore, StaticCredentialStore,
};

/// Errors from LLM providers.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProviderError {
    #[error("Network is offline")]
    Offline,

    #[error("Timeout after {0:?}")]
    Timeout(Duration),

    #[error("Host unreachable: {0}")]
    Unreachable(String),

    #[error("Request cancelled")]
    Cancelled,

    #[error("API error: {status} - {message}")]
    Status { status: u16, message: String },

    #[error("Provider error: {0}")]
    Other(String),
}

impl From<ProviderError> for Failure {
    fn from(error: ProviderError) -> Self {
        match error {
            ProviderError::Offline => Failure::Transport(TransportFailure::Offline),
            ProviderError::Timeout(_) => Failure::Transport(TransportFailure::TimedOut),
            ProviderError::Unreachable(_) => Failure::Transport(TransportFailure::HostUnreachable),
            ProviderError::Cancelled => Failure::Transport(TransportFailure::Cancelled),
            ProviderError::Status { status, .. } => Failure::Upstream { status },
            ProviderError::Other(message) => Failure::Unrecognized(message),
        }
    }
}

/// Configuration for a completion request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompletionConfig {
    /// Model to use
    pub model: String,

    /// Maximum tokens to generate
    pub max_tokens: u32,

    /// Temperature (0.0 for deterministic)
    pub temperature: f32,

    /// Request timeout, enforced by the runtime around each call
    #[serde(with = "crate::config::duration_str")]
    pub timeout: Duration,
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            model: "claude-haiku-4-5".to_string(),
            max_tokens: 300,
            temperature: 0.0,
            timeout: Duration::from_secs(30),
        }
    }
}

/// A chat message for LLM completion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Role: "system", "user", or "assistant"
    pub role: String,

    /// Message content
    pub content: String,
}

impl ChatMessage {
    /// Create a system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    /// Create a user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }

    /// Create an assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: "assistant".to_string(),
            content: content.into(),
        }
    }
}

/// Raw reply from an LLM completion.
#[derive(Debug, Clone)]
pub struct CompletionResponse {
    /// Generated text, untrusted
    pub content: String,

    /// Model used
    pub model: String,

    /// Stop reason
    pub stop_reason: Option<String>,
}

/// Provider abstraction allows swapping LLM backends.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Execute a chat completion.
    async fn complete(
        &self,
        credential: &ApiCredential,
        messages: Vec<ChatMessage>,
        config: &CompletionConfig,
    ) -> Result<CompletionResponse, ProviderError>;

    /// Get provider name for logs.
    fn name(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;
    use nutriguard_core::{ErrorClassifier, ErrorKind, StatusCategory};

    #[test]
    fn test_chat_message_creation() {
        let system = ChatMessage::system("You are a nutrition assistant.");
        assert_eq!(system.role, "system");

        let user = ChatMessage::user("Two eggs");
        assert_eq!(user.role, "user");

        let assistant = ChatMessage::assistant("{}");
        assert_eq!(assistant.role, "assistant");
    }

    #[test]
    fn test_provider_errors_map_to_failures() {
        assert_eq!(
            Failure::from(ProviderError::Timeout(Duration::from_secs(5))),
            Failure::Transport(TransportFailure::TimedOut)
        );
        assert_eq!(
            Failure::from(ProviderError::Unreachable("api.example.com".to_string())),
            Failure::Transport(TransportFailure::HostUnreachable)
        );
        assert_eq!(
            Failure::from(ProviderError::Status {
                status: 429,
                message: "slow down".to_string()
            }),
            Failure::Upstream { status: 429 }
        );
        assert_eq!(
            Failure::from(ProviderError::Other("weird".to_string())),
            Failure::Unrecognized("weird".to_string())
        );
    }

    #[test]
    fn test_throttled_status_is_retryable() {
        let failure = Failure::from(ProviderError::Status {
            status: 429,
            message: String::new(),
        });
        let record = ErrorClassifier::new().classify(&failure, "food_analysis");
        assert_eq!(
            record.kind(),
            ErrorKind::UpstreamError {
                status_category: StatusCategory::Throttled
            }
        );
        assert!(record.is_retryable());
    }
}
