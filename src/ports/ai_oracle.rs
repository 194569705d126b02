//! AI Oracle port - interface for the chat-completion capability.
//!
//! The oracle is consumed as a black box: given ordered messages it
//! returns a natural-language reply; given a classification prompt it
//! returns a short narrative answer. Callers recover from failures with
//! neutral fallbacks, so implementations surface errors rather than
//! inventing text.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Port for AI oracle interactions.
///
/// Implementations connect to external completion services and translate
/// between the provider API and this message format.
#[async_trait]
pub trait AiOracle: Send + Sync {
    /// Generate a completion for the given request.
    async fn complete(&self, request: OracleRequest) -> Result<String, OracleError>;
}

/// A message in the conversation sent to the oracle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OracleMessage {
    /// Who sent this message.
    pub role: OracleRole,
    /// Message content.
    pub content: String,
}

impl OracleMessage {
    /// Creates a new message.
    pub fn new(role: OracleRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    /// Creates a user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(OracleRole::User, content)
    }

    /// Creates an assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(OracleRole::Assistant, content)
    }
}

/// Role of the message sender.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OracleRole {
    /// System instructions (guides model behavior).
    System,
    /// Visitor input.
    User,
    /// Engine response.
    Assistant,
}

/// Per-tenant endpoint override.
///
/// Tenants may carry their own completion endpoint and key; when absent
/// the adapter falls back to its process-wide defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OracleEndpoint {
    pub base_url: String,
    pub api_key: String,
}

/// Request for an oracle completion.
#[derive(Debug, Clone, Default)]
pub struct OracleRequest {
    /// Conversation messages, ending with the latest user turn.
    pub messages: Vec<OracleMessage>,
    /// System prompt to guide model behavior.
    pub system_prompt: Option<String>,
    /// Tenant endpoint override, when the company carries its own.
    pub endpoint: Option<OracleEndpoint>,
}

impl OracleRequest {
    /// Creates an empty request.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a message to the conversation.
    pub fn with_message(mut self, role: OracleRole, content: impl Into<String>) -> Self {
        self.messages.push(OracleMessage::new(role, content));
        self
    }

    /// Sets the system prompt.
    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }

    /// Sets the tenant endpoint override.
    pub fn with_endpoint(mut self, endpoint: Option<OracleEndpoint>) -> Self {
        self.endpoint = endpoint;
        self
    }
}

/// AI oracle errors.
#[derive(Debug, Clone, thiserror::Error)]
pub enum OracleError {
    /// Request timed out.
    #[error("oracle request timed out after {timeout_secs}s")]
    Timeout {
        /// Configured timeout.
        timeout_secs: u32,
    },

    /// Endpoint is unavailable (5xx or connection refused).
    #[error("oracle unavailable: {message}")]
    Unavailable {
        /// Error details.
        message: String,
    },

    /// API key or authentication failed.
    #[error("oracle authentication failed")]
    AuthenticationFailed,

    /// Network error during request.
    #[error("oracle network error: {0}")]
    Network(String),

    /// Failed to parse the endpoint response.
    #[error("oracle parse error: {0}")]
    Parse(String),

    /// Invalid request configuration.
    #[error("invalid oracle request: {0}")]
    InvalidRequest(String),
}

impl OracleError {
    /// Creates an unavailable error.
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
        }
    }

    /// Creates a network error.
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network(message.into())
    }

    /// Creates a parse error.
    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse(message.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_builder_accumulates_messages() {
        let request = OracleRequest::new()
            .with_system_prompt("Be helpful")
            .with_message(OracleRole::User, "Hello");

        assert_eq!(request.messages.len(), 1);
        assert_eq!(request.messages[0].role, OracleRole::User);
        assert_eq!(request.system_prompt.as_deref(), Some("Be helpful"));
        assert!(request.endpoint.is_none());
    }

    #[test]
    fn endpoint_override_is_carried() {
        let request = OracleRequest::new().with_endpoint(Some(OracleEndpoint {
            base_url: "https://tenant.example/v1".to_string(),
            api_key: "sk-tenant".to_string(),
        }));

        assert_eq!(
            request.endpoint.unwrap().base_url,
            "https://tenant.example/v1"
        );
    }

    #[test]
    fn role_serializes_lowercase() {
        let json = serde_json::to_string(&OracleRole::Assistant).unwrap();
        assert_eq!(json, "\"assistant\"");
    }

    #[test]
    fn errors_display_their_context() {
        let err = OracleError::Timeout { timeout_secs: 30 };
        assert_eq!(err.to_string(), "oracle request timed out after 30s");
    }
}
