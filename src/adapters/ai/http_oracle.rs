//! HTTP oracle - AiOracle over an OpenAI-compatible chat-completions API.
//!
//! # Configuration
//!
//! ```ignore
//! let config = HttpOracleConfig::new(api_key)
//!     .with_model("gpt-4o-mini")
//!     .with_base_url("https://api.openai.com/v1");
//!
//! let oracle = HttpOracle::new(config);
//! ```
//!
//! Tenants carrying their own endpoint and key override the defaults per
//! request; everything else (model, timeout) stays process-wide.

use async_trait::async_trait;
use reqwest::{Client, Response};
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::AiConfig;
use crate::ports::{AiOracle, OracleError, OracleRequest, OracleRole};

/// Configuration for the HTTP oracle.
#[derive(Debug, Clone)]
pub struct HttpOracleConfig {
    /// Default API key.
    api_key: Secret<String>,
    /// Model to request.
    pub model: String,
    /// Default base URL (OpenAI-compatible).
    pub base_url: String,
    /// Request timeout.
    pub timeout: Duration,
    /// Maximum tokens per completion.
    pub max_tokens: u32,
}

impl HttpOracleConfig {
    /// Creates a new configuration with the given API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: Secret::new(api_key.into()),
            model: "gpt-4o-mini".to_string(),
            base_url: "https://api.openai.com/v1".to_string(),
            timeout: Duration::from_secs(30),
            max_tokens: 512,
        }
    }

    /// Builds a configuration from the application config section.
    pub fn from_app_config(config: &AiConfig) -> Self {
        Self {
            api_key: Secret::new(config.api_key.clone()),
            model: config.model.clone(),
            base_url: config.base_url.clone(),
            timeout: config.timeout(),
            max_tokens: config.max_tokens,
        }
    }

    /// Sets the model to use.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Sets the base URL.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Exposes the default API key (for making requests).
    fn api_key(&self) -> &str {
        self.api_key.expose_secret()
    }
}

/// AiOracle implementation over an OpenAI-compatible API.
pub struct HttpOracle {
    config: HttpOracleConfig,
    client: Client,
}

impl HttpOracle {
    /// Creates a new HTTP oracle with the given configuration.
    pub fn new(config: HttpOracleConfig) -> Self {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .expect("Failed to create HTTP client");

        Self { config, client }
    }

    /// Converts our request to the wire format.
    fn to_wire_request(&self, request: &OracleRequest) -> WireRequest {
        let mut messages = Vec::new();

        if let Some(ref prompt) = request.system_prompt {
            messages.push(WireMessage {
                role: "system".to_string(),
                content: prompt.clone(),
            });
        }

        for msg in &request.messages {
            messages.push(WireMessage {
                role: match msg.role {
                    OracleRole::System => "system",
                    OracleRole::User => "user",
                    OracleRole::Assistant => "assistant",
                }
                .to_string(),
                content: msg.content.clone(),
            });
        }

        WireRequest {
            model: self.config.model.clone(),
            messages,
            max_tokens: Some(self.config.max_tokens),
        }
    }

    /// Parses the API response status and maps errors.
    async fn handle_response_status(&self, response: Response) -> Result<Response, OracleError> {
        let status = response.status();

        if status.is_success() {
            return Ok(response);
        }

        let error_body = response.text().await.unwrap_or_default();

        match status.as_u16() {
            401 | 403 => Err(OracleError::AuthenticationFailed),
            400 => Err(OracleError::InvalidRequest(error_body)),
            500..=599 => Err(OracleError::unavailable(format!(
                "server error {status}: {error_body}"
            ))),
            _ => Err(OracleError::network(format!(
                "unexpected status {status}: {error_body}"
            ))),
        }
    }
}

#[async_trait]
impl AiOracle for HttpOracle {
    async fn complete(&self, request: OracleRequest) -> Result<String, OracleError> {
        if request.messages.is_empty() {
            return Err(OracleError::InvalidRequest(
                "completion request has no messages".to_string(),
            ));
        }

        let (base_url, api_key) = match &request.endpoint {
            Some(endpoint) => (endpoint.base_url.clone(), endpoint.api_key.clone()),
            None => (
                self.config.base_url.clone(),
                self.config.api_key().to_string(),
            ),
        };
        let url = format!("{}/chat/completions", base_url.trim_end_matches('/'));
        let wire_request = self.to_wire_request(&request);

        let response = self
            .client
            .post(url)
            .header("Authorization", format!("Bearer {api_key}"))
            .header("Content-Type", "application/json")
            .json(&wire_request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    OracleError::Timeout {
                        timeout_secs: self.config.timeout.as_secs() as u32,
                    }
                } else if e.is_connect() {
                    OracleError::network(format!("connection failed: {e}"))
                } else {
                    OracleError::network(e.to_string())
                }
            })?;

        let response = self.handle_response_status(response).await?;

        let parsed: WireResponse = response
            .json()
            .await
            .map_err(|e| OracleError::parse(e.to_string()))?;

        parsed
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .filter(|content| !content.is_empty())
            .ok_or_else(|| OracleError::parse("response carried no completion".to_string()))
    }
}

// Wire format (OpenAI chat completions).

#[derive(Debug, Serialize)]
struct WireRequest {
    model: String,
    messages: Vec<WireMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Debug, Serialize, Deserialize)]
struct WireMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct WireResponse {
    choices: Vec<WireChoice>,
}

#[derive(Debug, Deserialize)]
struct WireChoice {
    message: WireMessage,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::OracleEndpoint;

    #[test]
    fn config_builder_sets_fields() {
        let config = HttpOracleConfig::new("sk-test")
            .with_model("custom-model")
            .with_base_url("https://example.test/v1")
            .with_timeout(Duration::from_secs(5));

        assert_eq!(config.model, "custom-model");
        assert_eq!(config.base_url, "https://example.test/v1");
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert_eq!(config.api_key(), "sk-test");
    }

    #[test]
    fn wire_request_prepends_system_prompt() {
        let oracle = HttpOracle::new(HttpOracleConfig::new("sk-test"));
        let request = OracleRequest::new()
            .with_system_prompt("Be brief")
            .with_message(OracleRole::User, "Hello");

        let wire = oracle.to_wire_request(&request);

        assert_eq!(wire.messages.len(), 2);
        assert_eq!(wire.messages[0].role, "system");
        assert_eq!(wire.messages[0].content, "Be brief");
        assert_eq!(wire.messages[1].role, "user");
    }

    #[tokio::test]
    async fn empty_request_is_rejected() {
        let oracle = HttpOracle::new(HttpOracleConfig::new("sk-test"));
        let err = oracle.complete(OracleRequest::new()).await.unwrap_err();
        assert!(matches!(err, OracleError::InvalidRequest(_)));
    }

    #[test]
    fn endpoint_override_changes_target() {
        let request = OracleRequest::new()
            .with_message(OracleRole::User, "hi")
            .with_endpoint(Some(OracleEndpoint {
                base_url: "https://tenant.example/v1/".to_string(),
                api_key: "sk-tenant".to_string(),
            }));

        let endpoint = request.endpoint.as_ref().unwrap();
        let url = format!("{}/chat/completions", endpoint.base_url.trim_end_matches('/'));
        assert_eq!(url, "https://tenant.example/v1/chat/completions");
    }

    #[test]
    fn wire_response_parses_openai_shape() {
        let body = r#"{
            "choices": [
                {"message": {"role": "assistant", "content": "Hello there"}}
            ]
        }"#;
        let parsed: WireResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.choices[0].message.content, "Hello there");
    }
}
