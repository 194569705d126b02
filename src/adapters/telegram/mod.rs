//! Telegram adapter - Bot API sender and webhook update types.
//!
//! The sender speaks the plain HTTPS Bot API so it can act for any
//! tenant's token; no long-lived bot state is kept.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::ports::{BotSender, SendError};

/// Default Bot API host.
const DEFAULT_API_BASE: &str = "https://api.telegram.org";

/// Telegram Bot API implementation of BotSender.
pub struct TelegramSender {
    client: Client,
    api_base: String,
}

impl TelegramSender {
    /// Creates a sender against the public Bot API.
    pub fn new(timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            api_base: DEFAULT_API_BASE.to_string(),
        }
    }

    /// Overrides the API host (test servers).
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }
}

impl Default for TelegramSender {
    fn default() -> Self {
        Self::new(Duration::from_secs(15))
    }
}

#[async_trait]
impl BotSender for TelegramSender {
    async fn send_message(
        &self,
        token: &str,
        chat_id: &str,
        html_text: &str,
    ) -> Result<(), SendError> {
        if token.is_empty() || chat_id.is_empty() {
            return Err(SendError::InvalidRecipient(
                "missing bot token or chat id".to_string(),
            ));
        }

        let url = format!("{}/bot{token}/sendMessage", self.api_base);
        let payload = SendMessagePayload {
            chat_id,
            text: html_text,
            parse_mode: "HTML",
        };

        let response = self
            .client
            .post(url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| SendError::Network(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        Err(SendError::Rejected {
            status: status.as_u16(),
            message: body,
        })
    }
}

#[derive(Debug, Serialize)]
struct SendMessagePayload<'a> {
    chat_id: &'a str,
    text: &'a str,
    parse_mode: &'a str,
}

// ---------------------------------------------------------------------------
// Webhook update types
// ---------------------------------------------------------------------------

/// Incoming Bot API update, reduced to the fields the engine consumes.
#[derive(Debug, Clone, Deserialize)]
pub struct TelegramUpdate {
    pub message: Option<TelegramMessage>,
    pub callback_query: Option<TelegramCallbackQuery>,
}

/// An inbound chat message.
#[derive(Debug, Clone, Deserialize)]
pub struct TelegramMessage {
    pub chat: TelegramChat,
    pub from: Option<TelegramUser>,
    pub text: Option<String>,
}

/// A button press on an inline keyboard.
#[derive(Debug, Clone, Deserialize)]
pub struct TelegramCallbackQuery {
    pub from: TelegramUser,
    pub message: Option<TelegramMessage>,
    pub data: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TelegramChat {
    pub id: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TelegramUser {
    pub id: i64,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub language_code: Option<String>,
}

impl TelegramUpdate {
    /// The chat the reply should go to, for either update shape.
    pub fn chat_id(&self) -> Option<i64> {
        if let Some(message) = &self.message {
            return Some(message.chat.id);
        }
        self.callback_query
            .as_ref()
            .and_then(|q| q.message.as_ref())
            .map(|m| m.chat.id)
    }

    /// The acting user's username, when Telegram supplies one.
    pub fn username(&self) -> Option<&str> {
        if let Some(message) = &self.message {
            return message.from.as_ref().and_then(|u| u.username.as_deref());
        }
        self.callback_query
            .as_ref()
            .and_then(|q| q.from.username.as_deref())
    }

    /// The acting user's interface language, when Telegram supplies one.
    pub fn language_code(&self) -> Option<&str> {
        if let Some(message) = &self.message {
            return message
                .from
                .as_ref()
                .and_then(|u| u.language_code.as_deref());
        }
        self.callback_query
            .as_ref()
            .and_then(|q| q.from.language_code.as_deref())
    }
}
