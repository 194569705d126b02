//! Channel sender ports - the two notification delivery channels.
//!
//! Both senders are consumed by the dispatcher, which tolerates partial
//! failure: one channel failing never aborts the other.

use async_trait::async_trait;
use thiserror::Error;

/// Delivery errors, shared by both channels.
#[derive(Debug, Clone, Error)]
pub enum SendError {
    /// Network-level failure (connect, timeout).
    #[error("send network error: {0}")]
    Network(String),

    /// The remote service rejected the request.
    #[error("send rejected with status {status}: {message}")]
    Rejected {
        status: u16,
        message: String,
    },

    /// Recipient address/chat id could not be used.
    #[error("invalid recipient: {0}")]
    InvalidRecipient(String),

    /// Transport-level failure (SMTP session, TLS).
    #[error("transport error: {0}")]
    Transport(String),
}

/// Chat-bot message sender (Telegram Bot API shaped).
#[async_trait]
pub trait BotSender: Send + Sync {
    /// Sends an HTML-formatted message to a chat on behalf of a bot.
    async fn send_message(
        &self,
        token: &str,
        chat_id: &str,
        html_text: &str,
    ) -> Result<(), SendError>;
}

/// Email sender (SMTP shaped).
#[async_trait]
pub trait MailSender: Send + Sync {
    /// Sends a multipart plain-text + HTML message.
    async fn send(
        &self,
        to: &str,
        subject: &str,
        text_body: &str,
        html_body: &str,
    ) -> Result<(), SendError>;
}
