//! Email adapter - SMTP implementation of MailSender.
//!
//! Notifications go out as multipart plain-text + HTML over the relay
//! configured in the notify section. The transport is built per send;
//! notification volume is one message per confirmed lead, not worth a
//! pooled connection.

use async_trait::async_trait;
use lettre::message::{header::ContentType, Mailbox, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use crate::config::SmtpConfig;
use crate::ports::{MailSender, SendError};

/// SMTP implementation of MailSender.
pub struct SmtpMailSender {
    config: SmtpConfig,
}

impl SmtpMailSender {
    /// Creates a sender over the given relay parameters.
    pub fn new(config: SmtpConfig) -> Self {
        Self { config }
    }

    fn transport(&self) -> Result<AsyncSmtpTransport<Tokio1Executor>, SendError> {
        Ok(
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&self.config.host)
                .map_err(|e| SendError::Transport(format!("SMTP relay setup failed: {e}")))?
                .port(self.config.port)
                .credentials(Credentials::new(
                    self.config.username.clone(),
                    self.config.password.clone(),
                ))
                .build(),
        )
    }
}

#[async_trait]
impl MailSender for SmtpMailSender {
    async fn send(
        &self,
        to: &str,
        subject: &str,
        text_body: &str,
        html_body: &str,
    ) -> Result<(), SendError> {
        let from: Mailbox = self
            .config
            .from_email
            .parse()
            .map_err(|e| SendError::InvalidRecipient(format!("bad from address: {e}")))?;
        let to: Mailbox = to
            .parse()
            .map_err(|e| SendError::InvalidRecipient(format!("bad recipient: {e}")))?;

        let message = Message::builder()
            .from(from)
            .to(to)
            .subject(subject)
            .multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_PLAIN)
                            .body(text_body.to_string()),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_HTML)
                            .body(html_body.to_string()),
                    ),
            )
            .map_err(|e| SendError::Transport(format!("failed to build message: {e}")))?;

        self.transport()?
            .send(message)
            .await
            .map_err(|e| SendError::Transport(format!("SMTP send failed: {e}")))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sender() -> SmtpMailSender {
        SmtpMailSender::new(SmtpConfig {
            host: "smtp.example.com".to_string(),
            port: 587,
            username: "bot@example.com".to_string(),
            password: "secret".to_string(),
            from_email: "bot@example.com".to_string(),
        })
    }

    #[tokio::test]
    async fn invalid_recipient_fails_before_any_network_io() {
        let err = sender()
            .send("not-an-address", "subject", "text", "<b>html</b>")
            .await
            .unwrap_err();
        assert!(matches!(err, SendError::InvalidRecipient(_)));
    }

    #[test]
    fn transport_builds_for_valid_config() {
        assert!(sender().transport().is_ok());
    }
}
