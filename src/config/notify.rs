//! Notification delivery configuration.
//!
//! Process-wide defaults for the two delivery channels. Per-tenant
//! credentials stored on the company record take precedence field by field;
//! anything the tenant leaves blank falls back to these values.

use serde::Deserialize;

use super::error::ValidationError;

/// Notification defaults (Telegram bot + SMTP).
#[derive(Debug, Clone, Deserialize)]
pub struct NotifyConfig {
    /// Default Telegram bot token used when a tenant has none
    pub bot_token: Option<String>,

    /// Default manager chat id for bot notifications
    pub manager_chat_id: Option<String>,

    /// Default destination address for email notifications
    pub notify_email: Option<String>,

    /// SMTP relay host
    pub smtp_host: String,

    /// SMTP relay port
    #[serde(default = "default_smtp_port")]
    pub smtp_port: u16,

    /// SMTP username
    pub smtp_username: String,

    /// SMTP password
    pub smtp_password: String,

    /// From address for outgoing notification mail
    pub from_email: String,

    /// Bounded notification queue capacity
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,

    /// Number of notification worker tasks
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// Exchanges included in the notification report
    #[serde(default = "default_report_history")]
    pub report_history: usize,
}

/// SMTP connection parameters, extracted for the mail sender.
#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub from_email: String,
}

impl NotifyConfig {
    /// SMTP parameters for the mail sender adapter.
    pub fn smtp(&self) -> SmtpConfig {
        SmtpConfig {
            host: self.smtp_host.clone(),
            port: self.smtp_port,
            username: self.smtp_username.clone(),
            password: self.smtp_password.clone(),
            from_email: self.from_email.clone(),
        }
    }

    /// Validate notification configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.smtp_host.is_empty() {
            return Err(ValidationError::MissingRequired("SMTP_HOST"));
        }
        if self.smtp_port == 0 {
            return Err(ValidationError::InvalidSmtpPort);
        }
        if self.smtp_username.is_empty() {
            return Err(ValidationError::MissingRequired("SMTP_USERNAME"));
        }
        if self.smtp_password.is_empty() {
            return Err(ValidationError::MissingRequired("SMTP_PASSWORD"));
        }
        if !self.from_email.contains('@') {
            return Err(ValidationError::InvalidFromEmail);
        }
        if let Some(email) = &self.notify_email {
            if !email.contains('@') {
                return Err(ValidationError::InvalidNotifyEmail);
            }
        }
        if self.queue_capacity == 0 {
            return Err(ValidationError::InvalidQueueCapacity);
        }
        if self.workers == 0 {
            return Err(ValidationError::InvalidWorkerCount);
        }
        Ok(())
    }
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            bot_token: None,
            manager_chat_id: None,
            notify_email: None,
            smtp_host: String::new(),
            smtp_port: default_smtp_port(),
            smtp_username: String::new(),
            smtp_password: String::new(),
            from_email: String::new(),
            queue_capacity: default_queue_capacity(),
            workers: default_workers(),
            report_history: default_report_history(),
        }
    }
}

fn default_smtp_port() -> u16 {
    587
}

fn default_queue_capacity() -> usize {
    256
}

fn default_workers() -> usize {
    2
}

fn default_report_history() -> usize {
    10
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> NotifyConfig {
        NotifyConfig {
            smtp_host: "smtp.example.com".to_string(),
            smtp_username: "bot@example.com".to_string(),
            smtp_password: "secret".to_string(),
            from_email: "bot@example.com".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_valid_config_passes() {
        assert!(valid_config().validate().is_ok());
    }

    #[test]
    fn test_missing_smtp_host_rejected() {
        let config = NotifyConfig {
            smtp_host: String::new(),
            ..valid_config()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_from_email_rejected() {
        let config = NotifyConfig {
            from_email: "not-an-address".to_string(),
            ..valid_config()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_notify_email_rejected() {
        let config = NotifyConfig {
            notify_email: Some("broken".to_string()),
            ..valid_config()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_queue_capacity_rejected() {
        let config = NotifyConfig {
            queue_capacity: 0,
            ..valid_config()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_smtp_view_copies_fields() {
        let smtp = valid_config().smtp();
        assert_eq!(smtp.host, "smtp.example.com");
        assert_eq!(smtp.port, 587);
    }
}
