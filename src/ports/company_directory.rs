//! Company directory port - read-only tenant credential lookup.
//!
//! Companies are owned by an external collaborator; this engine only
//! reads their delivery and oracle credentials. Every field is optional:
//! resolution falls back to process-wide defaults field by field.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::foundation::CompanyId;

/// Per-tenant credentials as stored on the company record.
#[derive(Debug, Clone, Default)]
pub struct CompanyProfile {
    pub id: i64,
    /// Display name for reports.
    pub name: Option<String>,
    /// Tenant-owned Telegram bot token.
    pub bot_token: Option<String>,
    /// Chat the sales staff reads.
    pub manager_chat_id: Option<String>,
    /// Destination for email notifications.
    pub notify_email: Option<String>,
    /// Tenant-owned completion endpoint.
    pub ai_base_url: Option<String>,
    /// Key for the tenant-owned endpoint.
    pub ai_api_key: Option<String>,
}

/// Directory lookup errors.
#[derive(Debug, Clone, Error)]
pub enum DirectoryError {
    #[error("company directory database error: {0}")]
    Database(String),
}

/// Port for tenant credential lookup.
#[async_trait]
pub trait CompanyDirectory: Send + Sync {
    /// Finds the company record, if any.
    ///
    /// An unknown company is not an error; callers fall back to
    /// process-wide defaults.
    async fn find(&self, id: CompanyId) -> Result<Option<CompanyProfile>, DirectoryError>;
}
