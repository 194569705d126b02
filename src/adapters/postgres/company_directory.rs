//! PostgreSQL implementation of CompanyDirectory.
//!
//! Thin read-only lookup against the platform-owned companies table.

use async_trait::async_trait;
use sqlx::{PgPool, Row};

use crate::domain::foundation::CompanyId;
use crate::ports::{CompanyDirectory, CompanyProfile, DirectoryError};

/// PostgreSQL implementation of CompanyDirectory.
#[derive(Clone)]
pub struct PostgresCompanyDirectory {
    pool: PgPool,
}

impl PostgresCompanyDirectory {
    /// Creates a new PostgresCompanyDirectory.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CompanyDirectory for PostgresCompanyDirectory {
    async fn find(&self, id: CompanyId) -> Result<Option<CompanyProfile>, DirectoryError> {
        let row = sqlx::query(
            r#"
            SELECT id, name, bot_token, manager_chat_id, notify_email,
                   ai_base_url, ai_api_key
            FROM companies
            WHERE id = $1
            "#,
        )
        .bind(id.as_i64())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DirectoryError::Database(format!("Failed to fetch company: {e}")))?;

        let Some(row) = row else {
            return Ok(None);
        };

        let get_opt = |name: &str| -> Result<Option<String>, DirectoryError> {
            row.try_get(name)
                .map_err(|e| DirectoryError::Database(format!("Bad company row: {e}")))
        };

        Ok(Some(CompanyProfile {
            id: row
                .try_get("id")
                .map_err(|e| DirectoryError::Database(format!("Bad company row: {e}")))?,
            name: get_opt("name")?,
            bot_token: get_opt("bot_token")?,
            manager_chat_id: get_opt("manager_chat_id")?,
            notify_email: get_opt("notify_email")?,
            ai_base_url: get_opt("ai_base_url")?,
            ai_api_key: get_opt("ai_api_key")?,
        }))
    }
}
