//! PostgreSQL implementation of ConversationStore.
//!
//! Leads live in one row each with the contact document as JSONB;
//! interactions are append-only child rows ordered by creation time.

use async_trait::async_trait;
use sqlx::types::Json;
use sqlx::{PgPool, Row};

use crate::domain::foundation::{CompanyId, InteractionId, LeadId, Timestamp};
use crate::domain::lead::{
    flatten_history, Channel, ContactInfo, HistoryEntry, Interaction, InteractionKind, Lead,
    LeadStatus,
};
use crate::ports::{ConversationStore, StoreError};

/// PostgreSQL implementation of ConversationStore.
#[derive(Clone)]
pub struct PostgresConversationStore {
    pool: PgPool,
}

impl PostgresConversationStore {
    /// Creates a new PostgresConversationStore.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn find_lead(
        &self,
        company_id: CompanyId,
        user_key: &str,
        numeric_identity: bool,
    ) -> Result<Option<Lead>, StoreError> {
        let query = if numeric_identity {
            sqlx::query(
                r#"
                SELECT id, company_id, external_user_id, contact_info, status, source,
                       created_at, updated_at
                FROM leads
                WHERE company_id = $1 AND external_user_id = $2
                "#,
            )
        } else {
            sqlx::query(
                r#"
                SELECT id, company_id, external_user_id, contact_info, status, source,
                       created_at, updated_at
                FROM leads
                WHERE company_id = $1 AND contact_info->>'visitor_id' = $2
                "#,
            )
        };

        let row = query
            .bind(company_id.as_i64())
            .bind(user_key)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| StoreError::Database(format!("Failed to fetch lead: {e}")))?;

        row.map(map_lead).transpose()
    }

    async fn delete_lead(&self, lead_id: LeadId) -> Result<(), StoreError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| StoreError::Database(format!("Failed to start transaction: {e}")))?;

        sqlx::query("DELETE FROM interactions WHERE lead_id = $1")
            .bind(lead_id.as_uuid())
            .execute(&mut *tx)
            .await
            .map_err(|e| StoreError::Database(format!("Failed to delete interactions: {e}")))?;

        sqlx::query("DELETE FROM leads WHERE id = $1")
            .bind(lead_id.as_uuid())
            .execute(&mut *tx)
            .await
            .map_err(|e| StoreError::Database(format!("Failed to delete lead: {e}")))?;

        tx.commit()
            .await
            .map_err(|e| StoreError::Database(format!("Failed to commit transaction: {e}")))?;

        Ok(())
    }

    async fn insert_lead(&self, lead: &Lead) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO leads (
                id, company_id, external_user_id, contact_info, status, source,
                created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(lead.id().as_uuid())
        .bind(lead.company_id().as_i64())
        .bind(lead.external_user_id())
        .bind(Json(lead.contact()))
        .bind(lead.status().as_str())
        .bind(lead.source().as_str())
        .bind(lead.created_at().as_datetime())
        .bind(lead.updated_at().as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::Database(format!("Failed to insert lead: {e}")))?;

        Ok(())
    }
}

#[async_trait]
impl ConversationStore for PostgresConversationStore {
    async fn get_or_create_lead(
        &self,
        company_id: CompanyId,
        user_key: &str,
        username: Option<&str>,
        channel: &Channel,
        reset: bool,
    ) -> Result<Lead, StoreError> {
        // Numeric keys are native chat identities; anything else - a
        // malformed id included - takes the anonymous web visitor path.
        let numeric_identity = !user_key.is_empty() && user_key.chars().all(|c| c.is_ascii_digit());

        if let Some(lead) = self.find_lead(company_id, user_key, numeric_identity).await? {
            if !reset {
                return Ok(lead);
            }
            // Full destructive reset: the lead and its interactions go.
            self.delete_lead(lead.id()).await?;
        }

        let contact = ContactInfo {
            username: username.map(str::to_string),
            visitor_id: (!numeric_identity).then(|| user_key.to_string()),
            ..Default::default()
        };
        let lead = Lead::new(company_id, user_key, channel.clone(), contact);
        self.insert_lead(&lead).await?;
        Ok(lead)
    }

    async fn append_interaction(
        &self,
        lead_id: LeadId,
        kind: InteractionKind,
        content: &str,
        outcome: &str,
    ) -> Result<(), StoreError> {
        let interaction = Interaction::new(lead_id, kind, content, outcome);

        sqlx::query(
            r#"
            INSERT INTO interactions (id, lead_id, kind, content, outcome, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(interaction.id.as_uuid())
        .bind(interaction.lead_id.as_uuid())
        .bind(interaction.kind.as_str())
        .bind(&interaction.content)
        .bind(&interaction.outcome)
        .bind(interaction.created_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::Database(format!("Failed to insert interaction: {e}")))?;

        Ok(())
    }

    async fn load_history(
        &self,
        lead_id: LeadId,
        limit: usize,
    ) -> Result<Vec<HistoryEntry>, StoreError> {
        // Each interaction yields at most two lines, so the most recent
        // `limit` interactions are enough to fill the window.
        let rows = sqlx::query(
            r#"
            SELECT id, lead_id, kind, content, outcome, created_at
            FROM interactions
            WHERE lead_id = $1
            ORDER BY created_at DESC
            LIMIT $2
            "#,
        )
        .bind(lead_id.as_uuid())
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StoreError::Database(format!("Failed to fetch interactions: {e}")))?;

        let mut interactions = rows
            .into_iter()
            .map(map_interaction)
            .collect::<Result<Vec<_>, _>>()?;
        interactions.reverse();

        Ok(flatten_history(&interactions, limit))
    }

    async fn update_contact(
        &self,
        lead_id: LeadId,
        contact: &ContactInfo,
    ) -> Result<(), StoreError> {
        let result = sqlx::query(
            "UPDATE leads SET contact_info = $2, updated_at = now() WHERE id = $1",
        )
        .bind(lead_id.as_uuid())
        .bind(Json(contact))
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::Database(format!("Failed to update contact: {e}")))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(lead_id));
        }
        Ok(())
    }

    async fn confirm(&self, lead_id: LeadId, contact: &ContactInfo) -> Result<bool, StoreError> {
        // Single conditional update: under concurrent confirmation of
        // the same lead exactly one caller sees rows_affected == 1.
        let result = sqlx::query(
            r#"
            UPDATE leads
            SET status = 'confirmed', contact_info = $2, updated_at = now()
            WHERE id = $1 AND status NOT IN ('confirmed', 'contacted')
            "#,
        )
        .bind(lead_id.as_uuid())
        .bind(Json(contact))
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::Database(format!("Failed to confirm lead: {e}")))?;

        Ok(result.rows_affected() == 1)
    }

    async fn set_temperature(
        &self,
        lead_id: LeadId,
        contact: &ContactInfo,
    ) -> Result<(), StoreError> {
        self.update_contact(lead_id, contact).await
    }
}

fn map_lead(row: sqlx::postgres::PgRow) -> Result<Lead, StoreError> {
    let id: uuid::Uuid = row
        .try_get("id")
        .map_err(|e| StoreError::Database(format!("Bad lead row: {e}")))?;
    let company_id: i64 = row
        .try_get("company_id")
        .map_err(|e| StoreError::Database(format!("Bad lead row: {e}")))?;
    let external_user_id: String = row
        .try_get("external_user_id")
        .map_err(|e| StoreError::Database(format!("Bad lead row: {e}")))?;
    let Json(contact): Json<ContactInfo> = row
        .try_get("contact_info")
        .map_err(|e| StoreError::Database(format!("Bad contact document: {e}")))?;
    let status: String = row
        .try_get("status")
        .map_err(|e| StoreError::Database(format!("Bad lead row: {e}")))?;
    let source: String = row
        .try_get("source")
        .map_err(|e| StoreError::Database(format!("Bad lead row: {e}")))?;
    let created_at: chrono::DateTime<chrono::Utc> = row
        .try_get("created_at")
        .map_err(|e| StoreError::Database(format!("Bad lead row: {e}")))?;
    let updated_at: chrono::DateTime<chrono::Utc> = row
        .try_get("updated_at")
        .map_err(|e| StoreError::Database(format!("Bad lead row: {e}")))?;

    let status: LeadStatus = status
        .parse()
        .map_err(|e: String| StoreError::Database(e))?;
    let source: Channel = source.parse().unwrap_or(Channel::Web);

    Ok(Lead::from_parts(
        LeadId::from_uuid(id),
        CompanyId::new(company_id),
        external_user_id,
        contact,
        status,
        source,
        Timestamp::from_datetime(created_at),
        Timestamp::from_datetime(updated_at),
    ))
}

fn map_interaction(row: sqlx::postgres::PgRow) -> Result<Interaction, StoreError> {
    let id: uuid::Uuid = row
        .try_get("id")
        .map_err(|e| StoreError::Database(format!("Bad interaction row: {e}")))?;
    let lead_id: uuid::Uuid = row
        .try_get("lead_id")
        .map_err(|e| StoreError::Database(format!("Bad interaction row: {e}")))?;
    let kind: String = row
        .try_get("kind")
        .map_err(|e| StoreError::Database(format!("Bad interaction row: {e}")))?;
    let content: String = row
        .try_get("content")
        .map_err(|e| StoreError::Database(format!("Bad interaction row: {e}")))?;
    let outcome: String = row
        .try_get("outcome")
        .map_err(|e| StoreError::Database(format!("Bad interaction row: {e}")))?;
    let created_at: chrono::DateTime<chrono::Utc> = row
        .try_get("created_at")
        .map_err(|e| StoreError::Database(format!("Bad interaction row: {e}")))?;

    let kind: InteractionKind = kind.parse().map_err(|e: String| StoreError::Database(e))?;

    Ok(Interaction {
        id: InteractionId::from_uuid(id),
        lead_id: LeadId::from_uuid(lead_id),
        kind,
        content,
        outcome,
        created_at: Timestamp::from_datetime(created_at),
    })
}
