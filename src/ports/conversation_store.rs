//! Conversation store port - lead and interaction persistence.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::foundation::{CompanyId, LeadId};
use crate::domain::lead::{Channel, ContactInfo, HistoryEntry, InteractionKind, Lead};

/// Persistence errors.
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    /// Underlying database failure. Hard failure of the current turn.
    #[error("store database error: {0}")]
    Database(String),

    /// Lead disappeared between load and write.
    #[error("lead not found: {0}")]
    NotFound(LeadId),
}

/// Port owning Lead and Interaction persistence.
///
/// One non-deleted lead exists per `(company, external identity)`;
/// interactions are append-only and ordered by creation time.
#[async_trait]
pub trait ConversationStore: Send + Sync {
    /// Looks up or creates the lead for an identity.
    ///
    /// Numeric user keys identify native chat users and are matched
    /// against the external id column; anything else is treated as an
    /// opaque web visitor token matched inside the contact document.
    ///
    /// With `reset`, an existing lead and all its interactions are
    /// deleted outright and a fresh lead is created. Destructive by
    /// contract: new-session semantics, not archival.
    async fn get_or_create_lead(
        &self,
        company_id: CompanyId,
        user_key: &str,
        username: Option<&str>,
        channel: &Channel,
        reset: bool,
    ) -> Result<Lead, StoreError>;

    /// Appends one exchange unit. Never edited or removed afterwards,
    /// except by the reset above.
    async fn append_interaction(
        &self,
        lead_id: LeadId,
        kind: InteractionKind,
        content: &str,
        outcome: &str,
    ) -> Result<(), StoreError>;

    /// Replays interactions oldest-to-newest as readable history lines,
    /// sentinels dropped, keeping only the most recent `limit` lines.
    async fn load_history(
        &self,
        lead_id: LeadId,
        limit: usize,
    ) -> Result<Vec<HistoryEntry>, StoreError>;

    /// Writes the contact document back.
    async fn update_contact(
        &self,
        lead_id: LeadId,
        contact: &ContactInfo,
    ) -> Result<(), StoreError>;

    /// Confirms the lead with a single conditional update.
    ///
    /// The lifecycle status moves to confirmed and the contact document
    /// is written, but only when the lead has not already passed the
    /// confirmation gate. Returns true when exactly one row was
    /// affected - the caller's license to classify and notify. Under
    /// concurrent delivery of two messages for the same lead, exactly
    /// one caller sees true.
    async fn confirm(&self, lead_id: LeadId, contact: &ContactInfo) -> Result<bool, StoreError>;

    /// Persists the classified temperature onto the lead.
    async fn set_temperature(
        &self,
        lead_id: LeadId,
        contact: &ContactInfo,
    ) -> Result<(), StoreError>;
}
