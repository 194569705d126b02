//! Lead aggregate and interaction records.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::foundation::{CompanyId, InteractionId, LeadId, Timestamp};

use super::contact_info::ContactInfo;

/// Coarse lifecycle of a lead, distinct from the confirmation sub-state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum LeadStatus {
    /// Created on first inbound message; still being qualified.
    #[default]
    New,

    /// Contact details confirmed; sales staff notified.
    Confirmed,

    /// Sales staff reached out. Set by external tooling, read here only
    /// as part of the double-notification guard.
    Contacted,
}

impl LeadStatus {
    /// Returns true once the lead has passed the confirmation gate.
    ///
    /// Leads in these states must never trigger another notification.
    pub fn is_past_confirmation(&self) -> bool {
        matches!(self, Self::Confirmed | Self::Contacted)
    }

    /// Storage representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::New => "new",
            Self::Confirmed => "confirmed",
            Self::Contacted => "contacted",
        }
    }
}

impl FromStr for LeadStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "new" => Ok(Self::New),
            "confirmed" => Ok(Self::Confirmed),
            "contacted" => Ok(Self::Contacted),
            other => Err(format!("unknown lead status: {other}")),
        }
    }
}

/// Channel a lead arrived through.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Channel {
    Telegram,
    Web,
    /// Any other social-channel identifier, stored verbatim.
    Social(String),
}

impl Channel {
    /// Storage representation.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Telegram => "telegram",
            Self::Web => "web",
            Self::Social(tag) => tag,
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Channel {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "telegram" => Self::Telegram,
            "web" => Self::Web,
            other => Self::Social(other.to_string()),
        })
    }
}

/// One visitor's contact-and-intent record for one tenant.
///
/// At most one non-deleted lead exists per `(company_id, external_user_id)`;
/// a new-session reset deletes the prior lead and its interactions outright.
#[derive(Debug, Clone)]
pub struct Lead {
    id: LeadId,
    company_id: CompanyId,
    external_user_id: String,
    contact: ContactInfo,
    status: LeadStatus,
    source: Channel,
    created_at: Timestamp,
    updated_at: Timestamp,
}

impl Lead {
    /// Creates a fresh lead for a first-time visitor.
    pub fn new(
        company_id: CompanyId,
        external_user_id: impl Into<String>,
        source: Channel,
        contact: ContactInfo,
    ) -> Self {
        let now = Timestamp::now();
        Self {
            id: LeadId::new(),
            company_id,
            external_user_id: external_user_id.into(),
            contact,
            status: LeadStatus::New,
            source,
            created_at: now,
            updated_at: now,
        }
    }

    /// Reconstructs a lead from storage.
    #[allow(clippy::too_many_arguments)]
    pub fn from_parts(
        id: LeadId,
        company_id: CompanyId,
        external_user_id: String,
        contact: ContactInfo,
        status: LeadStatus,
        source: Channel,
        created_at: Timestamp,
        updated_at: Timestamp,
    ) -> Self {
        Self {
            id,
            company_id,
            external_user_id,
            contact,
            status,
            source,
            created_at,
            updated_at,
        }
    }

    pub fn id(&self) -> LeadId {
        self.id
    }

    pub fn company_id(&self) -> CompanyId {
        self.company_id
    }

    pub fn external_user_id(&self) -> &str {
        &self.external_user_id
    }

    pub fn contact(&self) -> &ContactInfo {
        &self.contact
    }

    pub fn contact_mut(&mut self) -> &mut ContactInfo {
        &mut self.contact
    }

    pub fn status(&self) -> LeadStatus {
        self.status
    }

    pub fn source(&self) -> &Channel {
        &self.source
    }

    pub fn created_at(&self) -> Timestamp {
        self.created_at
    }

    pub fn updated_at(&self) -> Timestamp {
        self.updated_at
    }
}

/// Kind of a persisted exchange unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InteractionKind {
    /// Plain text message.
    Text,
    /// Voice message; content holds the externally produced transcript.
    Voice,
}

impl InteractionKind {
    /// Storage representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Voice => "voice",
        }
    }
}

impl FromStr for InteractionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "text" => Ok(Self::Text),
            "voice" => Ok(Self::Voice),
            other => Err(format!("unknown interaction kind: {other}")),
        }
    }
}

/// One persisted user/engine exchange unit.
#[derive(Debug, Clone)]
pub struct Interaction {
    pub id: InteractionId,
    pub lead_id: LeadId,
    pub kind: InteractionKind,
    /// Inbound text or transcript; may be a sentinel placeholder.
    pub content: String,
    /// The engine's reply for this exchange.
    pub outcome: String,
    pub created_at: Timestamp,
}

impl Interaction {
    /// Creates a new interaction record.
    pub fn new(
        lead_id: LeadId,
        kind: InteractionKind,
        content: impl Into<String>,
        outcome: impl Into<String>,
    ) -> Self {
        Self {
            id: InteractionId::new(),
            lead_id,
            kind,
            content: content.into(),
            outcome: outcome.into(),
            created_at: Timestamp::now(),
        }
    }
}
