//! Conversation orchestrator - the per-message façade.
//!
//! Single entry point invoked by the channel adapters. Per inbound
//! message: resolve the session, load the lead and its history, run
//! extraction and the confirmation state machine, generate the reply,
//! persist the exchange, and - on the first transition into confirmed -
//! classify the lead and schedule notification delivery.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use thiserror::Error;
use tracing::{info, warn};

use crate::domain::foundation::{CompanyId, LeadId, SessionId};
use crate::domain::lead::{
    evaluate, Channel, ConfirmationStatus, ContactInfo, ExplicitAction, Extracted, HistoryEntry,
    InteractionKind, Speaker, Transition, CONFIRMATION_SENTINEL,
};
use crate::ports::{
    AiOracle, CompanyDirectory, CompanyProfile, ConversationStore, OracleEndpoint, OracleRequest,
    OracleRole, StoreError,
};

use super::classify::TemperatureClassifier;
use super::dispatcher::{NotificationJob, NotificationQueue};

/// Neutral sentence returned when the oracle cannot answer.
pub const FALLBACK_REPLY: &str =
    "Sorry, I could not process that just now. Could you say it again?";

/// Reply sent once the visitor confirms their details.
const CONFIRMED_REPLY: &str =
    "Thank you! Your details are confirmed - our manager will contact you shortly.";

/// Reply prompting for a corrected name.
const EDIT_NAME_REPLY: &str = "Sure - please send the correct name.";

/// Reply prompting for a corrected phone.
const EDIT_PHONE_REPLY: &str = "Sure - please send the correct phone number.";

/// System prompt for ordinary qualification turns.
const QUALIFY_SYSTEM_PROMPT: &str = "You are a friendly sales assistant qualifying website and \
     messenger leads. Answer the visitor's questions helpfully and, when natural, ask for their \
     name and phone number so a manager can follow up. Always reply in the visitor's language \
     and keep answers short.";

/// System prompt for the confirmation lead-in sentence.
const CONFIRM_SYSTEM_PROMPT: &str = "You are a friendly sales assistant. In one short sentence, \
     in the visitor's language, ask them to verify the contact details that follow your message. \
     Do not repeat the details themselves.";

/// Maximum history lines replayed to the oracle and the report.
const DEFAULT_HISTORY_LIMIT: usize = 20;

/// Hint for the calling channel adapter's presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiHint {
    /// Render the confirm / edit-name / edit-phone affordance.
    ConfirmContact,
    /// Render the contact-request affordance.
    RequestContact,
}

/// One inbound message from a channel adapter.
#[derive(Debug, Clone)]
pub struct InboundMessage {
    pub company_id: CompanyId,
    pub channel: Channel,
    /// Telegram numeric id (as text) or an opaque web visitor token.
    pub user_key: String,
    pub username: Option<String>,
    pub text: String,
    pub kind: InteractionKind,
    /// Explicit UI action, when the visitor pressed a button.
    pub action: Option<ExplicitAction>,
    /// Language code tagged onto the latest user turn for the oracle.
    pub language: Option<String>,
    /// Destroy any prior lead and start a brand-new session.
    pub reset: bool,
}

impl InboundMessage {
    /// Creates a plain text message with no action or reset.
    pub fn text(
        company_id: CompanyId,
        channel: Channel,
        user_key: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            company_id,
            channel,
            user_key: user_key.into(),
            username: None,
            text: text.into(),
            kind: InteractionKind::Text,
            action: None,
            language: None,
            reset: false,
        }
    }
}

/// The engine's answer for one inbound message.
#[derive(Debug, Clone)]
pub struct EngineReply {
    pub reply_text: String,
    pub session_id: SessionId,
    pub ui_hint: Option<UiHint>,
}

/// Errors surfaced to the channel adapter as a hard turn failure.
///
/// Everything else (oracle trouble, directory trouble, channel sends) is
/// recovered inside the engine.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("persistence failure: {0}")]
    Store(#[from] StoreError),
}

/// The conversation engine façade.
pub struct ConversationEngine {
    store: Arc<dyn ConversationStore>,
    directory: Arc<dyn CompanyDirectory>,
    oracle: Arc<dyn AiOracle>,
    classifier: TemperatureClassifier,
    queue: NotificationQueue,
    history_limit: usize,
    /// Ephemeral session handles per (company, channel, user key).
    sessions: Mutex<HashMap<(i64, String), SessionId>>,
}

impl ConversationEngine {
    /// Creates the engine over its ports.
    pub fn new(
        store: Arc<dyn ConversationStore>,
        directory: Arc<dyn CompanyDirectory>,
        oracle: Arc<dyn AiOracle>,
        queue: NotificationQueue,
    ) -> Self {
        let classifier = TemperatureClassifier::new(Arc::clone(&oracle));
        Self {
            store,
            directory,
            oracle,
            classifier,
            queue,
            history_limit: DEFAULT_HISTORY_LIMIT,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    /// Overrides the replayed-history window.
    pub fn with_history_limit(mut self, limit: usize) -> Self {
        self.history_limit = limit;
        self
    }

    /// Handles one inbound message end to end.
    pub async fn handle_message(&self, msg: InboundMessage) -> Result<EngineReply, EngineError> {
        let lead = self
            .store
            .get_or_create_lead(
                msg.company_id,
                &msg.user_key,
                msg.username.as_deref(),
                &msg.channel,
                msg.reset,
            )
            .await?;
        let session_id = self.session_for(&msg);
        let history = self.store.load_history(lead.id(), self.history_limit).await?;

        let tenant = self.tenant_profile(msg.company_id).await;
        let endpoint = tenant.as_ref().and_then(oracle_endpoint);

        let mut contact = lead.contact().clone();
        let extracted = Extracted::from_text(&msg.text);
        let transition = evaluate(&mut contact, msg.action, &msg.text, &extracted);

        info!(
            company_id = %msg.company_id,
            lead_id = %lead.id(),
            channel = %msg.channel,
            ?transition,
            "evaluated inbound message"
        );

        let reply_text = self
            .reply_for(&transition, &contact, &history, &msg, endpoint.clone())
            .await;
        let ui_hint = hint_for(&contact);

        // Contact mutation commits before the exchange is recorded and
        // strictly before any dispatch is scheduled.
        let confirmed_now = match transition {
            Transition::Confirmed => self.store.confirm(lead.id(), &contact).await?,
            Transition::BeginNameEdit
            | Transition::BeginPhoneEdit
            | Transition::ContactRevised
            | Transition::EditCaptured
            | Transition::AwaitConfirmation
            | Transition::Collected => {
                self.store.update_contact(lead.id(), &contact).await?;
                false
            }
            Transition::Continue => false,
        };

        let content = if msg.action.is_some() && msg.text.trim().is_empty() {
            CONFIRMATION_SENTINEL
        } else {
            msg.text.as_str()
        };
        self.store
            .append_interaction(lead.id(), msg.kind, content, &reply_text)
            .await?;

        if confirmed_now {
            self.run_confirmation_pipeline(lead.id(), &msg, &mut contact, endpoint)
                .await?;
        } else if transition == Transition::Confirmed {
            // Another concurrent message won the conditional update.
            info!(lead_id = %lead.id(), "confirmation already recorded; skipping dispatch");
        }

        Ok(EngineReply {
            reply_text,
            session_id,
            ui_hint,
        })
    }

    /// Classification and notification for a freshly confirmed lead.
    async fn run_confirmation_pipeline(
        &self,
        lead_id: LeadId,
        msg: &InboundMessage,
        contact: &mut ContactInfo,
        endpoint: Option<OracleEndpoint>,
    ) -> Result<(), EngineError> {
        let full_history = self.store.load_history(lead_id, self.history_limit).await?;

        let (temperature, notes) = self.classifier.classify(&full_history, endpoint).await;
        contact.temperature = Some(temperature);
        contact.temperature_notes = Some(notes.clone());
        self.store.set_temperature(lead_id, contact).await?;

        self.queue.enqueue(NotificationJob {
            company_id: msg.company_id,
            lead_id,
            contact_name: contact.name.clone().unwrap_or_default(),
            phone: contact.phone.clone().unwrap_or_default(),
            temperature,
            summary: notes,
            history: full_history,
        });
        Ok(())
    }

    /// Builds the reply text for a transition.
    async fn reply_for(
        &self,
        transition: &Transition,
        contact: &ContactInfo,
        history: &[HistoryEntry],
        msg: &InboundMessage,
        endpoint: Option<OracleEndpoint>,
    ) -> String {
        match transition {
            Transition::Confirmed => CONFIRMED_REPLY.to_string(),
            Transition::BeginNameEdit => EDIT_NAME_REPLY.to_string(),
            Transition::BeginPhoneEdit => EDIT_PHONE_REPLY.to_string(),
            t if t.wants_confirmation_prompt() => {
                let block = confirmation_block(contact);
                match self
                    .oracle_reply(CONFIRM_SYSTEM_PROMPT, history, msg, endpoint)
                    .await
                {
                    Some(lead_in) => format!("{lead_in}\n\n{block}"),
                    None => block,
                }
            }
            _ => self
                .oracle_reply(QUALIFY_SYSTEM_PROMPT, history, msg, endpoint)
                .await
                .unwrap_or_else(|| FALLBACK_REPLY.to_string()),
        }
    }

    /// Asks the oracle for a reply; None means the caller falls back.
    async fn oracle_reply(
        &self,
        system_prompt: &str,
        history: &[HistoryEntry],
        msg: &InboundMessage,
        endpoint: Option<OracleEndpoint>,
    ) -> Option<String> {
        if msg.text.trim().is_empty() {
            return None;
        }

        let mut request = OracleRequest::new()
            .with_system_prompt(system_prompt)
            .with_endpoint(endpoint);
        for line in history {
            let role = match line.speaker {
                Speaker::Visitor => OracleRole::User,
                Speaker::Engine => OracleRole::Assistant,
            };
            request = request.with_message(role, line.text.clone());
        }
        let latest = match &msg.language {
            Some(lang) => format!("{}\n[lang: {lang}]", msg.text),
            None => msg.text.clone(),
        };
        request = request.with_message(OracleRole::User, latest);

        match self.oracle.complete(request).await {
            Ok(text) => Some(text),
            Err(err) => {
                warn!(
                    company_id = %msg.company_id,
                    channel = %msg.channel,
                    error = %err,
                    "oracle completion failed; falling back"
                );
                None
            }
        }
    }

    /// Tenant profile lookup; failures degrade to defaults.
    async fn tenant_profile(&self, company_id: CompanyId) -> Option<CompanyProfile> {
        match self.directory.find(company_id).await {
            Ok(profile) => profile,
            Err(err) => {
                warn!(%company_id, error = %err, "tenant lookup failed; using defaults");
                None
            }
        }
    }

    /// Resolves the ephemeral session handle, lazily creating one.
    fn session_for(&self, msg: &InboundMessage) -> SessionId {
        let key = (
            msg.company_id.as_i64(),
            format!("{}:{}", msg.channel, msg.user_key),
        );
        let mut sessions = self.sessions.lock().expect("session map poisoned");
        if msg.reset {
            let fresh = SessionId::new();
            sessions.insert(key, fresh);
            return fresh;
        }
        *sessions.entry(key).or_insert_with(SessionId::new)
    }
}

/// Tenant oracle endpoint, when the company carries both fields.
fn oracle_endpoint(profile: &CompanyProfile) -> Option<OracleEndpoint> {
    match (&profile.ai_base_url, &profile.ai_api_key) {
        (Some(base_url), Some(api_key)) if !base_url.is_empty() && !api_key.is_empty() => {
            Some(OracleEndpoint {
                base_url: base_url.clone(),
                api_key: api_key.clone(),
            })
        }
        _ => None,
    }
}

/// Deterministic confirmation summary: the two fields plus the choices.
fn confirmation_block(contact: &ContactInfo) -> String {
    format!(
        "Please check your details:\n\
         \u{2022} Name: {}\n\
         \u{2022} Phone: {}\n\n\
         Reply \"yes\" to confirm, or choose to edit the name or the phone.",
        contact.name.as_deref().unwrap_or("-"),
        contact.phone.as_deref().unwrap_or("-"),
    )
}

/// Presentation hint derived from the post-transition contact state.
fn hint_for(contact: &ContactInfo) -> Option<UiHint> {
    match contact.confirmation_status {
        ConfirmationStatus::Pending => Some(UiHint::ConfirmContact),
        ConfirmationStatus::EditingName | ConfirmationStatus::EditingPhone => {
            Some(UiHint::RequestContact)
        }
        ConfirmationStatus::None if !contact.is_complete() => Some(UiHint::RequestContact),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn confirmation_block_shows_both_fields() {
        let contact = ContactInfo {
            name: Some("Meiramgul".to_string()),
            phone: Some("+77012345678".to_string()),
            ..Default::default()
        };
        let block = confirmation_block(&contact);
        assert!(block.contains("Meiramgul"));
        assert!(block.contains("+77012345678"));
        assert!(block.contains("confirm"));
    }

    #[test]
    fn hint_follows_confirmation_state() {
        let mut contact = ContactInfo::default();
        assert_eq!(hint_for(&contact), Some(UiHint::RequestContact));

        contact.confirmation_status = ConfirmationStatus::Pending;
        assert_eq!(hint_for(&contact), Some(UiHint::ConfirmContact));

        contact.confirmation_status = ConfirmationStatus::EditingPhone;
        assert_eq!(hint_for(&contact), Some(UiHint::RequestContact));

        contact.confirmation_status = ConfirmationStatus::Confirmed;
        assert_eq!(hint_for(&contact), None);
    }

    #[test]
    fn tenant_endpoint_requires_both_fields() {
        let mut profile = CompanyProfile {
            id: 7,
            ai_base_url: Some("https://tenant.example/v1".to_string()),
            ..Default::default()
        };
        assert!(oracle_endpoint(&profile).is_none());

        profile.ai_api_key = Some("sk-tenant".to_string());
        let endpoint = oracle_endpoint(&profile).unwrap();
        assert_eq!(endpoint.base_url, "https://tenant.example/v1");
    }
}
