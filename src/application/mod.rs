//! Application layer - services that orchestrate domain operations.
//!
//! This layer coordinates between ports: the conversation orchestrator is
//! the single entry point channel adapters call per inbound message, the
//! classifier wraps the oracle, and the dispatcher fans confirmed leads
//! out to the notification channels.

mod classify;
mod dispatcher;
mod orchestrator;

pub use classify::TemperatureClassifier;
pub use dispatcher::{
    spawn_notification_workers, DeliveryCredentials, NotificationDispatcher, NotificationJob,
    NotificationQueue, NotificationWorkers,
};
pub use orchestrator::{
    ConversationEngine, EngineError, EngineReply, InboundMessage, UiHint, FALLBACK_REPLY,
};
