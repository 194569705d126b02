//! Lead module - the contact funnel model.
//!
//! # Module Organization
//!
//! - `contact_info` - Typed contact document stored on the lead
//! - `lead` - Lead aggregate and interaction records
//! - `history` - Readable conversation history reconstruction
//! - `extractor` - Pure phone/name extraction from free text
//! - `state_machine` - Confirmation flow transitions
//! - `temperature` - Classification prompt and keyword parser

mod contact_info;
mod extractor;
mod history;
mod lead;
mod state_machine;
mod temperature;

pub use contact_info::{ConfirmationStatus, ContactInfo, Temperature};
pub use extractor::{extract_name, extract_phone};
pub use history::{flatten_history, HistoryEntry, Speaker, CONFIRMATION_SENTINEL};
pub use lead::{Channel, Interaction, InteractionKind, Lead, LeadStatus};
pub use state_machine::{evaluate, is_affirmative, ExplicitAction, Extracted, Transition};
pub use temperature::{classification_prompt, parse_temperature};
