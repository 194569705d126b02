//! Foundation module - Shared domain primitives.
//!
//! Contains value objects and identifiers that form the vocabulary
//! of the Leadline domain.

mod ids;
mod timestamp;

pub use ids::{CompanyId, InteractionId, LeadId, SessionId};
pub use timestamp::Timestamp;
