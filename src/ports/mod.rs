//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the domain and the outside world. Adapters implement these ports.
//!
//! - `AiOracle` - stateless chat-completion / classification capability
//! - `ConversationStore` - lead and interaction persistence
//! - `CompanyDirectory` - read-only tenant credential lookup
//! - `BotSender` / `MailSender` - the two notification channels

mod ai_oracle;
mod channel_sender;
mod company_directory;
mod conversation_store;

pub use ai_oracle::{
    AiOracle, OracleEndpoint, OracleError, OracleMessage, OracleRequest, OracleRole,
};
pub use channel_sender::{BotSender, MailSender, SendError};
pub use company_directory::{CompanyDirectory, CompanyProfile, DirectoryError};
pub use conversation_store::{ConversationStore, StoreError};
