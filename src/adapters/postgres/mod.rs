//! PostgreSQL adapters - database implementations of persistence ports.
//!
//! - `PostgresConversationStore` - lead and interaction persistence
//! - `PostgresCompanyDirectory` - read-only tenant credential lookup

mod company_directory;
mod store;

pub use company_directory::PostgresCompanyDirectory;
pub use store::PostgresConversationStore;
