//! AI oracle adapters.
//!
//! Implementations of the AiOracle port.
//!
//! ## Available Adapters
//!
//! - `HttpOracle` - OpenAI-compatible chat-completions endpoint
//! - `MockOracle` - Scripted oracle for tests and local runs

mod http_oracle;
mod mock_oracle;

pub use http_oracle::{HttpOracle, HttpOracleConfig};
pub use mock_oracle::MockOracle;
