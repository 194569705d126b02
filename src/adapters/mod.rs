//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the domain to external systems:
//! - `ai` - AI oracle implementations (HTTP chat-completions, mock)
//! - `postgres` - Database implementations of persistence ports
//! - `telegram` - Telegram Bot API sender and webhook types
//! - `email` - SMTP mail sender
//! - `http` - Axum routes exposing the conversation entry points

pub mod ai;
pub mod email;
pub mod http;
pub mod postgres;
pub mod telegram;
