//! Leadline - Chat-based lead qualification engine.
//!
//! Drives qualification conversations with anonymous visitors over Telegram
//! and a web widget, extracts and confirms contact details, classifies
//! buying intent, and notifies the owning company's sales staff.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
