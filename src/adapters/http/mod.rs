//! HTTP adapters - the channel entry points.
//!
//! Two inbound surfaces share one router: the web widget chat endpoint
//! and the Telegram webhook. Everything funnels into the conversation
//! engine; presentation (keyboards, widget markup) stays with the caller.

mod chat;
mod telegram_webhook;

pub use chat::{ChatRequest, ChatResponse};

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::application::ConversationEngine;

/// Shared application state for the HTTP surface.
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<ConversationEngine>,
}

impl AppState {
    /// Creates a new AppState.
    pub fn new(engine: Arc<ConversationEngine>) -> Self {
        Self { engine }
    }
}

/// Builds the application router.
///
/// Endpoints:
/// - `GET  /health` - liveness probe
/// - `POST /api/chat` - web widget conversation entry point
/// - `POST /api/telegram/webhook/{company_id}` - Bot API updates
///
/// The widget is embedded on arbitrary tenant sites, so CORS is open.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/chat", post(chat::handle_chat))
        .route(
            "/api/telegram/webhook/:company_id",
            post(telegram_webhook::handle_update),
        )
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health() -> &'static str {
    "ok"
}
