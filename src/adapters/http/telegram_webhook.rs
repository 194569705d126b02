//! Telegram webhook endpoint.
//!
//! Replies ride the webhook response itself: the Bot API accepts one
//! method call as the answer to an update, so no per-tenant token is
//! needed on the synchronous path. Unusable updates are acknowledged
//! with 200 so Telegram does not retry them forever.

use axum::extract::{Json, Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use tracing::{error, warn};

use crate::adapters::telegram::TelegramUpdate;
use crate::application::InboundMessage;
use crate::domain::foundation::CompanyId;
use crate::domain::lead::{Channel, ExplicitAction, InteractionKind};

use super::AppState;

/// POST /api/telegram/webhook/{company_id} - one Bot API update.
pub async fn handle_update(
    State(state): State<AppState>,
    Path(company_id): Path<i64>,
    Json(update): Json<TelegramUpdate>,
) -> Response {
    let Some(chat_id) = update.chat_id() else {
        warn!(company_id, "update without a chat; ignoring");
        return StatusCode::OK.into_response();
    };

    let (text, action) = match (&update.message, &update.callback_query) {
        (Some(message), _) => (message.text.clone().unwrap_or_default(), None),
        (None, Some(query)) => (
            String::new(),
            query.data.as_deref().and_then(parse_callback_action),
        ),
        (None, None) => {
            return StatusCode::OK.into_response();
        }
    };

    if text.trim().is_empty() && action.is_none() {
        // Stickers, photos, unknown callbacks: nothing to qualify.
        return StatusCode::OK.into_response();
    }

    let message = InboundMessage {
        company_id: CompanyId::new(company_id),
        channel: Channel::Telegram,
        user_key: chat_id.to_string(),
        username: update.username().map(str::to_string),
        text,
        kind: InteractionKind::Text,
        action,
        language: update.language_code().map(str::to_string),
        reset: false,
    };

    match state.engine.handle_message(message).await {
        Ok(reply) => Json(json!({
            "method": "sendMessage",
            "chat_id": chat_id,
            "text": reply.reply_text,
        }))
        .into_response(),
        Err(err) => {
            error!(company_id, chat_id, error = %err, "telegram turn failed");
            // A generic apology; internal detail stays internal.
            Json(json!({
                "method": "sendMessage",
                "chat_id": chat_id,
                "text": "Something went wrong. Please try again.",
            }))
            .into_response()
        }
    }
}

fn parse_callback_action(data: &str) -> Option<ExplicitAction> {
    match data {
        "confirm" => Some(ExplicitAction::Confirm),
        "edit_name" => Some(ExplicitAction::EditName),
        "edit_phone" => Some(ExplicitAction::EditPhone),
        _ => None,
    }
}
