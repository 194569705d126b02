//! Web widget chat endpoint.

use axum::extract::{Json, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use tracing::{error, warn};
use uuid::Uuid;

use crate::application::{InboundMessage, UiHint};
use crate::domain::foundation::CompanyId;
use crate::domain::lead::{Channel, ExplicitAction, InteractionKind};

use super::AppState;

/// Request body for `POST /api/chat`.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatRequest {
    pub company_id: i64,
    /// Opaque visitor token; minted on first contact when absent.
    pub visitor_id: Option<String>,
    pub username: Option<String>,
    #[serde(default)]
    pub text: String,
    /// Explicit UI action: `confirm`, `edit_name`, `edit_phone`.
    pub action: Option<String>,
    pub language: Option<String>,
    /// `text` (default) or `voice` with the transcript in `text`.
    pub kind: Option<String>,
    /// Destroy any prior lead and start over.
    #[serde(default)]
    pub reset: bool,
}

/// Response body for `POST /api/chat`.
#[derive(Debug, Clone, Serialize)]
pub struct ChatResponse {
    pub reply_text: String,
    pub session_id: String,
    pub visitor_id: String,
    /// `confirm_contact` or `request_contact`, when the widget should
    /// render an affordance.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ui_hint: Option<String>,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

/// POST /api/chat - one web widget turn.
pub async fn handle_chat(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> Response {
    if request.text.trim().is_empty() && request.action.is_none() {
        return (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: "Message text is required.".to_string(),
            }),
        )
            .into_response();
    }

    let visitor_id = request
        .visitor_id
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| format!("v_{}", Uuid::new_v4().simple()));

    let action = request.action.as_deref().and_then(parse_action);
    if request.action.is_some() && action.is_none() {
        warn!(action = ?request.action, "unknown chat action ignored");
    }

    let kind = match request.kind.as_deref() {
        Some("voice") => InteractionKind::Voice,
        _ => InteractionKind::Text,
    };

    let message = InboundMessage {
        company_id: CompanyId::new(request.company_id),
        channel: Channel::Web,
        user_key: visitor_id.clone(),
        username: request.username,
        text: request.text,
        kind,
        action,
        language: request.language,
        reset: request.reset,
    };

    match state.engine.handle_message(message).await {
        Ok(reply) => Json(ChatResponse {
            reply_text: reply.reply_text,
            session_id: reply.session_id.to_string(),
            visitor_id,
            ui_hint: reply.ui_hint.map(hint_tag).map(str::to_string),
        })
        .into_response(),
        Err(err) => {
            // The visitor never sees internal detail.
            error!(company_id = request.company_id, error = %err, "chat turn failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Something went wrong. Please try again.".to_string(),
                }),
            )
                .into_response()
        }
    }
}

fn parse_action(raw: &str) -> Option<ExplicitAction> {
    match raw {
        "confirm" => Some(ExplicitAction::Confirm),
        "edit_name" => Some(ExplicitAction::EditName),
        "edit_phone" => Some(ExplicitAction::EditPhone),
        _ => None,
    }
}

fn hint_tag(hint: UiHint) -> &'static str {
    match hint {
        UiHint::ConfirmContact => "confirm_contact",
        UiHint::RequestContact => "request_contact",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_actions() {
        assert_eq!(parse_action("confirm"), Some(ExplicitAction::Confirm));
        assert_eq!(parse_action("edit_name"), Some(ExplicitAction::EditName));
        assert_eq!(parse_action("edit_phone"), Some(ExplicitAction::EditPhone));
        assert_eq!(parse_action("dance"), None);
    }

    #[test]
    fn hint_tags_are_stable() {
        assert_eq!(hint_tag(UiHint::ConfirmContact), "confirm_contact");
        assert_eq!(hint_tag(UiHint::RequestContact), "request_contact");
    }

    #[test]
    fn request_deserializes_with_defaults() {
        let request: ChatRequest =
            serde_json::from_str(r#"{"company_id": 7, "text": "hi"}"#).unwrap();
        assert_eq!(request.company_id, 7);
        assert!(!request.reset);
        assert!(request.visitor_id.is_none());
    }
}
