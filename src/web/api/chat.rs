//! API endpoint for injecting chat lines.
//!
//! The panel and integration tests use this to drive the command dispatcher
//! without a live chat connection. Responses the commands would have sent to
//! chat come back in the response body instead.

use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};

use crate::chat::BufferSender;
use crate::commands::ChatSpeaker;
use crate::web::AppState;

/// Speaker half of an injected chat line.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpeakerPayload {
    pub id: String,
    pub username: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub avatar_url: String,
    /// Whether the speaker counts as a moderator.
    #[serde(default)]
    pub elevated: bool,
}

/// Chat injection request.
#[derive(Deserialize)]
pub struct ChatInjectRequest {
    pub message: String,
    pub speaker: SpeakerPayload,
}

/// Chat injection response.
#[derive(Serialize)]
pub struct ChatInjectResponse {
    /// Whether the line matched a bound queue command.
    pub handled: bool,
    /// Messages the command sent back to chat, in order.
    pub responses: Vec<String>,
}

/// Run a chat line through the command dispatcher.
pub async fn inject_chat(
    State(state): State<AppState>,
    Json(payload): Json<ChatInjectRequest>,
) -> Result<Json<ChatInjectResponse>, StatusCode> {
    let display_name = if payload.speaker.display_name.is_empty() {
        payload.speaker.username.clone()
    } else {
        payload.speaker.display_name
    };
    let speaker = ChatSpeaker {
        id: payload.speaker.id,
        username: payload.speaker.username,
        display_name,
        avatar_url: payload.speaker.avatar_url,
        elevated: payload.speaker.elevated,
    };

    let sender = BufferSender::new();
    let handled = state
        .dispatcher
        .dispatch(&payload.message, &speaker, &sender)
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;
    let responses = sender
        .drain()
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    Ok(Json(ChatInjectResponse { handled, responses }))
}
