//! Emoji reactions.

use axum::extract::State;
use axum::{Json, Router, routing::post};
use serde::Deserialize;
use tracing::{debug, instrument};
use uuid::Uuid;

use planpoker_room::application::command_handlers;
use planpoker_room::domain::commands;
use planpoker_room::domain::events::EmojiThrown;

use crate::error::ApiError;
use crate::state::AppState;

/// Request body for POST /emoji/throw.
#[derive(Debug, Deserialize)]
pub struct ThrowEmojiRequest {
    /// Client-generated identifier used for de-duplication.
    pub id: String,
    /// The emoji.
    pub emoji: String,
    /// Display name of the thrower.
    pub from: String,
    /// Client timestamp in milliseconds.
    pub timestamp: i64,
    /// Target room; broadcast globally when absent.
    pub room_id: Option<Uuid>,
}

/// POST /emoji/throw
#[instrument(skip(state, request), fields(room_id = ?request.room_id))]
async fn throw_emoji(
    State(state): State<AppState>,
    Json(request): Json<ThrowEmojiRequest>,
) -> Result<Json<EmojiThrown>, ApiError> {
    let command = commands::ThrowEmoji {
        correlation_id: Uuid::new_v4(),
        client_event_id: request.id,
        emoji: request.emoji,
        from: request.from,
        timestamp: request.timestamp,
        room_id: request.room_id,
    };

    debug!(correlation_id = %command.correlation_id, "handling throw_emoji command");

    let thrown = command_handlers::handle_throw_emoji(
        &command,
        state.clock.as_ref(),
        &*state.rooms,
        &*state.broadcaster,
    )
    .await?;

    Ok(Json(thrown))
}

/// Returns the router for emoji reactions.
pub fn router() -> Router<AppState> {
    Router::new().route("/emoji/throw", post(throw_emoji))
}
