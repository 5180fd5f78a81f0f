//! Routes for the Room & Roster bounded context.

use axum::extract::{Path, State};
use axum::{Json, Router, routing::get, routing::post};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use uuid::Uuid;

use planpoker_room::application::query_handlers::{self, ParticipantView, RoomView};
use planpoker_room::application::command_handlers;
use planpoker_room::domain::aggregates::ParticipantRole;
use planpoker_room::domain::commands;
use planpoker_room::domain::deck::CardDeck;

use crate::error::ApiError;
use crate::state::AppState;

fn default_allow_observers() -> bool {
    true
}

/// Request body for POST /rooms.
#[derive(Debug, Deserialize)]
pub struct CreateRoomRequest {
    /// Display name of the room.
    pub name: String,
    /// Deck name; defaults to `fibonacci`.
    pub card_deck: Option<String>,
    /// Whether observers may join. Defaults to `true`.
    #[serde(default = "default_allow_observers")]
    pub allow_observers: bool,
    /// Optional per-story time limit in seconds.
    pub voting_time_limit: Option<i32>,
    /// When set, the creator joins as admin under this name.
    pub admin_name: Option<String>,
}

/// Response body for POST /rooms.
#[derive(Debug, Serialize)]
pub struct CreateRoomResponse {
    /// The new room.
    pub room: RoomView,
    /// The admin participant, if one was requested.
    pub admin: Option<ParticipantView>,
}

/// Request body for POST /rooms/{room_id}/participants.
#[derive(Debug, Deserialize)]
pub struct JoinRoomRequest {
    /// Display name.
    pub name: String,
    /// `admin`, `participant` (default) or `observer`.
    pub role: Option<String>,
    /// Optional avatar.
    pub avatar_emoji: Option<String>,
}

/// POST /rooms
#[instrument(skip(state, request), fields(name = %request.name))]
async fn create_room(
    State(state): State<AppState>,
    Json(request): Json<CreateRoomRequest>,
) -> Result<Json<CreateRoomResponse>, ApiError> {
    let card_deck = request
        .card_deck
        .as_deref()
        .map(str::parse::<CardDeck>)
        .transpose()?
        .unwrap_or_default();
    let command = commands::CreateRoom {
        correlation_id: Uuid::new_v4(),
        name: request.name,
        card_deck,
        allow_observers: request.allow_observers,
        voting_time_limit: request.voting_time_limit,
        admin_name: request.admin_name,
    };

    info!(correlation_id = %command.correlation_id, "handling create_room command");

    let created = command_handlers::handle_create_room(
        &command,
        state.clock.as_ref(),
        &state.rng,
        &*state.rooms,
        &*state.participants,
        &*state.broadcaster,
    )
    .await?;

    let roster: Vec<_> = created.admin.iter().cloned().collect();
    Ok(Json(CreateRoomResponse {
        room: RoomView::new(&created.room, &roster),
        admin: created.admin.as_ref().map(ParticipantView::from),
    }))
}

/// GET /rooms/{room_id}
#[instrument(skip(state))]
async fn get_room(
    State(state): State<AppState>,
    Path(room_id): Path<Uuid>,
) -> Result<Json<RoomView>, ApiError> {
    let view = query_handlers::get_room_by_id(room_id, &*state.rooms, &*state.participants).await?;
    Ok(Json(view))
}

/// GET /rooms/slug/{slug}
#[instrument(skip(state))]
async fn get_room_by_slug(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<RoomView>, ApiError> {
    let view =
        query_handlers::get_room_by_slug(&slug, &*state.rooms, &*state.participants).await?;
    Ok(Json(view))
}

/// POST /rooms/{room_id}/participants
#[instrument(skip(state, request))]
async fn join_room(
    State(state): State<AppState>,
    Path(room_id): Path<Uuid>,
    Json(request): Json<JoinRoomRequest>,
) -> Result<Json<ParticipantView>, ApiError> {
    let role = request
        .role
        .as_deref()
        .map(str::parse::<ParticipantRole>)
        .transpose()?
        .unwrap_or_default();
    let command = commands::JoinRoom {
        correlation_id: Uuid::new_v4(),
        room_id,
        name: request.name,
        role,
        avatar_emoji: request.avatar_emoji,
    };

    info!(correlation_id = %command.correlation_id, "handling join_room command");

    let participant = command_handlers::handle_join_room(
        &command,
        state.clock.as_ref(),
        &*state.rooms,
        &*state.participants,
        &*state.broadcaster,
    )
    .await?;

    Ok(Json(ParticipantView::from(&participant)))
}

async fn update_presence(
    state: &AppState,
    participant_id: Uuid,
    online: bool,
) -> Result<Json<ParticipantView>, ApiError> {
    let command = commands::UpdatePresence {
        correlation_id: Uuid::new_v4(),
        participant_id,
        online,
    };

    let participant = command_handlers::handle_update_presence(
        &command,
        state.clock.as_ref(),
        &*state.participants,
        &*state.broadcaster,
    )
    .await?;

    Ok(Json(ParticipantView::from(&participant)))
}

/// POST /participants/{participant_id}/ping
#[instrument(skip(state))]
async fn ping(
    State(state): State<AppState>,
    Path(participant_id): Path<Uuid>,
) -> Result<Json<ParticipantView>, ApiError> {
    update_presence(&state, participant_id, true).await
}

/// POST /participants/{participant_id}/offline
#[instrument(skip(state))]
async fn go_offline(
    State(state): State<AppState>,
    Path(participant_id): Path<Uuid>,
) -> Result<Json<ParticipantView>, ApiError> {
    update_presence(&state, participant_id, false).await
}

/// Returns the router for the room context.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/rooms", post(create_room))
        .route("/rooms/{room_id}", get(get_room))
        .route("/rooms/slug/{slug}", get(get_room_by_slug))
        .route("/rooms/{room_id}/participants", post(join_room))
        .route("/participants/{participant_id}/ping", post(ping))
        .route("/participants/{participant_id}/offline", post(go_offline))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::json;

    use crate::routes::test_helpers::{TestApp, failing_router, send};

    #[tokio::test]
    async fn test_create_room_returns_room_with_admin() {
        // Arrange
        let app = TestApp::new();

        // Act
        let (status, json) = app
            .post(
                "/rooms",
                &json!({ "name": "Sprint 42", "card_deck": "tshirt", "admin_name": "Ada" }),
            )
            .await;

        // Assert
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["room"]["card_deck"], "tshirt");
        assert!(
            json["room"]["slug"]
                .as_str()
                .unwrap()
                .starts_with("sprint-42-")
        );
        assert_eq!(json["room"]["participants"].as_array().unwrap().len(), 1);
        assert_eq!(json["admin"]["role"], "admin");
        assert_eq!(app.broadcaster.event_types(), vec!["room.created"]);
    }

    #[tokio::test]
    async fn test_create_room_defaults_to_fibonacci() {
        let app = TestApp::new();

        let (status, json) = app.post("/rooms", &json!({ "name": "Team" })).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["room"]["card_deck"], "fibonacci");
        assert!(json["admin"].is_null());
    }

    #[tokio::test]
    async fn test_create_room_rejects_unknown_deck() {
        let app = TestApp::new();

        let (status, json) = app
            .post("/rooms", &json!({ "name": "Team", "card_deck": "primes" }))
            .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"], "validation_error");
    }

    #[tokio::test]
    async fn test_create_room_returns_422_for_missing_name() {
        let app = TestApp::new();

        let (status, _) = app.post("/rooms", &json!({})).await;

        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_get_room_by_id_and_slug() {
        // Arrange
        let app = TestApp::new();
        let (room_id, _) = app.seed_room("fibonacci").await;
        let (_, by_id) = app.get(&format!("/rooms/{room_id}")).await;
        let slug = by_id["slug"].as_str().unwrap().to_owned();

        // Act
        let (status, by_slug) = app.get(&format!("/rooms/slug/{slug}")).await;

        // Assert
        assert_eq!(status, StatusCode::OK);
        assert_eq!(by_slug["room_id"], room_id.as_str());
        assert_eq!(by_slug["card_values"].as_array().unwrap().len(), 13);
    }

    #[tokio::test]
    async fn test_get_unknown_room_returns_404() {
        let app = TestApp::new();

        let (status, json) = app
            .get("/rooms/00000000-0000-0000-0000-000000000000")
            .await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json["error"], "not_found");
    }

    #[tokio::test]
    async fn test_get_room_with_malformed_id_returns_400() {
        let app = TestApp::new();

        let (status, _) = app.get("/rooms/not-a-uuid").await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_join_room_as_observer() {
        let app = TestApp::new();
        let (room_id, _) = app.seed_room("fibonacci").await;

        let (status, json) = app
            .post(
                &format!("/rooms/{room_id}/participants"),
                &json!({ "name": "Grace", "role": "observer" }),
            )
            .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["role"], "observer");
        assert_eq!(json["is_online"], true);
    }

    #[tokio::test]
    async fn test_join_room_rejects_observer_when_disallowed() {
        let app = TestApp::new();
        let (_, created) = app
            .post(
                "/rooms",
                &json!({ "name": "Closed", "allow_observers": false }),
            )
            .await;
        let room_id = created["room"]["room_id"].as_str().unwrap();

        let (status, json) = app
            .post(
                &format!("/rooms/{room_id}/participants"),
                &json!({ "name": "Grace", "role": "observer" }),
            )
            .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"], "validation_error");
    }

    #[tokio::test]
    async fn test_offline_then_ping_toggles_presence() {
        // Arrange
        let app = TestApp::new();
        let (_, admin_id) = app.seed_room("fibonacci").await;

        // Act
        let (_, offline) = app
            .post(&format!("/participants/{admin_id}/offline"), &json!({}))
            .await;
        let (status, online) = app
            .post(&format!("/participants/{admin_id}/ping"), &json!({}))
            .await;

        // Assert
        assert_eq!(offline["is_online"], false);
        assert_eq!(status, StatusCode::OK);
        assert_eq!(online["is_online"], true);
        assert_eq!(
            app.broadcaster.event_types(),
            vec![
                "room.created",
                "room.presence_changed",
                "room.presence_changed"
            ]
        );
    }

    #[tokio::test]
    async fn test_create_room_returns_500_when_store_fails() {
        let (status, json) = send(
            failing_router(),
            "POST",
            "/rooms",
            Some(&json!({ "name": "Team" })),
        )
        .await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json["error"], "persistence_error");
    }
}
