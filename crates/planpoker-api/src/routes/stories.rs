//! Routes for the Estimation bounded context.

use axum::extract::{Path, Query, State};
use axum::{Json, Router, routing::get, routing::post};
use serde::Deserialize;
use tracing::{info, instrument};
use uuid::Uuid;

use planpoker_estimation::application::command_handlers::{self, VoteReceipt};
use planpoker_estimation::application::query_handlers::{self, StoryView};
use planpoker_estimation::domain::aggregates::StoryState;
use planpoker_estimation::domain::commands;
use planpoker_estimation::domain::progress::VotingProgress;
use planpoker_estimation::domain::statistics::VoteStatistics;

use crate::error::ApiError;
use crate::state::AppState;

/// Request body for POST /rooms/{room_id}/stories.
#[derive(Debug, Deserialize)]
pub struct CreateStoryRequest {
    /// Title.
    pub title: String,
    /// Optional description.
    pub description: Option<String>,
    /// External ticket key, e.g. `PP-12`.
    pub external_ref: Option<String>,
    /// External ticket URL.
    pub external_url: Option<String>,
    /// Position; defaults to after the last story.
    pub sort_order: Option<i32>,
}

/// Query string of GET /rooms/{room_id}/stories.
#[derive(Debug, Deserialize)]
pub struct ListStoriesQuery {
    /// Only stories in this state.
    pub state: Option<String>,
}

/// Request body for POST /stories/{story_id}/complete. The body may be
/// omitted.
#[derive(Debug, Deserialize)]
pub struct CompleteStoryRequest {
    /// Explicit final estimate; `null` uses the suggested one.
    #[serde(default)]
    pub estimate: Option<String>,
}

/// Request body for POST /stories/{story_id}/votes.
#[derive(Debug, Deserialize)]
pub struct SubmitVoteRequest {
    /// The voter.
    pub participant_id: Uuid,
    /// The card.
    pub value: String,
}

/// POST /rooms/{room_id}/stories
#[instrument(skip(state, request))]
async fn create_story(
    State(state): State<AppState>,
    Path(room_id): Path<Uuid>,
    Json(request): Json<CreateStoryRequest>,
) -> Result<Json<StoryView>, ApiError> {
    let command = commands::CreateStory {
        correlation_id: Uuid::new_v4(),
        room_id,
        title: request.title,
        description: request.description,
        external_ref: request.external_ref,
        external_url: request.external_url,
        sort_order: request.sort_order,
    };

    info!(correlation_id = %command.correlation_id, "handling create_story command");

    let view = command_handlers::handle_create_story(
        &command,
        state.clock.as_ref(),
        &*state.rooms,
        &*state.stories,
        &*state.broadcaster,
    )
    .await?;

    Ok(Json(view))
}

/// GET /rooms/{room_id}/stories
#[instrument(skip(state))]
async fn list_stories(
    State(state): State<AppState>,
    Path(room_id): Path<Uuid>,
    Query(query): Query<ListStoriesQuery>,
) -> Result<Json<Vec<StoryView>>, ApiError> {
    let filter = query
        .state
        .as_deref()
        .map(str::parse::<StoryState>)
        .transpose()?;
    let views = query_handlers::list_stories(
        room_id,
        filter,
        &*state.rooms,
        &*state.stories,
        &*state.votes,
    )
    .await?;
    Ok(Json(views))
}

/// GET /rooms/{room_id}/current-story
#[instrument(skip(state))]
async fn current_story(
    State(state): State<AppState>,
    Path(room_id): Path<Uuid>,
) -> Result<Json<Option<StoryView>>, ApiError> {
    let view =
        query_handlers::get_current_story(room_id, &*state.rooms, &*state.stories, &*state.votes)
            .await?;
    Ok(Json(view))
}

/// GET /stories/{story_id}
#[instrument(skip(state))]
async fn get_story(
    State(state): State<AppState>,
    Path(story_id): Path<Uuid>,
) -> Result<Json<StoryView>, ApiError> {
    let view = query_handlers::get_story(story_id, &*state.stories, &*state.votes).await?;
    Ok(Json(view))
}

/// POST /stories/{story_id}/start-voting
#[instrument(skip(state))]
async fn start_voting(
    State(state): State<AppState>,
    Path(story_id): Path<Uuid>,
) -> Result<Json<StoryView>, ApiError> {
    let command = commands::StartVoting {
        correlation_id: Uuid::new_v4(),
        story_id,
    };

    info!(correlation_id = %command.correlation_id, "handling start_voting command");

    let view = command_handlers::handle_start_voting(
        &command,
        state.clock.as_ref(),
        &*state.stories,
        &*state.votes,
        &*state.broadcaster,
    )
    .await?;

    Ok(Json(view))
}

/// POST /stories/{story_id}/reveal
#[instrument(skip(state))]
async fn reveal_votes(
    State(state): State<AppState>,
    Path(story_id): Path<Uuid>,
) -> Result<Json<StoryView>, ApiError> {
    let command = commands::RevealVotes {
        correlation_id: Uuid::new_v4(),
        story_id,
    };

    info!(correlation_id = %command.correlation_id, "handling reveal_votes command");

    let view = command_handlers::handle_reveal_votes(
        &command,
        state.clock.as_ref(),
        &*state.stories,
        &*state.votes,
        &*state.broadcaster,
    )
    .await?;

    Ok(Json(view))
}

/// POST /stories/{story_id}/complete
#[instrument(skip(state, request))]
async fn complete_story(
    State(state): State<AppState>,
    Path(story_id): Path<Uuid>,
    request: Option<Json<CompleteStoryRequest>>,
) -> Result<Json<StoryView>, ApiError> {
    let command = commands::CompleteStory {
        correlation_id: Uuid::new_v4(),
        story_id,
        estimate: request.and_then(|Json(request)| request.estimate),
    };

    info!(correlation_id = %command.correlation_id, "handling complete_story command");

    let view = command_handlers::handle_complete_story(
        &command,
        state.clock.as_ref(),
        &*state.stories,
        &*state.votes,
        &*state.broadcaster,
    )
    .await?;

    Ok(Json(view))
}

/// POST /stories/{story_id}/reset
#[instrument(skip(state))]
async fn reset_voting(
    State(state): State<AppState>,
    Path(story_id): Path<Uuid>,
) -> Result<Json<StoryView>, ApiError> {
    let command = commands::ResetVoting {
        correlation_id: Uuid::new_v4(),
        story_id,
    };

    info!(correlation_id = %command.correlation_id, "handling reset_voting command");

    let view = command_handlers::handle_reset_voting(
        &command,
        state.clock.as_ref(),
        &*state.stories,
        &*state.votes,
        &*state.broadcaster,
    )
    .await?;

    Ok(Json(view))
}

/// POST /stories/{story_id}/skip
#[instrument(skip(state))]
async fn skip_story(
    State(state): State<AppState>,
    Path(story_id): Path<Uuid>,
) -> Result<Json<StoryView>, ApiError> {
    let command = commands::SkipStory {
        correlation_id: Uuid::new_v4(),
        story_id,
    };

    info!(correlation_id = %command.correlation_id, "handling skip_story command");

    let view = command_handlers::handle_skip_story(
        &command,
        state.clock.as_ref(),
        &*state.stories,
        &*state.votes,
        &*state.broadcaster,
    )
    .await?;

    Ok(Json(view))
}

/// POST /stories/{story_id}/votes
#[instrument(skip(state, request), fields(participant_id = %request.participant_id))]
async fn submit_vote(
    State(state): State<AppState>,
    Path(story_id): Path<Uuid>,
    Json(request): Json<SubmitVoteRequest>,
) -> Result<Json<VoteReceipt>, ApiError> {
    let command = commands::SubmitVote {
        correlation_id: Uuid::new_v4(),
        story_id,
        participant_id: request.participant_id,
        value: request.value,
    };

    info!(correlation_id = %command.correlation_id, "handling submit_vote command");

    let receipt = command_handlers::handle_submit_vote(
        &command,
        state.clock.as_ref(),
        &*state.rooms,
        &*state.participants,
        &*state.stories,
        &*state.votes,
        &*state.broadcaster,
    )
    .await?;

    Ok(Json(receipt))
}

/// GET /stories/{story_id}/statistics
#[instrument(skip(state))]
async fn statistics(
    State(state): State<AppState>,
    Path(story_id): Path<Uuid>,
) -> Result<Json<VoteStatistics>, ApiError> {
    let statistics = query_handlers::get_statistics(
        story_id,
        &*state.stories,
        &*state.votes,
        &*state.participants,
    )
    .await?;
    Ok(Json(statistics))
}

/// GET /stories/{story_id}/progress
#[instrument(skip(state))]
async fn progress(
    State(state): State<AppState>,
    Path(story_id): Path<Uuid>,
) -> Result<Json<VotingProgress>, ApiError> {
    let progress = query_handlers::get_progress(
        story_id,
        state.clock.as_ref(),
        &*state.stories,
        &*state.votes,
        &*state.participants,
    )
    .await?;
    Ok(Json(progress))
}

/// Returns the router for the estimation context.
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/rooms/{room_id}/stories",
            get(list_stories).post(create_story),
        )
        .route("/rooms/{room_id}/current-story", get(current_story))
        .route("/stories/{story_id}", get(get_story))
        .route("/stories/{story_id}/start-voting", post(start_voting))
        .route("/stories/{story_id}/reveal", post(reveal_votes))
        .route("/stories/{story_id}/complete", post(complete_story))
        .route("/stories/{story_id}/reset", post(reset_voting))
        .route("/stories/{story_id}/skip", post(skip_story))
        .route("/stories/{story_id}/votes", post(submit_vote))
        .route("/stories/{story_id}/statistics", get(statistics))
        .route("/stories/{story_id}/progress", get(progress))
}
