//! Query handlers for the Room & Roster context.
//!
//! This module contains query handlers that load rooms and their roster
//! and return read-only view DTOs.

use chrono::{DateTime, Utc};
use planpoker_core::error::DomainError;
use planpoker_core::repository::{ParticipantRepository, RoomRepository};
use serde::Serialize;
use uuid::Uuid;

use crate::application::command_handlers::{load_room, load_roster};
use crate::domain::aggregates::{Participant, Room};

/// Read-only view of a participant.
#[derive(Debug, Serialize)]
pub struct ParticipantView {
    /// The participant identifier.
    pub participant_id: Uuid,
    /// Display name.
    pub name: String,
    /// Role name.
    pub role: String,
    /// Optional avatar emoji.
    pub avatar_emoji: Option<String>,
    /// Presence flag.
    pub is_online: bool,
    /// Last presence update.
    pub last_seen_at: Option<DateTime<Utc>>,
}

impl From<&Participant> for ParticipantView {
    fn from(participant: &Participant) -> Self {
        Self {
            participant_id: participant.id,
            name: participant.name.clone(),
            role: participant.role.as_str().to_owned(),
            avatar_emoji: participant.avatar_emoji.clone(),
            is_online: participant.is_online,
            last_seen_at: participant.last_seen_at,
        }
    }
}

/// Read-only view of a room with its roster.
#[derive(Debug, Serialize)]
pub struct RoomView {
    /// The room identifier.
    pub room_id: Uuid,
    /// Display name.
    pub name: String,
    /// URL slug.
    pub slug: String,
    /// Deck name.
    pub card_deck: String,
    /// The cards participants can play.
    pub card_values: Vec<String>,
    /// Whether observers may join.
    pub allow_observers: bool,
    /// Voting time limit in seconds.
    pub voting_time_limit: Option<i32>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Everyone who ever joined, in join order.
    pub participants: Vec<ParticipantView>,
    /// Number of participants currently online.
    pub online_count: usize,
}

impl RoomView {
    /// Builds the view of `room` with its roster.
    #[must_use]
    pub fn new(room: &Room, roster: &[Participant]) -> Self {
        Self {
            room_id: room.id,
            name: room.name.clone(),
            slug: room.slug.clone(),
            card_deck: room.card_deck.name().to_owned(),
            card_values: room
                .card_deck
                .values()
                .iter()
                .map(|v| (*v).to_owned())
                .collect(),
            allow_observers: room.allow_observers,
            voting_time_limit: room.voting_time_limit,
            created_at: room.created_at,
            participants: roster.iter().map(ParticipantView::from).collect(),
            online_count: roster.iter().filter(|p| p.is_online).count(),
        }
    }
}

/// Retrieves a room and its roster by room ID.
///
/// # Errors
///
/// Returns `DomainError::NotFound` if the room does not exist.
pub async fn get_room_by_id(
    room_id: Uuid,
    rooms: &dyn RoomRepository,
    participants: &dyn ParticipantRepository,
) -> Result<RoomView, DomainError> {
    let room = load_room(rooms, room_id).await?;
    let roster = load_roster(participants, room.id).await?;
    Ok(RoomView::new(&room, &roster))
}

/// Retrieves a room and its roster by slug.
///
/// # Errors
///
/// Returns `DomainError::NotFound` if no room has this slug.
pub async fn get_room_by_slug(
    slug: &str,
    rooms: &dyn RoomRepository,
    participants: &dyn ParticipantRepository,
) -> Result<RoomView, DomainError> {
    let stored = rooms
        .find_room_by_slug(slug)
        .await?
        .ok_or_else(|| DomainError::NotFound {
            entity: "room",
            id: slug.to_owned(),
        })?;
    let room = Room::from_stored(&stored)?;
    let roster = load_roster(participants, room.id).await?;
    Ok(RoomView::new(&room, &roster))
}
