//! Command handlers for the Room & Roster context.
//!
//! Each handler samples the clock once, applies the domain operation,
//! persists the result and then publishes the resulting event.

use std::sync::Mutex;

use planpoker_core::broadcast::Broadcaster;
use planpoker_core::clock::Clock;
use planpoker_core::error::DomainError;
use planpoker_core::repository::{ParticipantRepository, RoomRepository};
use planpoker_core::rng::{DeterministicRng, random_alphanumeric};
use tracing::{debug, info};
use uuid::Uuid;

use crate::domain::aggregates::{Participant, ParticipantRole, Room};
use crate::domain::commands::{CreateRoom, JoinRoom, ThrowEmoji, UpdatePresence};
use crate::domain::events::{
    EmojiThrown, ParticipantJoined, PresenceChanged, RoomCreated, RoomEvent, RoomEventKind,
};

const SLUG_SUFFIX_LEN: usize = 6;

/// Result of a successfully handled `CreateRoom` command.
#[derive(Debug)]
pub struct CreatedRoom {
    /// The new room.
    pub room: Room,
    /// The creator, when an admin name was given.
    pub admin: Option<Participant>,
}

/// Loads a room by ID.
///
/// # Errors
///
/// Returns `DomainError::NotFound` if the room does not exist.
pub async fn load_room(rooms: &dyn RoomRepository, room_id: Uuid) -> Result<Room, DomainError> {
    let stored = rooms
        .load_room(room_id)
        .await?
        .ok_or_else(|| DomainError::not_found("room", room_id))?;
    Room::from_stored(&stored)
}

/// Loads a participant by ID.
///
/// # Errors
///
/// Returns `DomainError::NotFound` if the participant does not exist.
pub async fn load_participant(
    participants: &dyn ParticipantRepository,
    participant_id: Uuid,
) -> Result<Participant, DomainError> {
    let stored = participants
        .load_participant(participant_id)
        .await?
        .ok_or_else(|| DomainError::not_found("participant", participant_id))?;
    Participant::from_stored(&stored)
}

/// Loads the full roster of a room.
///
/// # Errors
///
/// Returns `DomainError` if loading fails or a record is corrupt.
pub async fn load_roster(
    participants: &dyn ParticipantRepository,
    room_id: Uuid,
) -> Result<Vec<Participant>, DomainError> {
    participants
        .list_participants(room_id)
        .await?
        .iter()
        .map(Participant::from_stored)
        .collect()
}

/// Handles the `CreateRoom` command: generates the slug suffix, creates the
/// room and (optionally) its admin, and persists both.
///
/// The `Mutex` is locked only around slug generation to avoid holding a
/// `MutexGuard` across await points.
///
/// # Errors
///
/// Returns `DomainError` if validation or persistence fails.
pub async fn handle_create_room(
    command: &CreateRoom,
    clock: &dyn Clock,
    rng: &Mutex<dyn DeterministicRng + Send>,
    rooms: &dyn RoomRepository,
    participants: &dyn ParticipantRepository,
    broadcaster: &dyn Broadcaster,
) -> Result<CreatedRoom, DomainError> {
    let now = clock.now();

    let suffix = {
        let mut rng_guard = rng
            .lock()
            .map_err(|e| DomainError::Persistence(format!("RNG mutex poisoned: {e}")))?;
        random_alphanumeric(&mut *rng_guard, SLUG_SUFFIX_LEN)
    };

    let room = Room::create(
        Uuid::new_v4(),
        &command.name,
        command.card_deck,
        command.allow_observers,
        command.voting_time_limit,
        &suffix,
        now,
    )?;
    let admin = command
        .admin_name
        .as_deref()
        .map(|name| {
            Participant::join(
                Uuid::new_v4(),
                &room,
                name,
                ParticipantRole::Admin,
                None,
                now,
            )
        })
        .transpose()?;

    rooms.insert_room(&room.to_stored()).await?;
    if let Some(admin) = &admin {
        participants.save_participant(&admin.to_stored()).await?;
    }

    info!(
        room_id = %room.id,
        slug = %room.slug,
        correlation_id = %command.correlation_id,
        "room created"
    );

    broadcaster.publish(&RoomEvent::new(
        Some(room.id),
        command.correlation_id,
        now,
        RoomEventKind::RoomCreated(RoomCreated {
            room_id: room.id,
            slug: room.slug.clone(),
        }),
    ));

    Ok(CreatedRoom { room, admin })
}

/// Handles the `JoinRoom` command.
///
/// # Errors
///
/// Returns `DomainError::NotFound` if the room does not exist and
/// `DomainError::Validation` if the participant may not join.
pub async fn handle_join_room(
    command: &JoinRoom,
    clock: &dyn Clock,
    rooms: &dyn RoomRepository,
    participants: &dyn ParticipantRepository,
    broadcaster: &dyn Broadcaster,
) -> Result<Participant, DomainError> {
    let now = clock.now();
    let room = load_room(rooms, command.room_id).await?;

    let participant = Participant::join(
        Uuid::new_v4(),
        &room,
        &command.name,
        command.role,
        command.avatar_emoji.clone(),
        now,
    )?;
    participants
        .save_participant(&participant.to_stored())
        .await?;

    info!(
        room_id = %room.id,
        participant_id = %participant.id,
        role = %participant.role,
        "participant joined"
    );

    broadcaster.publish(&RoomEvent::new(
        Some(room.id),
        command.correlation_id,
        now,
        RoomEventKind::ParticipantJoined(ParticipantJoined {
            participant_id: participant.id,
            name: participant.name.clone(),
            role: participant.role.as_str().to_owned(),
        }),
    ));

    Ok(participant)
}

/// Handles the `UpdatePresence` command. A heartbeat from a participant
/// that is already online only refreshes `last_seen_at` and publishes
/// nothing.
///
/// # Errors
///
/// Returns `DomainError::NotFound` if the participant does not exist.
pub async fn handle_update_presence(
    command: &UpdatePresence,
    clock: &dyn Clock,
    participants: &dyn ParticipantRepository,
    broadcaster: &dyn Broadcaster,
) -> Result<Participant, DomainError> {
    let now = clock.now();
    let mut participant = load_participant(participants, command.participant_id).await?;
    let was_online = participant.is_online;

    if command.online {
        participant.mark_online(now);
    } else {
        participant.mark_offline(now);
    }
    participants
        .save_participant(&participant.to_stored())
        .await?;

    if was_online == participant.is_online {
        debug!(participant_id = %participant.id, "presence refreshed");
    } else {
        info!(
            participant_id = %participant.id,
            is_online = participant.is_online,
            "presence changed"
        );
        broadcaster.publish(&RoomEvent::new(
            Some(participant.room_id),
            command.correlation_id,
            now,
            RoomEventKind::PresenceChanged(PresenceChanged {
                participant_id: participant.id,
                is_online: participant.is_online,
            }),
        ));
    }

    Ok(participant)
}

/// Handles the `ThrowEmoji` command: validates the payload and publishes it.
/// Nothing is persisted.
///
/// # Errors
///
/// Returns `DomainError::Validation` if a required field is blank and
/// `DomainError::NotFound` if the target room does not exist.
pub async fn handle_throw_emoji(
    command: &ThrowEmoji,
    clock: &dyn Clock,
    rooms: &dyn RoomRepository,
    broadcaster: &dyn Broadcaster,
) -> Result<EmojiThrown, DomainError> {
    for (field, value) in [
        ("id", &command.client_event_id),
        ("emoji", &command.emoji),
        ("from", &command.from),
    ] {
        if value.trim().is_empty() {
            return Err(DomainError::Validation(format!("{field} must not be blank")));
        }
    }
    if let Some(room_id) = command.room_id {
        load_room(rooms, room_id).await?;
    }

    let thrown = EmojiThrown {
        id: command.client_event_id.clone(),
        emoji: command.emoji.clone(),
        from: command.from.clone(),
        timestamp: command.timestamp,
    };

    debug!(room_id = ?command.room_id, emoji = %thrown.emoji, "emoji thrown");

    broadcaster.publish(&RoomEvent::new(
        command.room_id,
        command.correlation_id,
        clock.now(),
        RoomEventKind::EmojiThrown(thrown.clone()),
    ));

    Ok(thrown)
}
