//! Domain events for the Room & Roster context.

use planpoker_core::event::{DomainEvent, EventMetadata};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Emitted when a room is created.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomCreated {
    /// The room identifier.
    pub room_id: Uuid,
    /// The room slug.
    pub slug: String,
}

/// Emitted when a participant joins a room.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParticipantJoined {
    /// The participant identifier.
    pub participant_id: Uuid,
    /// Display name.
    pub name: String,
    /// Role name.
    pub role: String,
}

/// Emitted when a participant goes online or offline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PresenceChanged {
    /// The participant identifier.
    pub participant_id: Uuid,
    /// New presence.
    pub is_online: bool,
}

/// Emitted when someone throws an emoji.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmojiThrown {
    /// Client-generated identifier.
    pub id: String,
    /// The emoji.
    pub emoji: String,
    /// Display name of the thrower.
    pub from: String,
    /// Client timestamp in milliseconds.
    pub timestamp: i64,
}

/// Event type identifier for [`RoomCreated`].
pub const ROOM_CREATED_EVENT_TYPE: &str = "room.created";

/// Event type identifier for [`ParticipantJoined`].
pub const PARTICIPANT_JOINED_EVENT_TYPE: &str = "room.participant_joined";

/// Event type identifier for [`PresenceChanged`].
pub const PRESENCE_CHANGED_EVENT_TYPE: &str = "room.presence_changed";

/// Event type identifier for [`EmojiThrown`].
pub const EMOJI_THROWN_EVENT_TYPE: &str = "room.emoji_thrown";

/// Event payload variants for the Room & Roster context.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum RoomEventKind {
    /// A room has been created.
    RoomCreated(RoomCreated),
    /// A participant has joined.
    ParticipantJoined(ParticipantJoined),
    /// A participant's presence changed.
    PresenceChanged(PresenceChanged),
    /// An emoji was thrown.
    EmojiThrown(EmojiThrown),
}

impl RoomEventKind {
    fn event_type(&self) -> &'static str {
        match self {
            Self::RoomCreated(_) => ROOM_CREATED_EVENT_TYPE,
            Self::ParticipantJoined(_) => PARTICIPANT_JOINED_EVENT_TYPE,
            Self::PresenceChanged(_) => PRESENCE_CHANGED_EVENT_TYPE,
            Self::EmojiThrown(_) => EMOJI_THROWN_EVENT_TYPE,
        }
    }
}

/// Domain event envelope for the Room & Roster context.
#[derive(Debug, Clone)]
pub struct RoomEvent {
    /// Event metadata.
    pub metadata: EventMetadata,
    /// Event-specific payload.
    pub kind: RoomEventKind,
}

impl RoomEvent {
    /// Wraps a payload in an envelope published on `room_id`'s channel.
    #[must_use]
    pub fn new(
        room_id: Option<Uuid>,
        correlation_id: Uuid,
        occurred_at: chrono::DateTime<chrono::Utc>,
        kind: RoomEventKind,
    ) -> Self {
        Self {
            metadata: EventMetadata::new(kind.event_type(), room_id, correlation_id, occurred_at),
            kind,
        }
    }
}

impl DomainEvent for RoomEvent {
    fn event_type(&self) -> &'static str {
        self.kind.event_type()
    }

    fn to_payload(&self) -> serde_json::Value {
        // Serialization of derived Serialize types to Value is infallible.
        serde_json::to_value(&self.kind).expect("RoomEventKind serialization is infallible")
    }

    fn metadata(&self) -> &EventMetadata {
        &self.metadata
    }
}
