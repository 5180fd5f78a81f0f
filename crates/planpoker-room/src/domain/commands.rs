//! Commands for the Room & Roster context.

use planpoker_core::command::Command;
use uuid::Uuid;

use super::aggregates::ParticipantRole;
use super::deck::CardDeck;

/// Command to create a room.
#[derive(Debug, Clone)]
pub struct CreateRoom {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// Room name.
    pub name: String,
    /// Deck the room votes with.
    pub card_deck: CardDeck,
    /// Whether observers may join.
    pub allow_observers: bool,
    /// Voting time limit in seconds.
    pub voting_time_limit: Option<i32>,
    /// When set, the creator joins immediately as admin under this name.
    pub admin_name: Option<String>,
}

impl Command for CreateRoom {
    fn command_type(&self) -> &'static str {
        "room.create_room"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}

/// Command to join a room.
#[derive(Debug, Clone)]
pub struct JoinRoom {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The room to join.
    pub room_id: Uuid,
    /// Display name.
    pub name: String,
    /// Requested role.
    pub role: ParticipantRole,
    /// Optional avatar emoji.
    pub avatar_emoji: Option<String>,
}

impl Command for JoinRoom {
    fn command_type(&self) -> &'static str {
        "room.join_room"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}

/// Command to update a participant's presence.
#[derive(Debug, Clone)]
pub struct UpdatePresence {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The participant whose presence changes.
    pub participant_id: Uuid,
    /// `true` for a heartbeat / coming online, `false` for leaving.
    pub online: bool,
}

impl Command for UpdatePresence {
    fn command_type(&self) -> &'static str {
        "room.update_presence"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}

/// Command to throw an emoji at everyone in a room.
#[derive(Debug, Clone)]
pub struct ThrowEmoji {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// Client-generated identifier used to de-duplicate animations.
    pub client_event_id: String,
    /// The emoji.
    pub emoji: String,
    /// Display name of the thrower.
    pub from: String,
    /// Client timestamp in milliseconds.
    pub timestamp: i64,
    /// Target room; `None` broadcasts on the global channel.
    pub room_id: Option<Uuid>,
}

impl Command for ThrowEmoji {
    fn command_type(&self) -> &'static str {
        "room.throw_emoji"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}
