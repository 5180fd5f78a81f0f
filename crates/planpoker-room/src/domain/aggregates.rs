//! Rooms and their participant roster.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use planpoker_core::error::DomainError;
use planpoker_core::repository::{StoredParticipant, StoredRoom};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::deck::CardDeck;

const MAX_NAME_LEN: usize = 255;

/// Trims a display name and checks it is usable.
fn normalize_name(kind: &str, name: &str) -> Result<String, DomainError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(DomainError::Validation(format!("{kind} name must not be blank")));
    }
    if trimmed.chars().count() > MAX_NAME_LEN {
        return Err(DomainError::Validation(format!(
            "{kind} name must be at most {MAX_NAME_LEN} characters"
        )));
    }
    Ok(trimmed.to_owned())
}

/// Lowercases `name` and joins its ASCII alphanumeric runs with `-`.
#[must_use]
pub fn slugify(name: &str) -> String {
    let slug = name
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|part| !part.is_empty())
        .map(str::to_ascii_lowercase)
        .collect::<Vec<_>>()
        .join("-");
    if slug.is_empty() {
        "room".to_owned()
    } else {
        slug
    }
}

/// A planning poker room.
#[derive(Debug, Clone, PartialEq)]
pub struct Room {
    /// Room identifier.
    pub id: Uuid,
    /// Display name.
    pub name: String,
    /// Unique slug used in room URLs.
    pub slug: String,
    /// The deck votes are validated against.
    pub card_deck: CardDeck,
    /// Whether observers may join.
    pub allow_observers: bool,
    /// Voting time limit in seconds; `None` means unlimited.
    pub voting_time_limit: Option<i32>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl Room {
    /// Creates a new room. The slug is the slugified name followed by
    /// `slug_suffix`.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if the name is blank or too long,
    /// or the time limit is not positive.
    pub fn create(
        id: Uuid,
        name: &str,
        card_deck: CardDeck,
        allow_observers: bool,
        voting_time_limit: Option<i32>,
        slug_suffix: &str,
        now: DateTime<Utc>,
    ) -> Result<Self, DomainError> {
        let name = normalize_name("room", name)?;
        if voting_time_limit.is_some_and(|limit| limit <= 0) {
            return Err(DomainError::Validation(
                "voting time limit must be positive".to_owned(),
            ));
        }
        let slug = format!("{}-{slug_suffix}", slugify(&name));
        Ok(Self {
            id,
            name,
            slug,
            card_deck,
            allow_observers,
            voting_time_limit,
            created_at: now,
        })
    }

    /// Rebuilds a room from its stored record.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Persistence` if the stored deck name is unknown.
    pub fn from_stored(stored: &StoredRoom) -> Result<Self, DomainError> {
        let card_deck = stored.card_deck.parse::<CardDeck>().map_err(|_| {
            DomainError::Persistence(format!(
                "room {} has unknown card deck {}",
                stored.id, stored.card_deck
            ))
        })?;
        Ok(Self {
            id: stored.id,
            name: stored.name.clone(),
            slug: stored.slug.clone(),
            card_deck,
            allow_observers: stored.allow_observers,
            voting_time_limit: stored.voting_time_limit,
            created_at: stored.created_at,
        })
    }

    /// Converts the room into its stored record.
    #[must_use]
    pub fn to_stored(&self) -> StoredRoom {
        StoredRoom {
            id: self.id,
            name: self.name.clone(),
            slug: self.slug.clone(),
            card_deck: self.card_deck.name().to_owned(),
            allow_observers: self.allow_observers,
            voting_time_limit: self.voting_time_limit,
            created_at: self.created_at,
        }
    }
}

/// What a participant may do in a room.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParticipantRole {
    /// Runs the session; also votes.
    Admin,
    /// Votes.
    #[default]
    Participant,
    /// Watches without voting.
    Observer,
}

impl ParticipantRole {
    /// Storage and wire name of the role.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Participant => "participant",
            Self::Observer => "observer",
        }
    }

    /// Only admins and participants cast votes.
    #[must_use]
    pub fn can_vote(self) -> bool {
        matches!(self, Self::Admin | Self::Participant)
    }
}

impl fmt::Display for ParticipantRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ParticipantRole {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Self::Admin),
            "participant" => Ok(Self::Participant),
            "observer" => Ok(Self::Observer),
            other => Err(DomainError::Validation(format!("unknown role: {other}"))),
        }
    }
}

/// A member of a room's roster.
#[derive(Debug, Clone, PartialEq)]
pub struct Participant {
    /// Participant identifier.
    pub id: Uuid,
    /// Room the participant belongs to.
    pub room_id: Uuid,
    /// Display name.
    pub name: String,
    /// Role in the room.
    pub role: ParticipantRole,
    /// Optional avatar emoji.
    pub avatar_emoji: Option<String>,
    /// Presence flag.
    pub is_online: bool,
    /// Last presence update.
    pub last_seen_at: Option<DateTime<Utc>>,
    /// Join timestamp.
    pub created_at: DateTime<Utc>,
}

impl Participant {
    /// Adds a participant to `room`. New participants start online.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if the name is blank or an observer
    /// tries to join a room that does not allow observers.
    pub fn join(
        id: Uuid,
        room: &Room,
        name: &str,
        role: ParticipantRole,
        avatar_emoji: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<Self, DomainError> {
        let name = normalize_name("participant", name)?;
        if role == ParticipantRole::Observer && !room.allow_observers {
            return Err(DomainError::Validation(format!(
                "room {} does not allow observers",
                room.id
            )));
        }
        Ok(Self {
            id,
            room_id: room.id,
            name,
            role,
            avatar_emoji: avatar_emoji.filter(|e| !e.trim().is_empty()),
            is_online: true,
            last_seen_at: Some(now),
            created_at: now,
        })
    }

    /// Whether this participant may cast votes.
    #[must_use]
    pub fn can_vote(&self) -> bool {
        self.role.can_vote()
    }

    /// Whether this participant counts towards a story's expected votes:
    /// a voting role and currently online.
    #[must_use]
    pub fn is_active_voter(&self) -> bool {
        self.can_vote() && self.is_online
    }

    /// Marks the participant online (also used as a heartbeat).
    pub fn mark_online(&mut self, now: DateTime<Utc>) {
        self.is_online = true;
        self.last_seen_at = Some(now);
    }

    /// Marks the participant offline.
    pub fn mark_offline(&mut self, now: DateTime<Utc>) {
        self.is_online = false;
        self.last_seen_at = Some(now);
    }

    /// Rebuilds a participant from its stored record.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Persistence` if the stored role is unknown.
    pub fn from_stored(stored: &StoredParticipant) -> Result<Self, DomainError> {
        let role = stored.role.parse::<ParticipantRole>().map_err(|_| {
            DomainError::Persistence(format!(
                "participant {} has unknown role {}",
                stored.id, stored.role
            ))
        })?;
        Ok(Self {
            id: stored.id,
            room_id: stored.room_id,
            name: stored.name.clone(),
            role,
            avatar_emoji: stored.avatar_emoji.clone(),
            is_online: stored.is_online,
            last_seen_at: stored.last_seen_at,
            created_at: stored.created_at,
        })
    }

    /// Converts the participant into its stored record.
    #[must_use]
    pub fn to_stored(&self) -> StoredParticipant {
        StoredParticipant {
            id: self.id,
            room_id: self.room_id,
            name: self.name.clone(),
            role: self.role.as_str().to_owned(),
            avatar_emoji: self.avatar_emoji.clone(),
            is_online: self.is_online,
            last_seen_at: self.last_seen_at,
            created_at: self.created_at,
        }
    }
}
