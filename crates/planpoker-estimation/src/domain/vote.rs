//! A participant's vote on a story.

use chrono::{DateTime, Utc};
use planpoker_core::repository::StoredVote;
use planpoker_room::domain::deck::{COFFEE_CARD, UNKNOWN_CARD};
use uuid::Uuid;

/// A single participant's card for one story.
#[derive(Debug, Clone, PartialEq)]
pub struct Vote {
    /// Vote identifier.
    pub id: Uuid,
    /// Room the vote was cast in.
    pub room_id: Uuid,
    /// Story the vote belongs to.
    pub story_id: Uuid,
    /// Participant who cast it.
    pub participant_id: Uuid,
    /// Card value.
    pub value: String,
    /// First submission.
    pub created_at: DateTime<Utc>,
    /// Last submission.
    pub updated_at: DateTime<Utc>,
}

impl Vote {
    /// Creates a new vote. Storing it overwrites any previous vote of the
    /// participant for the same story.
    #[must_use]
    pub fn cast(
        room_id: Uuid,
        story_id: Uuid,
        participant_id: Uuid,
        value: &str,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            room_id,
            story_id,
            participant_id,
            value: value.to_owned(),
            created_at: now,
            updated_at: now,
        }
    }

    /// The numeric value of the card, if it parses as a finite number.
    #[must_use]
    pub fn numeric_value(&self) -> Option<f64> {
        numeric_value(&self.value)
    }

    /// `?` card.
    #[must_use]
    pub fn is_unknown(&self) -> bool {
        self.value == UNKNOWN_CARD
    }

    /// Coffee-break card.
    #[must_use]
    pub fn is_coffee_break(&self) -> bool {
        self.value == COFFEE_CARD
    }

    /// `?` or coffee-break card.
    #[must_use]
    pub fn is_special(&self) -> bool {
        self.is_unknown() || self.is_coffee_break()
    }

    /// Rebuilds a vote from its stored record.
    #[must_use]
    pub fn from_stored(stored: &StoredVote) -> Self {
        Self {
            id: stored.id,
            room_id: stored.room_id,
            story_id: stored.story_id,
            participant_id: stored.participant_id,
            value: stored.value.clone(),
            created_at: stored.created_at,
            updated_at: stored.updated_at,
        }
    }

    /// Converts the vote into its stored record.
    #[must_use]
    pub fn to_stored(&self) -> StoredVote {
        StoredVote {
            id: self.id,
            room_id: self.room_id,
            story_id: self.story_id,
            participant_id: self.participant_id,
            value: self.value.clone(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// Parses a card as a finite number.
#[must_use]
pub fn numeric_value(card: &str) -> Option<f64> {
    card.trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
}
