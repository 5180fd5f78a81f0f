//! Domain error types.

use thiserror::Error;
use uuid::Uuid;

/// Top-level domain error type.
#[derive(Debug, Error)]
pub enum DomainError {
    /// A room, story, participant or settings record was not found.
    #[error("{entity} not found: {id}")]
    NotFound {
        /// The kind of record that was looked up.
        entity: &'static str,
        /// The identifier (or slug) that did not resolve.
        id: String,
    },

    /// A submitted vote is not a card of the room's deck.
    #[error("invalid vote {value:?}: not a card of the {deck} deck")]
    InvalidVote {
        /// The rejected value.
        value: String,
        /// The deck configured for the room.
        deck: String,
    },

    /// The operation is not allowed in the current story state.
    #[error("state conflict: {0}")]
    StateConflict(String),

    /// Optimistic concurrency conflict.
    #[error(
        "concurrency conflict on {entity_id}: expected version {expected}, found {actual}"
    )]
    ConcurrencyConflict {
        /// The record that had the conflict.
        entity_id: Uuid,
        /// The expected version.
        expected: i64,
        /// The actual version found.
        actual: i64,
    },

    /// A validation error in domain logic.
    #[error("validation error: {0}")]
    Validation(String),

    /// A persistence/storage error.
    #[error("persistence error: {0}")]
    Persistence(String),
}

impl DomainError {
    /// Shorthand for a `NotFound` error keyed by a UUID.
    #[must_use]
    pub fn not_found(entity: &'static str, id: Uuid) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_message_names_entity_and_id() {
        let id = Uuid::nil();
        let err = DomainError::not_found("story", id);
        assert_eq!(
            err.to_string(),
            "story not found: 00000000-0000-0000-0000-000000000000"
        );
    }

    #[test]
    fn test_invalid_vote_message_quotes_value() {
        let err = DomainError::InvalidVote {
            value: "7".to_owned(),
            deck: "fibonacci".to_owned(),
        };
        assert_eq!(
            err.to_string(),
            "invalid vote \"7\": not a card of the fibonacci deck"
        );
    }
}
