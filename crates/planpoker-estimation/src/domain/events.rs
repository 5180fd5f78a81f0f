//! Domain events for the Estimation context.

use planpoker_core::event::{DomainEvent, EventMetadata};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::coordinator::ForcedTransition;

/// Emitted when a story is added to a room.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoryCreated {
    /// The story identifier.
    pub story_id: Uuid,
    /// Story title.
    pub title: String,
    /// Position in the room.
    pub sort_order: i32,
}

/// Emitted when a voting round starts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VotingStarted {
    /// The story identifier.
    pub story_id: Uuid,
    /// Stories that were forced out of voting.
    pub forced_transitions: Vec<ForcedTransition>,
}

/// Emitted when votes are revealed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VotesRevealed {
    /// The story identifier.
    pub story_id: Uuid,
}

/// Emitted when a story is completed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoryCompleted {
    /// The story identifier.
    pub story_id: Uuid,
    /// Final estimate; `None` when no estimate could be suggested.
    pub final_estimate: Option<String>,
}

/// Emitted when a story's votes are discarded and voting restarts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VotingReset {
    /// The story identifier.
    pub story_id: Uuid,
    /// Stories that were forced out of voting.
    pub forced_transitions: Vec<ForcedTransition>,
}

/// Emitted when a story is skipped.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorySkipped {
    /// The story identifier.
    pub story_id: Uuid,
}

/// Emitted when a participant votes. Never carries the card.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoteCast {
    /// The story identifier.
    pub story_id: Uuid,
    /// The voter.
    pub participant_id: Uuid,
}

/// Event type identifier for [`StoryCreated`].
pub const STORY_CREATED_EVENT_TYPE: &str = "estimation.story_created";

/// Event type identifier for [`VotingStarted`].
pub const VOTING_STARTED_EVENT_TYPE: &str = "estimation.voting_started";

/// Event type identifier for [`VotesRevealed`].
pub const VOTES_REVEALED_EVENT_TYPE: &str = "estimation.votes_revealed";

/// Event type identifier for [`StoryCompleted`].
pub const STORY_COMPLETED_EVENT_TYPE: &str = "estimation.story_completed";

/// Event type identifier for [`VotingReset`].
pub const VOTING_RESET_EVENT_TYPE: &str = "estimation.voting_reset";

/// Event type identifier for [`StorySkipped`].
pub const STORY_SKIPPED_EVENT_TYPE: &str = "estimation.story_skipped";

/// Event type identifier for [`VoteCast`].
pub const VOTE_CAST_EVENT_TYPE: &str = "estimation.vote_cast";

/// Event payload variants for the Estimation context.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum EstimationEventKind {
    /// A story has been created.
    StoryCreated(StoryCreated),
    /// Voting has started.
    VotingStarted(VotingStarted),
    /// Votes have been revealed.
    VotesRevealed(VotesRevealed),
    /// A story has been completed.
    StoryCompleted(StoryCompleted),
    /// Voting has been reset.
    VotingReset(VotingReset),
    /// A story has been skipped.
    StorySkipped(StorySkipped),
    /// A vote has been cast.
    VoteCast(VoteCast),
}

impl EstimationEventKind {
    fn event_type(&self) -> &'static str {
        match self {
            Self::StoryCreated(_) => STORY_CREATED_EVENT_TYPE,
            Self::VotingStarted(_) => VOTING_STARTED_EVENT_TYPE,
            Self::VotesRevealed(_) => VOTES_REVEALED_EVENT_TYPE,
            Self::StoryCompleted(_) => STORY_COMPLETED_EVENT_TYPE,
            Self::VotingReset(_) => VOTING_RESET_EVENT_TYPE,
            Self::StorySkipped(_) => STORY_SKIPPED_EVENT_TYPE,
            Self::VoteCast(_) => VOTE_CAST_EVENT_TYPE,
        }
    }
}

/// Domain event envelope for the Estimation context.
#[derive(Debug, Clone)]
pub struct EstimationEvent {
    /// Event metadata.
    pub metadata: EventMetadata,
    /// Event-specific payload.
    pub kind: EstimationEventKind,
}

impl EstimationEvent {
    /// Wraps a payload in an envelope published on the room's channel.
    #[must_use]
    pub fn new(
        room_id: Uuid,
        correlation_id: Uuid,
        occurred_at: chrono::DateTime<chrono::Utc>,
        kind: EstimationEventKind,
    ) -> Self {
        Self {
            metadata: EventMetadata::new(
                kind.event_type(),
                Some(room_id),
                correlation_id,
                occurred_at,
            ),
            kind,
        }
    }
}

impl DomainEvent for EstimationEvent {
    fn event_type(&self) -> &'static str {
        self.kind.event_type()
    }

    fn to_payload(&self) -> serde_json::Value {
        // Serialization of derived Serialize types to Value is infallible.
        serde_json::to_value(&self.kind).expect("EstimationEventKind serialization is infallible")
    }

    fn metadata(&self) -> &EventMetadata {
        &self.metadata
    }
}
