//! Commands for the Estimation context.

use planpoker_core::command::Command;
use uuid::Uuid;

/// Command to add a story to a room.
#[derive(Debug, Clone)]
pub struct CreateStory {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The room the story belongs to.
    pub room_id: Uuid,
    /// Story title.
    pub title: String,
    /// Optional description.
    pub description: Option<String>,
    /// Optional external ticket key, e.g. `PROJ-42`.
    pub external_ref: Option<String>,
    /// Optional link to the external ticket.
    pub external_url: Option<String>,
    /// Position in the room; appended after the last story when `None`.
    pub sort_order: Option<i32>,
}

impl Command for CreateStory {
    fn command_type(&self) -> &'static str {
        "estimation.create_story"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}

/// Command to start a voting round on a story.
#[derive(Debug, Clone)]
pub struct StartVoting {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The story.
    pub story_id: Uuid,
}

impl Command for StartVoting {
    fn command_type(&self) -> &'static str {
        "estimation.start_voting"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}

/// Command to reveal a story's votes.
#[derive(Debug, Clone)]
pub struct RevealVotes {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The story.
    pub story_id: Uuid,
}

impl Command for RevealVotes {
    fn command_type(&self) -> &'static str {
        "estimation.reveal_votes"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}

/// Command to record a story's final estimate.
#[derive(Debug, Clone)]
pub struct CompleteStory {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The story.
    pub story_id: Uuid,
    /// Final estimate; the suggested estimate is used when `None`.
    pub estimate: Option<String>,
}

impl Command for CompleteStory {
    fn command_type(&self) -> &'static str {
        "estimation.complete_story"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}

/// Command to discard a story's votes and restart voting.
#[derive(Debug, Clone)]
pub struct ResetVoting {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The story.
    pub story_id: Uuid,
}

impl Command for ResetVoting {
    fn command_type(&self) -> &'static str {
        "estimation.reset_voting"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}

/// Command to skip a story.
#[derive(Debug, Clone)]
pub struct SkipStory {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The story.
    pub story_id: Uuid,
}

impl Command for SkipStory {
    fn command_type(&self) -> &'static str {
        "estimation.skip_story"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}

/// Command to cast or replace a vote.
#[derive(Debug, Clone)]
pub struct SubmitVote {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The story voted on.
    pub story_id: Uuid,
    /// The voter.
    pub participant_id: Uuid,
    /// Card value.
    pub value: String,
}

impl Command for SubmitVote {
    fn command_type(&self) -> &'static str {
        "estimation.submit_vote"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}
