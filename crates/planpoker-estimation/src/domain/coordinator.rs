//! Room-wide coordination: at most one story of a room is in voting.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

use super::aggregates::{Story, StoryState};

/// A story forced out of voting because another story started.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForcedTransition {
    /// The story that stopped voting.
    pub story_id: Uuid,
    /// Where it ended up: `Revealed` or `Pending`.
    pub outcome: StoryState,
}

/// The writes a `start_voting` call has to commit together.
#[derive(Debug, Clone)]
pub struct StartVotingPlan {
    /// The story that starts voting, already transitioned.
    pub target: Story,
    /// Other stories of the room that were voting, already transitioned.
    pub displaced: Vec<Story>,
    /// What happened to each displaced story.
    pub transitions: Vec<ForcedTransition>,
}

impl StartVotingPlan {
    /// All stories the plan modifies, target last.
    #[must_use]
    pub fn into_stories(self) -> Vec<Story> {
        let mut stories = self.displaced;
        stories.push(self.target);
        stories
    }
}

/// Plans starting a voting round on `target`.
///
/// Every other story of `room_stories` that is in voting is revealed when
/// it has votes and reset to pending otherwise. `room_stories` may contain
/// the target itself; it is skipped.
#[must_use]
pub fn plan_start_voting(
    mut target: Story,
    room_stories: &[Story],
    stories_with_votes: &HashSet<Uuid>,
    now: DateTime<Utc>,
) -> StartVotingPlan {
    let mut displaced = Vec::new();
    let mut transitions = Vec::new();
    for other in room_stories
        .iter()
        .filter(|s| s.id != target.id && s.state() == StoryState::Voting)
    {
        let mut other = other.clone();
        let outcome = other.yield_voting(stories_with_votes.contains(&other.id), now);
        transitions.push(ForcedTransition {
            story_id: other.id,
            outcome,
        });
        displaced.push(other);
    }
    target.begin_voting(now);
    StartVotingPlan {
        target,
        displaced,
        transitions,
    }
}

/// The story currently in voting. `stories` is expected in display order.
#[must_use]
pub fn current_story(stories: &[Story]) -> Option<&Story> {
    let mut voting = stories.iter().filter(|s| s.state() == StoryState::Voting);
    let first = voting.next()?;
    let extra = voting.count();
    if extra > 0 {
        warn!(
            room_id = %first.room_id,
            story_id = %first.id,
            extra,
            "more than one story in voting"
        );
    }
    Some(first)
}
