//! Command handlers for the Estimation context.
//!
//! Each handler samples the clock once, loads the stories it touches,
//! applies the transition and commits every changed story in a single
//! [`StoryWriteBatch`]. Events are published only after the commit.

use std::collections::HashSet;

use planpoker_core::broadcast::Broadcaster;
use planpoker_core::clock::Clock;
use planpoker_core::error::DomainError;
use planpoker_core::repository::{
    ParticipantRepository, RoomRepository, StoryRepository, StoryWriteBatch, VoteRepository,
};
use planpoker_room::application::command_handlers::{load_participant, load_room};
use serde::Serialize;
use tracing::{debug, info};
use uuid::Uuid;

use crate::application::query_handlers::{StoryView, load_story, load_votes, story_view};
use crate::domain::aggregates::{Story, StoryState};
use crate::domain::commands::{
    CompleteStory, CreateStory, ResetVoting, RevealVotes, SkipStory, StartVoting, SubmitVote,
};
use crate::domain::coordinator::{StartVotingPlan, plan_start_voting};
use crate::domain::events::{
    EstimationEvent, EstimationEventKind, StoryCompleted, StoryCreated, StorySkipped, VoteCast,
    VotesRevealed, VotingReset, VotingStarted,
};
use crate::domain::statistics::suggest_estimate;
use crate::domain::vote::Vote;

/// Acknowledgement of a submitted vote. Does not echo the card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VoteReceipt {
    /// The stored vote identifier.
    pub vote_id: Uuid,
    /// The story voted on.
    pub story_id: Uuid,
    /// The voter.
    pub participant_id: Uuid,
    /// When the vote was stored.
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

/// Commits `stories` (and optionally deletes votes) and bumps their
/// in-memory versions.
async fn commit(
    stories_repo: &dyn StoryRepository,
    stories: &mut [Story],
    clear_votes_for: Vec<Uuid>,
) -> Result<(), DomainError> {
    let batch = StoryWriteBatch {
        stories: stories.iter().map(Story::to_stored).collect(),
        clear_votes_for,
    };
    stories_repo.commit_stories(batch).await?;
    for story in stories.iter_mut() {
        story.mark_committed();
    }
    Ok(())
}

/// Loads the room of `target` and plans a fresh voting round on it,
/// displacing whichever other story is in voting.
async fn plan_voting_round(
    target: Story,
    stories: &dyn StoryRepository,
    votes: &dyn VoteRepository,
    now: chrono::DateTime<chrono::Utc>,
) -> Result<StartVotingPlan, DomainError> {
    let room_stories: Vec<Story> = stories
        .list_stories(target.room_id)
        .await?
        .iter()
        .map(Story::from_stored)
        .collect();
    let mut stories_with_votes = HashSet::new();
    for other in room_stories
        .iter()
        .filter(|s| s.id != target.id && s.state() == StoryState::Voting)
    {
        if !votes.list_votes(other.id).await?.is_empty() {
            stories_with_votes.insert(other.id);
        }
    }
    Ok(plan_start_voting(target, &room_stories, &stories_with_votes, now))
}

/// Handles the `CreateStory` command.
///
/// # Errors
///
/// Returns `DomainError::NotFound` if the room does not exist and
/// `DomainError::Validation` if the title is invalid.
pub async fn handle_create_story(
    command: &CreateStory,
    clock: &dyn Clock,
    rooms: &dyn RoomRepository,
    stories: &dyn StoryRepository,
    broadcaster: &dyn Broadcaster,
) -> Result<StoryView, DomainError> {
    let now = clock.now();
    let room = load_room(rooms, command.room_id).await?;

    let sort_order = match command.sort_order {
        Some(order) => order,
        None => stories
            .list_stories(room.id)
            .await?
            .iter()
            .map(|s| s.sort_order)
            .max()
            .map_or(0, |last| last + 1),
    };
    let story = Story::create(
        Uuid::new_v4(),
        room.id,
        &command.title,
        command.description.clone(),
        command.external_ref.clone(),
        command.external_url.clone(),
        sort_order,
        now,
    )?;
    stories.insert_story(&story.to_stored()).await?;

    info!(
        room_id = %room.id,
        story_id = %story.id,
        sort_order,
        correlation_id = %command.correlation_id,
        "story created"
    );

    broadcaster.publish(&EstimationEvent::new(
        room.id,
        command.correlation_id,
        now,
        EstimationEventKind::StoryCreated(StoryCreated {
            story_id: story.id,
            title: story.title.clone(),
            sort_order,
        }),
    ));

    Ok(StoryView::new(&story, &[]))
}

/// Handles the `StartVoting` command. Any other story of the room that is
/// in voting is revealed (when it has votes) or reset to pending, in the
/// same commit.
///
/// # Errors
///
/// Returns `DomainError::NotFound` if the story does not exist and
/// `DomainError::ConcurrencyConflict` if a touched story changed
/// concurrently.
pub async fn handle_start_voting(
    command: &StartVoting,
    clock: &dyn Clock,
    stories: &dyn StoryRepository,
    votes: &dyn VoteRepository,
    broadcaster: &dyn Broadcaster,
) -> Result<StoryView, DomainError> {
    let now = clock.now();
    let target = load_story(stories, command.story_id).await?;
    let room_id = target.room_id;

    let plan = plan_voting_round(target, stories, votes, now).await?;
    let transitions = plan.transitions.clone();
    let mut changed = plan.into_stories();
    commit(stories, &mut changed, Vec::new()).await?;
    let Some(story) = changed.pop() else {
        return Err(DomainError::Persistence(
            "start voting plan lost its target story".to_owned(),
        ));
    };

    info!(
        room_id = %room_id,
        story_id = %story.id,
        forced = transitions.len(),
        correlation_id = %command.correlation_id,
        "voting started"
    );

    broadcaster.publish(&EstimationEvent::new(
        room_id,
        command.correlation_id,
        now,
        EstimationEventKind::VotingStarted(VotingStarted {
            story_id: story.id,
            forced_transitions: transitions,
        }),
    ));

    story_view(&story, votes).await
}

/// Handles the `RevealVotes` command. Revealing an already revealed story
/// changes nothing and publishes nothing.
///
/// # Errors
///
/// Returns `DomainError::NotFound` if the story does not exist.
pub async fn handle_reveal_votes(
    command: &RevealVotes,
    clock: &dyn Clock,
    stories: &dyn StoryRepository,
    votes: &dyn VoteRepository,
    broadcaster: &dyn Broadcaster,
) -> Result<StoryView, DomainError> {
    let now = clock.now();
    let mut story = load_story(stories, command.story_id).await?;

    if !story.reveal(now) {
        debug!(story_id = %story.id, "votes already revealed");
        return story_view(&story, votes).await;
    }
    commit(stories, std::slice::from_mut(&mut story), Vec::new()).await?;

    info!(
        room_id = %story.room_id,
        story_id = %story.id,
        correlation_id = %command.correlation_id,
        "votes revealed"
    );

    broadcaster.publish(&EstimationEvent::new(
        story.room_id,
        command.correlation_id,
        now,
        EstimationEventKind::VotesRevealed(VotesRevealed { story_id: story.id }),
    ));

    story_view(&story, votes).await
}

/// Handles the `CompleteStory` command. Without an explicit estimate the
/// suggested estimate of the current votes is used; when there is none
/// the story stays revealed without a final estimate.
///
/// # Errors
///
/// Returns `DomainError::NotFound` if the story does not exist and
/// `DomainError::Validation` if the estimate is blank.
pub async fn handle_complete_story(
    command: &CompleteStory,
    clock: &dyn Clock,
    stories: &dyn StoryRepository,
    votes: &dyn VoteRepository,
    broadcaster: &dyn Broadcaster,
) -> Result<StoryView, DomainError> {
    let now = clock.now();
    let mut story = load_story(stories, command.story_id).await?;
    let story_votes = load_votes(votes, story.id).await?;

    let estimate = match command.estimate.as_deref().map(str::trim) {
        Some("") => {
            return Err(DomainError::Validation(
                "estimate must not be blank".to_owned(),
            ));
        }
        Some(estimate) => Some(estimate.to_owned()),
        None => suggest_estimate(&story_votes),
    };
    story.complete(estimate, now);
    commit(stories, std::slice::from_mut(&mut story), Vec::new()).await?;

    info!(
        room_id = %story.room_id,
        story_id = %story.id,
        final_estimate = ?story.final_estimate,
        correlation_id = %command.correlation_id,
        "story completed"
    );

    broadcaster.publish(&EstimationEvent::new(
        story.room_id,
        command.correlation_id,
        now,
        EstimationEventKind::StoryCompleted(StoryCompleted {
            story_id: story.id,
            final_estimate: story.final_estimate.clone(),
        }),
    ));

    Ok(StoryView::new(&story, &story_votes))
}

/// Handles the `ResetVoting` command: deletes every vote of the story and
/// opens a fresh round. Another story of the room that is in voting is
/// displaced as in `StartVoting`, in the same commit.
///
/// # Errors
///
/// Returns `DomainError::NotFound` if the story does not exist and
/// `DomainError::ConcurrencyConflict` if a touched story changed
/// concurrently.
pub async fn handle_reset_voting(
    command: &ResetVoting,
    clock: &dyn Clock,
    stories: &dyn StoryRepository,
    votes: &dyn VoteRepository,
    broadcaster: &dyn Broadcaster,
) -> Result<StoryView, DomainError> {
    let now = clock.now();
    let target = load_story(stories, command.story_id).await?;
    let clear = vec![target.id];

    let plan = plan_voting_round(target, stories, votes, now).await?;
    let transitions = plan.transitions.clone();
    let mut changed = plan.into_stories();
    commit(stories, &mut changed, clear).await?;
    let Some(story) = changed.pop() else {
        return Err(DomainError::Persistence(
            "reset plan lost its target story".to_owned(),
        ));
    };

    info!(
        room_id = %story.room_id,
        story_id = %story.id,
        forced = transitions.len(),
        correlation_id = %command.correlation_id,
        "voting reset"
    );

    broadcaster.publish(&EstimationEvent::new(
        story.room_id,
        command.correlation_id,
        now,
        EstimationEventKind::VotingReset(VotingReset {
            story_id: story.id,
            forced_transitions: transitions,
        }),
    ));

    Ok(StoryView::new(&story, &[]))
}

/// Handles the `SkipStory` command.
///
/// # Errors
///
/// Returns `DomainError::NotFound` if the story does not exist.
pub async fn handle_skip_story(
    command: &SkipStory,
    clock: &dyn Clock,
    stories: &dyn StoryRepository,
    votes: &dyn VoteRepository,
    broadcaster: &dyn Broadcaster,
) -> Result<StoryView, DomainError> {
    let now = clock.now();
    let mut story = load_story(stories, command.story_id).await?;

    story.skip(now);
    commit(stories, std::slice::from_mut(&mut story), Vec::new()).await?;

    info!(
        room_id = %story.room_id,
        story_id = %story.id,
        correlation_id = %command.correlation_id,
        "story skipped"
    );

    broadcaster.publish(&EstimationEvent::new(
        story.room_id,
        command.correlation_id,
        now,
        EstimationEventKind::StorySkipped(StorySkipped { story_id: story.id }),
    ));

    story_view(&story, votes).await
}

/// Handles the `SubmitVote` command. A second vote of the same participant
/// replaces the first.
///
/// # Errors
///
/// - `DomainError::NotFound` if the story or participant does not exist.
/// - `DomainError::Validation` if the participant is not in the story's
///   room or may not vote.
/// - `DomainError::InvalidVote` if the value is not a card of the room's
///   deck.
/// - `DomainError::StateConflict` if the story is not in voting.
pub async fn handle_submit_vote(
    command: &SubmitVote,
    clock: &dyn Clock,
    rooms: &dyn RoomRepository,
    participants: &dyn ParticipantRepository,
    stories: &dyn StoryRepository,
    votes: &dyn VoteRepository,
    broadcaster: &dyn Broadcaster,
) -> Result<VoteReceipt, DomainError> {
    let now = clock.now();
    let story = load_story(stories, command.story_id).await?;
    let participant = load_participant(participants, command.participant_id).await?;

    if participant.room_id != story.room_id {
        return Err(DomainError::Validation(format!(
            "participant {} is not in the room of story {}",
            participant.id, story.id
        )));
    }
    if !participant.can_vote() {
        return Err(DomainError::Validation(format!(
            "participant {} is an observer and cannot vote",
            participant.id
        )));
    }
    let room = load_room(rooms, story.room_id).await?;
    room.card_deck.validate(&command.value)?;
    let state = story.state();
    if state != StoryState::Voting {
        return Err(DomainError::StateConflict(format!(
            "story {} is {} and does not accept votes",
            story.id,
            state.as_str()
        )));
    }

    let vote = Vote::cast(room.id, story.id, participant.id, &command.value, now);
    let stored = Vote::from_stored(&votes.upsert_vote(&vote.to_stored()).await?);

    info!(
        room_id = %room.id,
        story_id = %story.id,
        participant_id = %participant.id,
        correlation_id = %command.correlation_id,
        "vote cast"
    );

    broadcaster.publish(&EstimationEvent::new(
        room.id,
        command.correlation_id,
        now,
        EstimationEventKind::VoteCast(VoteCast {
            story_id: story.id,
            participant_id: participant.id,
        }),
    ));

    Ok(VoteReceipt {
        vote_id: stored.id,
        story_id: story.id,
        participant_id: participant.id,
        updated_at: stored.updated_at,
    })
}

#[cfg(test)]
mod tests {
    use chrono::Duration;
    use planpoker_core::error::DomainError;
    use planpoker_core::repository::{
        ParticipantRepository, RoomRepository, StoryRepository, VoteRepository,
    };
    use planpoker_room::domain::aggregates::{Participant, ParticipantRole, Room};
    use planpoker_room::domain::deck::CardDeck;
    use planpoker_test_support::{
        FailingStore, FixedClock, InMemoryStore, RecordingBroadcaster, fixed_now,
    };
    use uuid::Uuid;

    use super::*;
    use crate::domain::aggregates::SKIPPED_ESTIMATE;

    struct Fixture {
        store: InMemoryStore,
        broadcaster: RecordingBroadcaster,
        room: Room,
        admin: Participant,
        voter: Participant,
        observer: Participant,
    }

    impl Fixture {
        async fn new() -> Self {
            let store = InMemoryStore::new();
            let room = Room::create(
                Uuid::new_v4(),
                "Platform",
                CardDeck::Fibonacci,
                true,
                None,
                "k8s123",
                fixed_now(),
            )
            .unwrap();
            store.insert_room(&room.to_stored()).await.unwrap();
            let mut members = Vec::new();
            for (name, role) in [
                ("Ada", ParticipantRole::Admin),
                ("Bob", ParticipantRole::Participant),
                ("Olga", ParticipantRole::Observer),
            ] {
                let p = Participant::join(Uuid::new_v4(), &room, name, role, None, fixed_now())
                    .unwrap();
                store.save_participant(&p.to_stored()).await.unwrap();
                members.push(p);
            }
            let observer = members.pop().unwrap();
            let voter = members.pop().unwrap();
            let admin = members.pop().unwrap();
            Self {
                store,
                broadcaster: RecordingBroadcaster::new(),
                room,
                admin,
                voter,
                observer,
            }
        }

        async fn create_story(&self, title: &str) -> StoryView {
            handle_create_story(
                &CreateStory {
                    correlation_id: Uuid::new_v4(),
                    room_id: self.room.id,
                    title: title.to_owned(),
                    description: None,
                    external_ref: None,
                    external_url: None,
                    sort_order: None,
                },
                &FixedClock(fixed_now()),
                &self.store,
                &self.store,
                &self.broadcaster,
            )
            .await
            .unwrap()
        }

        async fn start(&self, story_id: Uuid, clock: &FixedClock) -> StoryView {
            handle_start_voting(
                &StartVoting {
                    correlation_id: Uuid::new_v4(),
                    story_id,
                },
                clock,
                &self.store,
                &self.store,
                &self.broadcaster,
            )
            .await
            .unwrap()
        }

        async fn vote(
            &self,
            story_id: Uuid,
            participant_id: Uuid,
            value: &str,
        ) -> Result<VoteReceipt, DomainError> {
            handle_submit_vote(
                &SubmitVote {
                    correlation_id: Uuid::new_v4(),
                    story_id,
                    participant_id,
                    value: value.to_owned(),
                },
                &FixedClock(fixed_now()),
                &self.store,
                &self.store,
                &self.store,
                &self.store,
                &self.broadcaster,
            )
            .await
        }

        async fn complete(&self, story_id: Uuid, estimate: Option<&str>) -> StoryView {
            handle_complete_story(
                &CompleteStory {
                    correlation_id: Uuid::new_v4(),
                    story_id,
                    estimate: estimate.map(str::to_owned),
                },
                &FixedClock(fixed_now()),
                &self.store,
                &self.store,
                &self.broadcaster,
            )
            .await
            .unwrap()
        }
    }

    // --- create_story tests ---

    #[tokio::test]
    async fn test_create_story_appends_after_last_story() {
        // Arrange
        let fx = Fixture::new().await;

        // Act
        let first = fx.create_story("First").await;
        let second = fx.create_story("Second").await;

        // Assert
        assert_eq!(first.sort_order, 0);
        assert_eq!(second.sort_order, 1);
        assert_eq!(second.state, StoryState::Pending);
        assert_eq!(
            fx.broadcaster.event_types(),
            vec!["estimation.story_created", "estimation.story_created"]
        );
    }

    #[tokio::test]
    async fn test_create_story_in_unknown_room_is_not_found() {
        let store = InMemoryStore::new();
        let command = CreateStory {
            correlation_id: Uuid::new_v4(),
            room_id: Uuid::new_v4(),
            title: "Orphan".to_owned(),
            description: None,
            external_ref: None,
            external_url: None,
            sort_order: Some(4),
        };

        let result = handle_create_story(
            &command,
            &FixedClock(fixed_now()),
            &store,
            &store,
            &RecordingBroadcaster::new(),
        )
        .await;

        assert!(matches!(
            result,
            Err(DomainError::NotFound { entity: "room", .. })
        ));
    }

    // --- start_voting tests ---

    #[tokio::test]
    async fn test_start_voting_reveals_previous_story_with_votes() {
        // Arrange
        let fx = Fixture::new().await;
        let a = fx.create_story("A").await;
        let b = fx.create_story("B").await;
        fx.start(a.story_id, &FixedClock(fixed_now())).await;
        fx.vote(a.story_id, fx.voter.id, "5").await.unwrap();
        let later = fixed_now() + Duration::minutes(5);

        // Act
        let view = fx.start(b.story_id, &FixedClock(later)).await;

        // Assert
        assert_eq!(view.state, StoryState::Voting);
        assert_eq!(view.voting_started_at, Some(later));
        let a_after = load_story(&fx.store, a.story_id).await.unwrap();
        assert_eq!(a_after.state(), StoryState::Revealed);
        assert_eq!(a_after.revealed_at, Some(later));
        let voting: Vec<Story> = fx
            .store
            .list_stories(fx.room.id)
            .await
            .unwrap()
            .iter()
            .map(Story::from_stored)
            .filter(|s| s.state() == StoryState::Voting)
            .collect();
        assert_eq!(voting.len(), 1);
    }

    #[tokio::test]
    async fn test_reset_voting_displaces_the_story_being_voted_on() {
        // Arrange
        let fx = Fixture::new().await;
        let a = fx.create_story("A").await;
        let b = fx.create_story("B").await;
        fx.start(a.story_id, &FixedClock(fixed_now())).await;
        fx.vote(a.story_id, fx.voter.id, "3").await.unwrap();
        fx.complete(a.story_id, None).await;
        fx.start(b.story_id, &FixedClock(fixed_now())).await;
        fx.vote(b.story_id, fx.voter.id, "8").await.unwrap();
        let later = fixed_now() + Duration::minutes(2);

        // Act
        let view = handle_reset_voting(
            &ResetVoting {
                correlation_id: Uuid::new_v4(),
                story_id: a.story_id,
            },
            &FixedClock(later),
            &fx.store,
            &fx.store,
            &fx.broadcaster,
        )
        .await
        .unwrap();

        // Assert
        assert_eq!(view.state, StoryState::Voting);
        let b_after = load_story(&fx.store, b.story_id).await.unwrap();
        assert_eq!(b_after.state(), StoryState::Revealed);
        assert_eq!(b_after.revealed_at, Some(later));
        let voting = fx
            .store
            .list_stories(fx.room.id)
            .await
            .unwrap()
            .iter()
            .map(Story::from_stored)
            .filter(|s| s.state() == StoryState::Voting)
            .count();
        assert_eq!(voting, 1);
        assert!(fx.store.list_votes(a.story_id).await.unwrap().is_empty());
        assert_eq!(fx.store.list_votes(b.story_id).await.unwrap().len(), 1);
        let last = fx.broadcaster.messages().pop().unwrap();
        assert_eq!(last.metadata.event_type, "estimation.voting_reset");
        let forced = &last.payload["VotingReset"]["forced_transitions"];
        assert_eq!(forced[0]["story_id"], b.story_id.to_string());
        assert_eq!(forced[0]["outcome"], "revealed");
    }

    #[tokio::test]
    async fn test_start_voting_resets_previous_story_without_votes() {
        let fx = Fixture::new().await;
        let a = fx.create_story("A").await;
        let b = fx.create_story("B").await;
        fx.start(a.story_id, &FixedClock(fixed_now())).await;

        fx.start(b.story_id, &FixedClock(fixed_now())).await;

        let a_after = load_story(&fx.store, a.story_id).await.unwrap();
        assert_eq!(a_after.state(), StoryState::Pending);
        assert!(a_after.voting_started_at.is_none());
    }

    #[tokio::test]
    async fn test_start_voting_event_lists_forced_transitions() {
        let fx = Fixture::new().await;
        let a = fx.create_story("A").await;
        let b = fx.create_story("B").await;
        fx.start(a.story_id, &FixedClock(fixed_now())).await;

        fx.start(b.story_id, &FixedClock(fixed_now())).await;

        let last = fx.broadcaster.messages().pop().unwrap();
        assert_eq!(last.metadata.event_type, "estimation.voting_started");
        let forced = &last.payload["VotingStarted"]["forced_transitions"];
        assert_eq!(forced[0]["story_id"], a.story_id.to_string());
        assert_eq!(forced[0]["outcome"], "pending");
    }

    #[tokio::test]
    async fn test_start_voting_on_completed_story_opens_new_round() {
        let fx = Fixture::new().await;
        let a = fx.create_story("A").await;
        fx.start(a.story_id, &FixedClock(fixed_now())).await;
        fx.complete(a.story_id, Some("3")).await;

        let view = fx.start(a.story_id, &FixedClock(fixed_now())).await;

        assert_eq!(view.state, StoryState::Voting);
        assert!(view.final_estimate.is_none());
    }

    // --- reveal tests ---

    #[tokio::test]
    async fn test_reveal_twice_is_a_noop() {
        // Arrange
        let fx = Fixture::new().await;
        let a = fx.create_story("A").await;
        fx.start(a.story_id, &FixedClock(fixed_now())).await;
        let first = fixed_now() + Duration::seconds(30);
        let command = RevealVotes {
            correlation_id: Uuid::new_v4(),
            story_id: a.story_id,
        };

        // Act
        handle_reveal_votes(
            &command,
            &FixedClock(first),
            &fx.store,
            &fx.store,
            &fx.broadcaster,
        )
        .await
        .unwrap();
        let again = handle_reveal_votes(
            &command,
            &FixedClock(first + Duration::seconds(30)),
            &fx.store,
            &fx.store,
            &fx.broadcaster,
        )
        .await
        .unwrap();

        // Assert
        assert_eq!(again.revealed_at, Some(first));
        let reveals = fx
            .broadcaster
            .event_types()
            .into_iter()
            .filter(|t| t == "estimation.votes_revealed")
            .count();
        assert_eq!(reveals, 1);
    }

    #[tokio::test]
    async fn test_reveal_exposes_vote_values() {
        let fx = Fixture::new().await;
        let a = fx.create_story("A").await;
        fx.start(a.story_id, &FixedClock(fixed_now())).await;
        fx.vote(a.story_id, fx.voter.id, "8").await.unwrap();

        let view = handle_reveal_votes(
            &RevealVotes {
                correlation_id: Uuid::new_v4(),
                story_id: a.story_id,
            },
            &FixedClock(fixed_now()),
            &fx.store,
            &fx.store,
            &fx.broadcaster,
        )
        .await
        .unwrap();

        assert_eq!(view.state, StoryState::Revealed);
        assert_eq!(view.votes[0].value.as_deref(), Some("8"));
    }

    // --- complete tests ---

    #[tokio::test]
    async fn test_complete_without_estimate_uses_suggestion() {
        let fx = Fixture::new().await;
        let a = fx.create_story("A").await;
        fx.start(a.story_id, &FixedClock(fixed_now())).await;
        fx.vote(a.story_id, fx.admin.id, "5").await.unwrap();
        fx.vote(a.story_id, fx.voter.id, "8").await.unwrap();

        let view = fx.complete(a.story_id, None).await;

        assert_eq!(view.state, StoryState::Completed);
        assert_eq!(view.final_estimate.as_deref(), Some("5"));
        assert_eq!(view.revealed_at, Some(fixed_now()));
    }

    #[tokio::test]
    async fn test_complete_with_explicit_estimate_overrides_votes() {
        let fx = Fixture::new().await;
        let a = fx.create_story("A").await;
        fx.start(a.story_id, &FixedClock(fixed_now())).await;
        fx.vote(a.story_id, fx.voter.id, "2").await.unwrap();

        let view = fx.complete(a.story_id, Some(" 13 ")).await;

        assert_eq!(view.final_estimate.as_deref(), Some("13"));
        let events = fx.broadcaster.messages();
        let completed = events.last().unwrap();
        assert_eq!(completed.payload["StoryCompleted"]["final_estimate"], "13");
    }

    #[tokio::test]
    async fn test_complete_without_votes_stays_revealed() {
        let fx = Fixture::new().await;
        let a = fx.create_story("A").await;
        fx.start(a.story_id, &FixedClock(fixed_now())).await;

        let view = fx.complete(a.story_id, None).await;

        assert_eq!(view.state, StoryState::Revealed);
        assert!(view.final_estimate.is_none());
    }

    #[tokio::test]
    async fn test_complete_rejects_blank_estimate() {
        let fx = Fixture::new().await;
        let a = fx.create_story("A").await;

        let result = handle_complete_story(
            &CompleteStory {
                correlation_id: Uuid::new_v4(),
                story_id: a.story_id,
                estimate: Some("  ".to_owned()),
            },
            &FixedClock(fixed_now()),
            &fx.store,
            &fx.store,
            &fx.broadcaster,
        )
        .await;

        assert!(matches!(result, Err(DomainError::Validation(_))));
    }

    // --- reset / skip tests ---

    #[tokio::test]
    async fn test_reset_voting_deletes_votes_and_reopens() {
        let fx = Fixture::new().await;
        let a = fx.create_story("A").await;
        fx.start(a.story_id, &FixedClock(fixed_now())).await;
        fx.vote(a.story_id, fx.voter.id, "3").await.unwrap();
        fx.complete(a.story_id, None).await;
        let later = fixed_now() + Duration::minutes(1);

        let view = handle_reset_voting(
            &ResetVoting {
                correlation_id: Uuid::new_v4(),
                story_id: a.story_id,
            },
            &FixedClock(later),
            &fx.store,
            &fx.store,
            &fx.broadcaster,
        )
        .await
        .unwrap();

        assert_eq!(view.state, StoryState::Voting);
        assert_eq!(view.voting_started_at, Some(later));
        assert!(view.revealed_at.is_none());
        assert!(view.final_estimate.is_none());
        assert_eq!(fx.store.vote_count(), 0);
    }

    #[tokio::test]
    async fn test_skip_pending_story_sets_timestamps_to_now() {
        let fx = Fixture::new().await;
        let a = fx.create_story("A").await;
        let now = fixed_now() + Duration::hours(1);

        let view = handle_skip_story(
            &SkipStory {
                correlation_id: Uuid::new_v4(),
                story_id: a.story_id,
            },
            &FixedClock(now),
            &fx.store,
            &fx.store,
            &fx.broadcaster,
        )
        .await
        .unwrap();

        assert_eq!(view.state, StoryState::Completed);
        assert_eq!(view.final_estimate.as_deref(), Some(SKIPPED_ESTIMATE));
        assert_eq!(view.voting_started_at, Some(now));
        assert_eq!(view.revealed_at, Some(now));
    }

    // --- submit_vote tests ---

    #[tokio::test]
    async fn test_revote_replaces_previous_vote() {
        // Arrange
        let fx = Fixture::new().await;
        let a = fx.create_story("A").await;
        fx.start(a.story_id, &FixedClock(fixed_now())).await;

        // Act
        let first = fx.vote(a.story_id, fx.voter.id, "3").await.unwrap();
        let second = fx.vote(a.story_id, fx.voter.id, "13").await.unwrap();

        // Assert
        assert_eq!(first.vote_id, second.vote_id);
        let stored = fx.store.list_votes(a.story_id).await.unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].value, "13");
    }

    #[tokio::test]
    async fn test_vote_cast_event_never_carries_value() {
        let fx = Fixture::new().await;
        let a = fx.create_story("A").await;
        fx.start(a.story_id, &FixedClock(fixed_now())).await;

        fx.vote(a.story_id, fx.voter.id, "21").await.unwrap();

        let last = fx.broadcaster.messages().pop().unwrap();
        assert_eq!(last.metadata.event_type, "estimation.vote_cast");
        let payload = last.payload["VoteCast"].as_object().unwrap();
        assert!(!payload.contains_key("value"));
        assert!(!payload.values().any(|v| v == "21"));
    }

    #[tokio::test]
    async fn test_vote_not_in_deck_is_invalid() {
        let fx = Fixture::new().await;
        let a = fx.create_story("A").await;
        fx.start(a.story_id, &FixedClock(fixed_now())).await;

        let result = fx.vote(a.story_id, fx.voter.id, "XL").await;

        assert!(matches!(result, Err(DomainError::InvalidVote { .. })));
        assert_eq!(fx.store.vote_count(), 0);
    }

    #[tokio::test]
    async fn test_observer_cannot_vote() {
        let fx = Fixture::new().await;
        let a = fx.create_story("A").await;
        fx.start(a.story_id, &FixedClock(fixed_now())).await;

        let result = fx.vote(a.story_id, fx.observer.id, "5").await;

        assert!(matches!(result, Err(DomainError::Validation(_))));
    }

    #[tokio::test]
    async fn test_vote_on_pending_story_is_state_conflict() {
        let fx = Fixture::new().await;
        let a = fx.create_story("A").await;

        let result = fx.vote(a.story_id, fx.voter.id, "5").await;

        assert!(matches!(result, Err(DomainError::StateConflict(_))));
    }

    #[tokio::test]
    async fn test_vote_on_revealed_story_is_state_conflict() {
        let fx = Fixture::new().await;
        let a = fx.create_story("A").await;
        fx.start(a.story_id, &FixedClock(fixed_now())).await;
        fx.complete(a.story_id, None).await;

        let result = fx.vote(a.story_id, fx.voter.id, "5").await;

        assert!(matches!(result, Err(DomainError::StateConflict(_))));
    }

    #[tokio::test]
    async fn test_vote_from_other_room_is_rejected() {
        let fx = Fixture::new().await;
        let a = fx.create_story("A").await;
        fx.start(a.story_id, &FixedClock(fixed_now())).await;
        let other_room = Room::create(
            Uuid::new_v4(),
            "Elsewhere",
            CardDeck::Fibonacci,
            false,
            None,
            "000000",
            fixed_now(),
        )
        .unwrap();
        let stranger = Participant::join(
            Uuid::new_v4(),
            &other_room,
            "Eve",
            ParticipantRole::Participant,
            None,
            fixed_now(),
        )
        .unwrap();
        fx.store
            .save_participant(&stranger.to_stored())
            .await
            .unwrap();

        let result = fx.vote(a.story_id, stranger.id, "5").await;

        assert!(matches!(result, Err(DomainError::Validation(_))));
    }

    #[tokio::test]
    async fn test_vote_for_unknown_participant_is_not_found() {
        let fx = Fixture::new().await;
        let a = fx.create_story("A").await;

        let result = fx.vote(a.story_id, Uuid::new_v4(), "5").await;

        assert!(matches!(
            result,
            Err(DomainError::NotFound {
                entity: "participant",
                ..
            })
        ));
    }

    // --- failure propagation ---

    #[tokio::test]
    async fn test_persistence_failure_propagates_and_publishes_nothing() {
        let broadcaster = RecordingBroadcaster::new();

        let result = handle_skip_story(
            &SkipStory {
                correlation_id: Uuid::new_v4(),
                story_id: Uuid::new_v4(),
            },
            &FixedClock(fixed_now()),
            &FailingStore,
            &FailingStore,
            &broadcaster,
        )
        .await;

        assert!(matches!(result, Err(DomainError::Persistence(_))));
        assert!(broadcaster.messages().is_empty());
    }

    #[tokio::test]
    async fn test_stale_version_is_a_concurrency_conflict() {
        let fx = Fixture::new().await;
        let a = fx.create_story("A").await;
        let stale = load_story(&fx.store, a.story_id).await.unwrap();
        fx.start(a.story_id, &FixedClock(fixed_now())).await;

        let mut stale = stale;
        stale.skip(fixed_now());
        let result = commit(&fx.store, std::slice::from_mut(&mut stale), Vec::new()).await;

        assert!(matches!(
            result,
            Err(DomainError::ConcurrencyConflict { .. })
        ));
    }
}
