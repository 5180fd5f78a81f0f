//! Query handlers for the Estimation context.
//!
//! Every projection of a vote goes through [`VoteView::new`], which drops
//! the card value while the story's votes are hidden.

use chrono::{DateTime, Utc};
use planpoker_core::clock::Clock;
use planpoker_core::error::DomainError;
use planpoker_core::repository::{
    ParticipantRepository, RoomRepository, StoryRepository, VoteRepository,
};
use planpoker_room::application::command_handlers::{load_room, load_roster};
use serde::Serialize;
use uuid::Uuid;

use crate::domain::aggregates::{Story, StoryState};
use crate::domain::coordinator::current_story;
use crate::domain::progress::VotingProgress;
use crate::domain::statistics::{Ballot, VoteStatistics, compute_statistics};
use crate::domain::vote::Vote;

/// Read-only view of a vote.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VoteView {
    /// The vote identifier.
    pub vote_id: Uuid,
    /// The voter.
    pub participant_id: Uuid,
    /// Card value, omitted until the story is revealed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    /// Last submission.
    pub updated_at: DateTime<Utc>,
}

impl VoteView {
    /// Projects `vote`, withholding its value unless `visible`.
    #[must_use]
    pub fn new(vote: &Vote, visible: bool) -> Self {
        Self {
            vote_id: vote.id,
            participant_id: vote.participant_id,
            value: visible.then(|| vote.value.clone()),
            updated_at: vote.updated_at,
        }
    }
}

/// Read-only view of a story with its votes.
#[derive(Debug, Clone, Serialize)]
pub struct StoryView {
    /// The story identifier.
    pub story_id: Uuid,
    /// The room identifier.
    pub room_id: Uuid,
    /// Title.
    pub title: String,
    /// Optional description.
    pub description: Option<String>,
    /// External ticket key.
    pub external_ref: Option<String>,
    /// External ticket URL.
    pub external_url: Option<String>,
    /// Derived state.
    pub state: StoryState,
    /// Final estimate.
    pub final_estimate: Option<String>,
    /// Position in the room.
    pub sort_order: i32,
    /// Start of the current round.
    pub voting_started_at: Option<DateTime<Utc>>,
    /// Reveal of the current round.
    pub revealed_at: Option<DateTime<Utc>>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Number of votes cast.
    pub vote_count: usize,
    /// The votes, values hidden until reveal.
    pub votes: Vec<VoteView>,
}

impl StoryView {
    /// Builds the view of `story` with its `votes`.
    #[must_use]
    pub fn new(story: &Story, votes: &[Vote]) -> Self {
        let visible = story.votes_visible();
        Self {
            story_id: story.id,
            room_id: story.room_id,
            title: story.title.clone(),
            description: story.description.clone(),
            external_ref: story.external_ref.clone(),
            external_url: story.external_url.clone(),
            state: story.state(),
            final_estimate: story.final_estimate.clone(),
            sort_order: story.sort_order,
            voting_started_at: story.voting_started_at,
            revealed_at: story.revealed_at,
            created_at: story.created_at,
            vote_count: votes.len(),
            votes: votes.iter().map(|v| VoteView::new(v, visible)).collect(),
        }
    }
}

/// Loads a story by ID.
///
/// # Errors
///
/// Returns `DomainError::NotFound` if the story does not exist.
pub async fn load_story(
    stories: &dyn StoryRepository,
    story_id: Uuid,
) -> Result<Story, DomainError> {
    let stored = stories
        .load_story(story_id)
        .await?
        .ok_or_else(|| DomainError::not_found("story", story_id))?;
    Ok(Story::from_stored(&stored))
}

/// Loads the votes of a story.
///
/// # Errors
///
/// Returns `DomainError::Persistence` if loading fails.
pub async fn load_votes(
    votes: &dyn VoteRepository,
    story_id: Uuid,
) -> Result<Vec<Vote>, DomainError> {
    Ok(votes
        .list_votes(story_id)
        .await?
        .iter()
        .map(Vote::from_stored)
        .collect())
}

/// Builds the view of a story, loading its votes.
///
/// # Errors
///
/// Returns `DomainError::Persistence` if loading the votes fails.
pub async fn story_view(
    story: &Story,
    votes: &dyn VoteRepository,
) -> Result<StoryView, DomainError> {
    let story_votes = load_votes(votes, story.id).await?;
    Ok(StoryView::new(story, &story_votes))
}

/// Retrieves a story.
///
/// # Errors
///
/// Returns `DomainError::NotFound` if the story does not exist.
pub async fn get_story(
    story_id: Uuid,
    stories: &dyn StoryRepository,
    votes: &dyn VoteRepository,
) -> Result<StoryView, DomainError> {
    let story = load_story(stories, story_id).await?;
    story_view(&story, votes).await
}

/// Lists the stories of a room in display order, optionally only those in
/// `state`.
///
/// # Errors
///
/// Returns `DomainError::NotFound` if the room does not exist.
pub async fn list_stories(
    room_id: Uuid,
    state: Option<StoryState>,
    rooms: &dyn RoomRepository,
    stories: &dyn StoryRepository,
    votes: &dyn VoteRepository,
) -> Result<Vec<StoryView>, DomainError> {
    load_room(rooms, room_id).await?;
    let mut views = Vec::new();
    for stored in stories.list_stories(room_id).await? {
        let story = Story::from_stored(&stored);
        if state.is_some_and(|s| s != story.state()) {
            continue;
        }
        views.push(story_view(&story, votes).await?);
    }
    Ok(views)
}

/// Retrieves the story of a room that is currently in voting.
///
/// # Errors
///
/// Returns `DomainError::NotFound` if the room does not exist.
pub async fn get_current_story(
    room_id: Uuid,
    rooms: &dyn RoomRepository,
    stories: &dyn StoryRepository,
    votes: &dyn VoteRepository,
) -> Result<Option<StoryView>, DomainError> {
    load_room(rooms, room_id).await?;
    let room_stories: Vec<Story> = stories
        .list_stories(room_id)
        .await?
        .iter()
        .map(Story::from_stored)
        .collect();
    match current_story(&room_stories) {
        Some(story) => Ok(Some(story_view(story, votes).await?)),
        None => Ok(None),
    }
}

/// Aggregates the votes of a story. Empty until the votes are revealed.
///
/// # Errors
///
/// Returns `DomainError::NotFound` if the story does not exist.
pub async fn get_statistics(
    story_id: Uuid,
    stories: &dyn StoryRepository,
    votes: &dyn VoteRepository,
    participants: &dyn ParticipantRepository,
) -> Result<VoteStatistics, DomainError> {
    let story = load_story(stories, story_id).await?;
    if !story.votes_visible() {
        return Ok(VoteStatistics::empty());
    }
    let story_votes = load_votes(votes, story.id).await?;
    let roster = load_roster(participants, story.room_id).await?;

    let ballots: Vec<Ballot> = story_votes
        .into_iter()
        .map(|vote| {
            let voter = roster.iter().find(|p| p.id == vote.participant_id);
            Ballot {
                voter_name: voter.map_or_else(|| "Unknown".to_owned(), |p| p.name.clone()),
                avatar_emoji: voter.and_then(|p| p.avatar_emoji.clone()),
                vote,
            }
        })
        .collect();
    Ok(compute_statistics(&story, &ballots))
}

/// Computes the voting progress of a story.
///
/// # Errors
///
/// Returns `DomainError::NotFound` if the story does not exist.
pub async fn get_progress(
    story_id: Uuid,
    clock: &dyn Clock,
    stories: &dyn StoryRepository,
    votes: &dyn VoteRepository,
    participants: &dyn ParticipantRepository,
) -> Result<VotingProgress, DomainError> {
    let now = clock.now();
    let story = load_story(stories, story_id).await?;
    let vote_count = votes.list_votes(story.id).await?.len();
    let roster = load_roster(participants, story.room_id).await?;
    Ok(VotingProgress::compute(&story, vote_count, &roster, now))
}
