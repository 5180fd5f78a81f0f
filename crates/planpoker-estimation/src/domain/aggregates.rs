//! The story aggregate and its voting state machine.
//!
//! A story has no stored status. Its state is derived from three nullable
//! fields by [`derive_state`], which is the only place that interprets
//! them.

use chrono::{DateTime, Utc};
use planpoker_core::error::DomainError;
use planpoker_core::repository::StoredStory;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Final estimate recorded for a skipped story.
pub const SKIPPED_ESTIMATE: &str = "skipped";

const MAX_TITLE_LEN: usize = 255;

/// Voting state of a story.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoryState {
    /// Voting has not started.
    Pending,
    /// Votes are being collected and hidden.
    Voting,
    /// Votes are visible; no final estimate yet.
    Revealed,
    /// A final estimate (or the skip marker) has been recorded.
    Completed,
}

impl StoryState {
    /// Wire name of the state.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Voting => "voting",
            Self::Revealed => "revealed",
            Self::Completed => "completed",
        }
    }

    /// Whether individual vote values may be shown in this state.
    #[must_use]
    pub fn votes_visible(self) -> bool {
        matches!(self, Self::Revealed | Self::Completed)
    }
}

impl std::str::FromStr for StoryState {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "voting" => Ok(Self::Voting),
            "revealed" => Ok(Self::Revealed),
            "completed" => Ok(Self::Completed),
            other => Err(DomainError::Validation(format!("unknown story state: {other}"))),
        }
    }
}

/// Derives the state of a story from its timestamps and final estimate.
///
/// A final estimate wins over everything else, then a reveal timestamp,
/// then the start timestamp.
#[must_use]
pub fn derive_state(story: &Story) -> StoryState {
    if story.final_estimate.is_some() {
        StoryState::Completed
    } else if story.revealed_at.is_some() {
        StoryState::Revealed
    } else if story.voting_started_at.is_none() {
        StoryState::Pending
    } else {
        StoryState::Voting
    }
}

/// The aggregate root for a story.
#[derive(Debug, Clone, PartialEq)]
pub struct Story {
    /// Story identifier.
    pub id: Uuid,
    /// Room the story belongs to.
    pub room_id: Uuid,
    /// Title.
    pub title: String,
    /// Optional description.
    pub description: Option<String>,
    /// Optional external ticket key.
    pub external_ref: Option<String>,
    /// Optional external ticket URL.
    pub external_url: Option<String>,
    /// Final estimate, `None` until completed.
    pub final_estimate: Option<String>,
    /// Position within the room.
    pub sort_order: i32,
    /// Start of the current voting round.
    pub voting_started_at: Option<DateTime<Utc>>,
    /// First reveal of the current round.
    pub revealed_at: Option<DateTime<Utc>>,
    /// Version the story was loaded with.
    pub(crate) version: i64,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
}

impl Story {
    /// Creates a pending story.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if the title is blank or too long.
    #[allow(clippy::too_many_arguments)]
    pub fn create(
        id: Uuid,
        room_id: Uuid,
        title: &str,
        description: Option<String>,
        external_ref: Option<String>,
        external_url: Option<String>,
        sort_order: i32,
        now: DateTime<Utc>,
    ) -> Result<Self, DomainError> {
        let title = title.trim();
        if title.is_empty() {
            return Err(DomainError::Validation(
                "story title must not be blank".to_owned(),
            ));
        }
        if title.chars().count() > MAX_TITLE_LEN {
            return Err(DomainError::Validation(format!(
                "story title must be at most {MAX_TITLE_LEN} characters"
            )));
        }
        Ok(Self {
            id,
            room_id,
            title: title.to_owned(),
            description: non_blank(description),
            external_ref: non_blank(external_ref),
            external_url: non_blank(external_url),
            final_estimate: None,
            sort_order,
            voting_started_at: None,
            revealed_at: None,
            version: 0,
            created_at: now,
        })
    }

    /// Current state, see [`derive_state`].
    #[must_use]
    pub fn state(&self) -> StoryState {
        derive_state(self)
    }

    /// Whether individual vote values may be shown.
    #[must_use]
    pub fn votes_visible(&self) -> bool {
        self.state().votes_visible()
    }

    /// Version the story was loaded with.
    #[must_use]
    pub fn version(&self) -> i64 {
        self.version
    }

    /// Opens a fresh voting round. Allowed from any state.
    pub fn begin_voting(&mut self, now: DateTime<Utc>) {
        self.voting_started_at = Some(now);
        self.revealed_at = None;
        self.final_estimate = None;
    }

    /// Takes a story out of the voting state because another story of the
    /// room starts voting. A story with votes is revealed, one without is
    /// reset to pending. Returns the resulting state.
    pub fn yield_voting(&mut self, has_votes: bool, now: DateTime<Utc>) -> StoryState {
        if has_votes {
            self.reveal(now);
        } else {
            self.voting_started_at = None;
        }
        self.state()
    }

    /// Reveals the votes. Returns `false` if they were already revealed, in
    /// which case nothing changes.
    pub fn reveal(&mut self, now: DateTime<Utc>) -> bool {
        if self.revealed_at.is_some() {
            return false;
        }
        self.revealed_at = Some(now);
        true
    }

    /// Records the final estimate. The first reveal timestamp is kept.
    ///
    /// With `None` the story stays revealed without an estimate.
    pub fn complete(&mut self, estimate: Option<String>, now: DateTime<Utc>) {
        self.reveal(now);
        self.final_estimate = estimate;
    }

    /// Marks the story as skipped. Missing timestamps are filled with `now`.
    pub fn skip(&mut self, now: DateTime<Utc>) {
        self.voting_started_at.get_or_insert(now);
        self.revealed_at.get_or_insert(now);
        self.final_estimate = Some(SKIPPED_ESTIMATE.to_owned());
    }

    /// Seconds between the start of voting and the reveal (or `now` while
    /// still voting). `None` if voting never started.
    #[must_use]
    pub fn voting_duration_secs(&self, now: DateTime<Utc>) -> Option<i64> {
        let started = self.voting_started_at?;
        let end = self.revealed_at.unwrap_or(now);
        Some((end - started).num_seconds().max(0))
    }

    /// Rebuilds a story from its stored record.
    #[must_use]
    pub fn from_stored(stored: &StoredStory) -> Self {
        Self {
            id: stored.id,
            room_id: stored.room_id,
            title: stored.title.clone(),
            description: stored.description.clone(),
            external_ref: stored.external_ref.clone(),
            external_url: stored.external_url.clone(),
            final_estimate: stored.final_estimate.clone(),
            sort_order: stored.sort_order,
            voting_started_at: stored.voting_started_at,
            revealed_at: stored.revealed_at,
            version: stored.version,
            created_at: stored.created_at,
        }
    }

    /// Converts the story into its stored record, carrying the loaded
    /// version for the optimistic check.
    #[must_use]
    pub fn to_stored(&self) -> StoredStory {
        StoredStory {
            id: self.id,
            room_id: self.room_id,
            title: self.title.clone(),
            description: self.description.clone(),
            external_ref: self.external_ref.clone(),
            external_url: self.external_url.clone(),
            final_estimate: self.final_estimate.clone(),
            sort_order: self.sort_order,
            voting_started_at: self.voting_started_at,
            revealed_at: self.revealed_at,
            version: self.version,
            created_at: self.created_at,
        }
    }

    /// Bumps the in-memory version after a successful commit.
    pub(crate) fn mark_committed(&mut self) {
        self.version += 1;
    }
}
