//! Persistence ports.
//!
//! Stored records are plain data; each bounded context converts them into
//! its own domain types. Implementations must report every storage failure
//! as [`DomainError::Persistence`].

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::DomainError;

/// Stored representation of a room.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredRoom {
    /// Room identifier.
    pub id: Uuid,
    /// Display name.
    pub name: String,
    /// URL-friendly unique slug.
    pub slug: String,
    /// Card deck name (`fibonacci`, `modified_fibonacci`, `tshirt`, `powers_of_2`).
    pub card_deck: String,
    /// Whether observers may join.
    pub allow_observers: bool,
    /// Voting time limit in seconds; `None` means unlimited.
    pub voting_time_limit: Option<i32>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// Stored representation of a room participant.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredParticipant {
    /// Participant identifier.
    pub id: Uuid,
    /// Room the participant belongs to.
    pub room_id: Uuid,
    /// Display name.
    pub name: String,
    /// Role name (`admin`, `participant`, `observer`).
    pub role: String,
    /// Optional avatar emoji shown next to the name.
    pub avatar_emoji: Option<String>,
    /// Presence flag.
    pub is_online: bool,
    /// Last presence update.
    pub last_seen_at: Option<DateTime<Utc>>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// Stored representation of a story.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredStory {
    /// Story identifier.
    pub id: Uuid,
    /// Room the story belongs to.
    pub room_id: Uuid,
    /// Title.
    pub title: String,
    /// Optional description.
    pub description: Option<String>,
    /// Optional external ticket key (e.g. `PROJ-123`).
    pub external_ref: Option<String>,
    /// Optional external ticket URL.
    pub external_url: Option<String>,
    /// Final estimate; set once the story is completed.
    pub final_estimate: Option<String>,
    /// Position within the room.
    pub sort_order: i32,
    /// When the current voting round started.
    pub voting_started_at: Option<DateTime<Utc>>,
    /// When the votes were first revealed.
    pub revealed_at: Option<DateTime<Utc>>,
    /// Optimistic concurrency version, incremented on every committed write.
    pub version: i64,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// Stored representation of a vote.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredVote {
    /// Vote identifier.
    pub id: Uuid,
    /// Room the vote was cast in.
    pub room_id: Uuid,
    /// Story the vote belongs to.
    pub story_id: Uuid,
    /// Participant who cast the vote.
    pub participant_id: Uuid,
    /// Card value.
    pub value: String,
    /// First submission.
    pub created_at: DateTime<Utc>,
    /// Last submission.
    pub updated_at: DateTime<Utc>,
}

/// Stored representation of Jira connection settings.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredJiraSettings {
    /// Settings identifier.
    pub id: Uuid,
    /// Owner of the settings; `None` for the global settings.
    pub owner_id: Option<String>,
    /// Jira host, e.g. `acme.atlassian.net`.
    pub jira_domain: String,
    /// Account email used for API authentication.
    pub jira_email: String,
    /// API token. Never leaves the backend.
    pub jira_api_token: String,
    /// Default project key.
    pub jira_project_key: Option<String>,
    /// Whether these are the owner's active settings.
    pub is_active: bool,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update.
    pub updated_at: DateTime<Utc>,
}

/// A set of story writes committed atomically.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StoryWriteBatch {
    /// Stories to write. Each carries the version it was loaded with.
    pub stories: Vec<StoredStory>,
    /// Stories whose votes are deleted in the same transaction.
    pub clear_votes_for: Vec<Uuid>,
}

/// Repository for rooms.
#[async_trait]
pub trait RoomRepository: Send + Sync {
    /// Loads a room by ID.
    async fn load_room(&self, room_id: Uuid) -> Result<Option<StoredRoom>, DomainError>;

    /// Loads a room by slug.
    async fn find_room_by_slug(&self, slug: &str) -> Result<Option<StoredRoom>, DomainError>;

    /// Inserts a new room.
    async fn insert_room(&self, room: &StoredRoom) -> Result<(), DomainError>;
}

/// Repository for room participants.
#[async_trait]
pub trait ParticipantRepository: Send + Sync {
    /// Loads a participant by ID.
    async fn load_participant(
        &self,
        participant_id: Uuid,
    ) -> Result<Option<StoredParticipant>, DomainError>;

    /// Lists all participants of a room in join order.
    async fn list_participants(&self, room_id: Uuid)
    -> Result<Vec<StoredParticipant>, DomainError>;

    /// Inserts or updates a participant.
    async fn save_participant(&self, participant: &StoredParticipant) -> Result<(), DomainError>;
}

/// Repository for stories.
#[async_trait]
pub trait StoryRepository: Send + Sync {
    /// Loads a story by ID.
    async fn load_story(&self, story_id: Uuid) -> Result<Option<StoredStory>, DomainError>;

    /// Lists the stories of a room ordered by `sort_order`, then `created_at`.
    async fn list_stories(&self, room_id: Uuid) -> Result<Vec<StoredStory>, DomainError>;

    /// Inserts a new story.
    async fn insert_story(&self, story: &StoredStory) -> Result<(), DomainError>;

    /// Atomically writes all stories of the batch and deletes the votes of
    /// the listed stories.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::ConcurrencyConflict` if any story's stored
    /// version differs from the version it carries; nothing is written in
    /// that case.
    async fn commit_stories(&self, batch: StoryWriteBatch) -> Result<(), DomainError>;
}

/// Repository for votes.
#[async_trait]
pub trait VoteRepository: Send + Sync {
    /// Lists the votes of a story in submission order.
    async fn list_votes(&self, story_id: Uuid) -> Result<Vec<StoredVote>, DomainError>;

    /// Inserts a vote or overwrites the value of the existing vote for the
    /// same `(story_id, participant_id)` pair. Returns the stored row.
    async fn upsert_vote(&self, vote: &StoredVote) -> Result<StoredVote, DomainError>;
}

/// Repository for Jira settings.
#[async_trait]
pub trait JiraSettingsRepository: Send + Sync {
    /// Returns the active settings of an owner.
    async fn find_active(
        &self,
        owner_id: Option<&str>,
    ) -> Result<Option<StoredJiraSettings>, DomainError>;

    /// Loads settings by ID.
    async fn load_settings(&self, id: Uuid) -> Result<Option<StoredJiraSettings>, DomainError>;

    /// Inserts active settings, deactivating the owner's previous active
    /// settings in the same transaction.
    async fn insert_active(&self, settings: &StoredJiraSettings) -> Result<(), DomainError>;

    /// Overwrites existing settings.
    async fn update_settings(&self, settings: &StoredJiraSettings) -> Result<(), DomainError>;

    /// Deletes settings. Returns `false` if nothing was deleted.
    async fn delete_settings(&self, id: Uuid) -> Result<bool, DomainError>;
}
