//! Table rows and their conversion into persistence records.

use chrono::{DateTime, Utc};
use planpoker_core::repository::{
    StoredJiraSettings, StoredParticipant, StoredRoom, StoredStory, StoredVote,
};
use sqlx::FromRow;
use uuid::Uuid;

/// A row from the `rooms` table.
#[derive(Debug, FromRow)]
pub(crate) struct RoomRow {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub card_deck: String,
    pub allow_observers: bool,
    pub voting_time_limit: Option<i32>,
    pub created_at: DateTime<Utc>,
}

impl From<RoomRow> for StoredRoom {
    fn from(row: RoomRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            slug: row.slug,
            card_deck: row.card_deck,
            allow_observers: row.allow_observers,
            voting_time_limit: row.voting_time_limit,
            created_at: row.created_at,
        }
    }
}

/// A row from the `participants` table.
#[derive(Debug, FromRow)]
pub(crate) struct ParticipantRow {
    pub id: Uuid,
    pub room_id: Uuid,
    pub name: String,
    pub role: String,
    pub avatar_emoji: Option<String>,
    pub is_online: bool,
    pub last_seen_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<ParticipantRow> for StoredParticipant {
    fn from(row: ParticipantRow) -> Self {
        Self {
            id: row.id,
            room_id: row.room_id,
            name: row.name,
            role: row.role,
            avatar_emoji: row.avatar_emoji,
            is_online: row.is_online,
            last_seen_at: row.last_seen_at,
            created_at: row.created_at,
        }
    }
}

/// A row from the `stories` table.
#[derive(Debug, FromRow)]
pub(crate) struct StoryRow {
    pub id: Uuid,
    pub room_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub external_ref: Option<String>,
    pub external_url: Option<String>,
    pub final_estimate: Option<String>,
    pub sort_order: i32,
    pub voting_started_at: Option<DateTime<Utc>>,
    pub revealed_at: Option<DateTime<Utc>>,
    pub version: i64,
    pub created_at: DateTime<Utc>,
}

impl From<StoryRow> for StoredStory {
    fn from(row: StoryRow) -> Self {
        Self {
            id: row.id,
            room_id: row.room_id,
            title: row.title,
            description: row.description,
            external_ref: row.external_ref,
            external_url: row.external_url,
            final_estimate: row.final_estimate,
            sort_order: row.sort_order,
            voting_started_at: row.voting_started_at,
            revealed_at: row.revealed_at,
            version: row.version,
            created_at: row.created_at,
        }
    }
}

/// A row from the `votes` table.
#[derive(Debug, FromRow)]
pub(crate) struct VoteRow {
    pub id: Uuid,
    pub room_id: Uuid,
    pub story_id: Uuid,
    pub participant_id: Uuid,
    pub value: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<VoteRow> for StoredVote {
    fn from(row: VoteRow) -> Self {
        Self {
            id: row.id,
            room_id: row.room_id,
            story_id: row.story_id,
            participant_id: row.participant_id,
            value: row.value,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// A row from the `jira_settings` table.
#[derive(Debug, FromRow)]
pub(crate) struct JiraSettingsRow {
    pub id: Uuid,
    pub owner_id: Option<String>,
    pub jira_domain: String,
    pub jira_email: String,
    pub jira_api_token: String,
    pub jira_project_key: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<JiraSettingsRow> for StoredJiraSettings {
    fn from(row: JiraSettingsRow) -> Self {
        Self {
            id: row.id,
            owner_id: row.owner_id,
            jira_domain: row.jira_domain,
            jira_email: row.jira_email,
            jira_api_token: row.jira_api_token,
            jira_project_key: row.jira_project_key,
            is_active: row.is_active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}
