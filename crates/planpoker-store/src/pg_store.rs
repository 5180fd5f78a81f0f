//! `PostgreSQL` implementation of every repository trait.

use async_trait::async_trait;
use planpoker_core::error::DomainError;
use planpoker_core::repository::{
    JiraSettingsRepository, ParticipantRepository, RoomRepository, StoredJiraSettings,
    StoredParticipant, StoredRoom, StoredStory, StoredVote, StoryRepository, StoryWriteBatch,
    VoteRepository,
};
use sqlx::PgPool;
use tracing::debug;
use uuid::Uuid;

use crate::rows::{JiraSettingsRow, ParticipantRow, RoomRow, StoryRow, VoteRow};

const ROOM_COLUMNS: &str =
    "id, name, slug, card_deck, allow_observers, voting_time_limit, created_at";
const PARTICIPANT_COLUMNS: &str =
    "id, room_id, name, role, avatar_emoji, is_online, last_seen_at, created_at";
const STORY_COLUMNS: &str = "id, room_id, title, description, external_ref, external_url, \
     final_estimate, sort_order, voting_started_at, revealed_at, version, created_at";
const VOTE_COLUMNS: &str = "id, room_id, story_id, participant_id, value, created_at, updated_at";
const JIRA_COLUMNS: &str = "id, owner_id, jira_domain, jira_email, jira_api_token, \
     jira_project_key, is_active, created_at, updated_at";

#[allow(clippy::needless_pass_by_value)]
fn persistence(err: sqlx::Error) -> DomainError {
    DomainError::Persistence(err.to_string())
}

/// PostgreSQL-backed store for rooms, participants, stories, votes and
/// Jira settings.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Creates a new `PgStore`.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RoomRepository for PgStore {
    async fn load_room(&self, room_id: Uuid) -> Result<Option<StoredRoom>, DomainError> {
        let row: Option<RoomRow> =
            sqlx::query_as(&format!("SELECT {ROOM_COLUMNS} FROM rooms WHERE id = $1"))
                .bind(room_id)
                .fetch_optional(&self.pool)
                .await
                .map_err(persistence)?;
        Ok(row.map(StoredRoom::from))
    }

    async fn find_room_by_slug(&self, slug: &str) -> Result<Option<StoredRoom>, DomainError> {
        let row: Option<RoomRow> =
            sqlx::query_as(&format!("SELECT {ROOM_COLUMNS} FROM rooms WHERE slug = $1"))
                .bind(slug)
                .fetch_optional(&self.pool)
                .await
                .map_err(persistence)?;
        Ok(row.map(StoredRoom::from))
    }

    async fn insert_room(&self, room: &StoredRoom) -> Result<(), DomainError> {
        sqlx::query(&format!(
            "INSERT INTO rooms ({ROOM_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6, $7)"
        ))
        .bind(room.id)
        .bind(&room.name)
        .bind(&room.slug)
        .bind(&room.card_deck)
        .bind(room.allow_observers)
        .bind(room.voting_time_limit)
        .bind(room.created_at)
        .execute(&self.pool)
        .await
        .map_err(persistence)?;
        Ok(())
    }
}

#[async_trait]
impl ParticipantRepository for PgStore {
    async fn load_participant(
        &self,
        participant_id: Uuid,
    ) -> Result<Option<StoredParticipant>, DomainError> {
        let row: Option<ParticipantRow> = sqlx::query_as(&format!(
            "SELECT {PARTICIPANT_COLUMNS} FROM participants WHERE id = $1"
        ))
        .bind(participant_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(persistence)?;
        Ok(row.map(StoredParticipant::from))
    }

    async fn list_participants(
        &self,
        room_id: Uuid,
    ) -> Result<Vec<StoredParticipant>, DomainError> {
        let rows: Vec<ParticipantRow> = sqlx::query_as(&format!(
            "SELECT {PARTICIPANT_COLUMNS} FROM participants WHERE room_id = $1 \
             ORDER BY created_at, id"
        ))
        .bind(room_id)
        .fetch_all(&self.pool)
        .await
        .map_err(persistence)?;
        Ok(rows.into_iter().map(StoredParticipant::from).collect())
    }

    async fn save_participant(&self, participant: &StoredParticipant) -> Result<(), DomainError> {
        sqlx::query(&format!(
            "INSERT INTO participants ({PARTICIPANT_COLUMNS}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
             ON CONFLICT (id) DO UPDATE SET \
                 name = EXCLUDED.name, \
                 role = EXCLUDED.role, \
                 avatar_emoji = EXCLUDED.avatar_emoji, \
                 is_online = EXCLUDED.is_online, \
                 last_seen_at = EXCLUDED.last_seen_at"
        ))
        .bind(participant.id)
        .bind(participant.room_id)
        .bind(&participant.name)
        .bind(&participant.role)
        .bind(&participant.avatar_emoji)
        .bind(participant.is_online)
        .bind(participant.last_seen_at)
        .bind(participant.created_at)
        .execute(&self.pool)
        .await
        .map_err(persistence)?;
        Ok(())
    }
}

#[async_trait]
impl StoryRepository for PgStore {
    async fn load_story(&self, story_id: Uuid) -> Result<Option<StoredStory>, DomainError> {
        let row: Option<StoryRow> =
            sqlx::query_as(&format!("SELECT {STORY_COLUMNS} FROM stories WHERE id = $1"))
                .bind(story_id)
                .fetch_optional(&self.pool)
                .await
                .map_err(persistence)?;
        Ok(row.map(StoredStory::from))
    }

    async fn list_stories(&self, room_id: Uuid) -> Result<Vec<StoredStory>, DomainError> {
        let rows: Vec<StoryRow> = sqlx::query_as(&format!(
            "SELECT {STORY_COLUMNS} FROM stories WHERE room_id = $1 \
             ORDER BY sort_order, created_at, id"
        ))
        .bind(room_id)
        .fetch_all(&self.pool)
        .await
        .map_err(persistence)?;
        Ok(rows.into_iter().map(StoredStory::from).collect())
    }

    async fn insert_story(&self, story: &StoredStory) -> Result<(), DomainError> {
        sqlx::query(&format!(
            "INSERT INTO stories ({STORY_COLUMNS}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)"
        ))
        .bind(story.id)
        .bind(story.room_id)
        .bind(&story.title)
        .bind(&story.description)
        .bind(&story.external_ref)
        .bind(&story.external_url)
        .bind(&story.final_estimate)
        .bind(story.sort_order)
        .bind(story.voting_started_at)
        .bind(story.revealed_at)
        .bind(story.version)
        .bind(story.created_at)
        .execute(&self.pool)
        .await
        .map_err(persistence)?;
        Ok(())
    }

    async fn commit_stories(&self, batch: StoryWriteBatch) -> Result<(), DomainError> {
        let mut tx = self.pool.begin().await.map_err(persistence)?;

        for story in &batch.stories {
            let result = sqlx::query(
                "UPDATE stories SET \
                     title = $3, \
                     description = $4, \
                     external_ref = $5, \
                     external_url = $6, \
                     final_estimate = $7, \
                     sort_order = $8, \
                     voting_started_at = $9, \
                     revealed_at = $10, \
                     version = version + 1 \
                 WHERE id = $1 AND version = $2",
            )
            .bind(story.id)
            .bind(story.version)
            .bind(&story.title)
            .bind(&story.description)
            .bind(&story.external_ref)
            .bind(&story.external_url)
            .bind(&story.final_estimate)
            .bind(story.sort_order)
            .bind(story.voting_started_at)
            .bind(story.revealed_at)
            .execute(&mut *tx)
            .await
            .map_err(persistence)?;

            if result.rows_affected() == 0 {
                let actual: Option<i64> =
                    sqlx::query_scalar("SELECT version FROM stories WHERE id = $1")
                        .bind(story.id)
                        .fetch_optional(&mut *tx)
                        .await
                        .map_err(persistence)?;
                return Err(match actual {
                    Some(actual) => DomainError::ConcurrencyConflict {
                        entity_id: story.id,
                        expected: story.version,
                        actual,
                    },
                    None => DomainError::not_found("story", story.id),
                });
            }
        }

        if !batch.clear_votes_for.is_empty() {
            let deleted = sqlx::query("DELETE FROM votes WHERE story_id = ANY($1)")
                .bind(batch.clear_votes_for.as_slice())
                .execute(&mut *tx)
                .await
                .map_err(persistence)?;
            debug!(deleted = deleted.rows_affected(), "votes cleared");
        }

        tx.commit().await.map_err(persistence)
    }
}

#[async_trait]
impl VoteRepository for PgStore {
    async fn list_votes(&self, story_id: Uuid) -> Result<Vec<StoredVote>, DomainError> {
        let rows: Vec<VoteRow> = sqlx::query_as(&format!(
            "SELECT {VOTE_COLUMNS} FROM votes WHERE story_id = $1 ORDER BY created_at, id"
        ))
        .bind(story_id)
        .fetch_all(&self.pool)
        .await
        .map_err(persistence)?;
        Ok(rows.into_iter().map(StoredVote::from).collect())
    }

    async fn upsert_vote(&self, vote: &StoredVote) -> Result<StoredVote, DomainError> {
        let row: VoteRow = sqlx::query_as(&format!(
            "INSERT INTO votes ({VOTE_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6, $7) \
             ON CONFLICT (story_id, participant_id) DO UPDATE SET \
                 value = EXCLUDED.value, \
                 updated_at = EXCLUDED.updated_at \
             RETURNING {VOTE_COLUMNS}"
        ))
        .bind(vote.id)
        .bind(vote.room_id)
        .bind(vote.story_id)
        .bind(vote.participant_id)
        .bind(&vote.value)
        .bind(vote.created_at)
        .bind(vote.updated_at)
        .fetch_one(&self.pool)
        .await
        .map_err(persistence)?;
        Ok(row.into())
    }
}

#[async_trait]
impl JiraSettingsRepository for PgStore {
    async fn find_active(
        &self,
        owner_id: Option<&str>,
    ) -> Result<Option<StoredJiraSettings>, DomainError> {
        let row: Option<JiraSettingsRow> = sqlx::query_as(&format!(
            "SELECT {JIRA_COLUMNS} FROM jira_settings \
             WHERE owner_id IS NOT DISTINCT FROM $1 AND is_active \
             ORDER BY created_at DESC LIMIT 1"
        ))
        .bind(owner_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(persistence)?;
        Ok(row.map(StoredJiraSettings::from))
    }

    async fn load_settings(&self, id: Uuid) -> Result<Option<StoredJiraSettings>, DomainError> {
        let row: Option<JiraSettingsRow> = sqlx::query_as(&format!(
            "SELECT {JIRA_COLUMNS} FROM jira_settings WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(persistence)?;
        Ok(row.map(StoredJiraSettings::from))
    }

    async fn insert_active(&self, settings: &StoredJiraSettings) -> Result<(), DomainError> {
        let mut tx = self.pool.begin().await.map_err(persistence)?;

        sqlx::query(
            "UPDATE jira_settings SET is_active = FALSE, updated_at = $2 \
             WHERE owner_id IS NOT DISTINCT FROM $1 AND is_active",
        )
        .bind(&settings.owner_id)
        .bind(settings.created_at)
        .execute(&mut *tx)
        .await
        .map_err(persistence)?;

        sqlx::query(&format!(
            "INSERT INTO jira_settings ({JIRA_COLUMNS}) \
             VALUES ($1, $2, $3, $4, $5, $6, TRUE, $7, $8)"
        ))
        .bind(settings.id)
        .bind(&settings.owner_id)
        .bind(&settings.jira_domain)
        .bind(&settings.jira_email)
        .bind(&settings.jira_api_token)
        .bind(&settings.jira_project_key)
        .bind(settings.created_at)
        .bind(settings.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(persistence)?;

        tx.commit().await.map_err(persistence)
    }

    async fn update_settings(&self, settings: &StoredJiraSettings) -> Result<(), DomainError> {
        let result = sqlx::query(
            "UPDATE jira_settings SET \
                 jira_domain = $2, \
                 jira_email = $3, \
                 jira_api_token = $4, \
                 jira_project_key = $5, \
                 is_active = $6, \
                 updated_at = $7 \
             WHERE id = $1",
        )
        .bind(settings.id)
        .bind(&settings.jira_domain)
        .bind(&settings.jira_email)
        .bind(&settings.jira_api_token)
        .bind(&settings.jira_project_key)
        .bind(settings.is_active)
        .bind(settings.updated_at)
        .execute(&self.pool)
        .await
        .map_err(persistence)?;
        if result.rows_affected() == 0 {
            return Err(DomainError::not_found("jira settings", settings.id));
        }
        Ok(())
    }

    async fn delete_settings(&self, id: Uuid) -> Result<bool, DomainError> {
        let result = sqlx::query("DELETE FROM jira_settings WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(persistence)?;
        Ok(result.rows_affected() > 0)
    }
}
