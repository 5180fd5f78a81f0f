//! Test repositories — in-memory and failing implementations of every
//! persistence port.

use std::sync::Mutex;

use async_trait::async_trait;
use planpoker_core::error::DomainError;
use planpoker_core::repository::{
    JiraSettingsRepository, ParticipantRepository, RoomRepository, StoredJiraSettings,
    StoredParticipant, StoredRoom, StoredStory, StoredVote, StoryRepository, StoryWriteBatch,
    VoteRepository,
};
use uuid::Uuid;

#[derive(Debug, Default)]
struct Tables {
    rooms: Vec<StoredRoom>,
    participants: Vec<StoredParticipant>,
    stories: Vec<StoredStory>,
    votes: Vec<StoredVote>,
    jira_settings: Vec<StoredJiraSettings>,
}

/// A store that keeps all records in memory and honours the same contracts
/// as the PostgreSQL store: ordered story listing, optimistic versions on
/// `commit_stories` and upsert semantics for votes.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    tables: Mutex<Tables>,
}

impl InMemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored votes across all stories.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn vote_count(&self) -> usize {
        self.tables.lock().unwrap().votes.len()
    }
}

#[async_trait]
impl RoomRepository for InMemoryStore {
    async fn load_room(&self, room_id: Uuid) -> Result<Option<StoredRoom>, DomainError> {
        let tables = self.tables.lock().unwrap();
        Ok(tables.rooms.iter().find(|r| r.id == room_id).cloned())
    }

    async fn find_room_by_slug(&self, slug: &str) -> Result<Option<StoredRoom>, DomainError> {
        let tables = self.tables.lock().unwrap();
        Ok(tables.rooms.iter().find(|r| r.slug == slug).cloned())
    }

    async fn insert_room(&self, room: &StoredRoom) -> Result<(), DomainError> {
        let mut tables = self.tables.lock().unwrap();
        if tables.rooms.iter().any(|r| r.slug == room.slug) {
            return Err(DomainError::Persistence(format!(
                "duplicate room slug {}",
                room.slug
            )));
        }
        tables.rooms.push(room.clone());
        Ok(())
    }
}

#[async_trait]
impl ParticipantRepository for InMemoryStore {
    async fn load_participant(
        &self,
        participant_id: Uuid,
    ) -> Result<Option<StoredParticipant>, DomainError> {
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .participants
            .iter()
            .find(|p| p.id == participant_id)
            .cloned())
    }

    async fn list_participants(
        &self,
        room_id: Uuid,
    ) -> Result<Vec<StoredParticipant>, DomainError> {
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .participants
            .iter()
            .filter(|p| p.room_id == room_id)
            .cloned()
            .collect())
    }

    async fn save_participant(&self, participant: &StoredParticipant) -> Result<(), DomainError> {
        let mut tables = self.tables.lock().unwrap();
        match tables
            .participants
            .iter_mut()
            .find(|p| p.id == participant.id)
        {
            Some(existing) => existing.clone_from(participant),
            None => tables.participants.push(participant.clone()),
        }
        Ok(())
    }
}

#[async_trait]
impl StoryRepository for InMemoryStore {
    async fn load_story(&self, story_id: Uuid) -> Result<Option<StoredStory>, DomainError> {
        let tables = self.tables.lock().unwrap();
        Ok(tables.stories.iter().find(|s| s.id == story_id).cloned())
    }

    async fn list_stories(&self, room_id: Uuid) -> Result<Vec<StoredStory>, DomainError> {
        let tables = self.tables.lock().unwrap();
        let mut stories: Vec<StoredStory> = tables
            .stories
            .iter()
            .filter(|s| s.room_id == room_id)
            .cloned()
            .collect();
        stories.sort_by_key(|s| (s.sort_order, s.created_at));
        Ok(stories)
    }

    async fn insert_story(&self, story: &StoredStory) -> Result<(), DomainError> {
        self.tables.lock().unwrap().stories.push(story.clone());
        Ok(())
    }

    async fn commit_stories(&self, batch: StoryWriteBatch) -> Result<(), DomainError> {
        let mut tables = self.tables.lock().unwrap();

        for story in &batch.stories {
            let stored = tables
                .stories
                .iter()
                .find(|s| s.id == story.id)
                .ok_or_else(|| DomainError::not_found("story", story.id))?;
            if stored.version != story.version {
                return Err(DomainError::ConcurrencyConflict {
                    entity_id: story.id,
                    expected: story.version,
                    actual: stored.version,
                });
            }
        }

        for story in batch.stories {
            if let Some(stored) = tables.stories.iter_mut().find(|s| s.id == story.id) {
                *stored = StoredStory {
                    version: story.version + 1,
                    ..story
                };
            }
        }
        tables
            .votes
            .retain(|v| !batch.clear_votes_for.contains(&v.story_id));
        Ok(())
    }
}

#[async_trait]
impl VoteRepository for InMemoryStore {
    async fn list_votes(&self, story_id: Uuid) -> Result<Vec<StoredVote>, DomainError> {
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .votes
            .iter()
            .filter(|v| v.story_id == story_id)
            .cloned()
            .collect())
    }

    async fn upsert_vote(&self, vote: &StoredVote) -> Result<StoredVote, DomainError> {
        let mut tables = self.tables.lock().unwrap();
        if let Some(existing) = tables
            .votes
            .iter_mut()
            .find(|v| v.story_id == vote.story_id && v.participant_id == vote.participant_id)
        {
            existing.value.clone_from(&vote.value);
            existing.updated_at = vote.updated_at;
            return Ok(existing.clone());
        }
        tables.votes.push(vote.clone());
        Ok(vote.clone())
    }
}

#[async_trait]
impl JiraSettingsRepository for InMemoryStore {
    async fn find_active(
        &self,
        owner_id: Option<&str>,
    ) -> Result<Option<StoredJiraSettings>, DomainError> {
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .jira_settings
            .iter()
            .find(|s| s.is_active && s.owner_id.as_deref() == owner_id)
            .cloned())
    }

    async fn load_settings(&self, id: Uuid) -> Result<Option<StoredJiraSettings>, DomainError> {
        let tables = self.tables.lock().unwrap();
        Ok(tables.jira_settings.iter().find(|s| s.id == id).cloned())
    }

    async fn insert_active(&self, settings: &StoredJiraSettings) -> Result<(), DomainError> {
        let mut tables = self.tables.lock().unwrap();
        for existing in tables
            .jira_settings
            .iter_mut()
            .filter(|s| s.owner_id == settings.owner_id)
        {
            existing.is_active = false;
        }
        tables.jira_settings.push(StoredJiraSettings {
            is_active: true,
            ..settings.clone()
        });
        Ok(())
    }

    async fn update_settings(&self, settings: &StoredJiraSettings) -> Result<(), DomainError> {
        let mut tables = self.tables.lock().unwrap();
        let existing = tables
            .jira_settings
            .iter_mut()
            .find(|s| s.id == settings.id)
            .ok_or_else(|| DomainError::not_found("jira settings", settings.id))?;
        existing.clone_from(settings);
        Ok(())
    }

    async fn delete_settings(&self, id: Uuid) -> Result<bool, DomainError> {
        let mut tables = self.tables.lock().unwrap();
        let before = tables.jira_settings.len();
        tables.jira_settings.retain(|s| s.id != id);
        Ok(tables.jira_settings.len() != before)
    }
}

/// A store that fails every call with a persistence error. Useful for
/// testing error-handling paths.
#[derive(Debug)]
pub struct FailingStore;

fn connection_refused() -> DomainError {
    DomainError::Persistence("connection refused".into())
}

#[async_trait]
impl RoomRepository for FailingStore {
    async fn load_room(&self, _room_id: Uuid) -> Result<Option<StoredRoom>, DomainError> {
        Err(connection_refused())
    }

    async fn find_room_by_slug(&self, _slug: &str) -> Result<Option<StoredRoom>, DomainError> {
        Err(connection_refused())
    }

    async fn insert_room(&self, _room: &StoredRoom) -> Result<(), DomainError> {
        Err(connection_refused())
    }
}

#[async_trait]
impl ParticipantRepository for FailingStore {
    async fn load_participant(
        &self,
        _participant_id: Uuid,
    ) -> Result<Option<StoredParticipant>, DomainError> {
        Err(connection_refused())
    }

    async fn list_participants(
        &self,
        _room_id: Uuid,
    ) -> Result<Vec<StoredParticipant>, DomainError> {
        Err(connection_refused())
    }

    async fn save_participant(&self, _participant: &StoredParticipant) -> Result<(), DomainError> {
        Err(connection_refused())
    }
}

#[async_trait]
impl StoryRepository for FailingStore {
    async fn load_story(&self, _story_id: Uuid) -> Result<Option<StoredStory>, DomainError> {
        Err(connection_refused())
    }

    async fn list_stories(&self, _room_id: Uuid) -> Result<Vec<StoredStory>, DomainError> {
        Err(connection_refused())
    }

    async fn insert_story(&self, _story: &StoredStory) -> Result<(), DomainError> {
        Err(connection_refused())
    }

    async fn commit_stories(&self, _batch: StoryWriteBatch) -> Result<(), DomainError> {
        Err(connection_refused())
    }
}

#[async_trait]
impl VoteRepository for FailingStore {
    async fn list_votes(&self, _story_id: Uuid) -> Result<Vec<StoredVote>, DomainError> {
        Err(connection_refused())
    }

    async fn upsert_vote(&self, _vote: &StoredVote) -> Result<StoredVote, DomainError> {
        Err(connection_refused())
    }
}

#[async_trait]
impl JiraSettingsRepository for FailingStore {
    async fn find_active(
        &self,
        _owner_id: Option<&str>,
    ) -> Result<Option<StoredJiraSettings>, DomainError> {
        Err(connection_refused())
    }

    async fn load_settings(&self, _id: Uuid) -> Result<Option<StoredJiraSettings>, DomainError> {
        Err(connection_refused())
    }

    async fn insert_active(&self, _settings: &StoredJiraSettings) -> Result<(), DomainError> {
        Err(connection_refused())
    }

    async fn update_settings(&self, _settings: &StoredJiraSettings) -> Result<(), DomainError> {
        Err(connection_refused())
    }

    async fn delete_settings(&self, _id: Uuid) -> Result<bool, DomainError> {
        Err(connection_refused())
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;
    use crate::fixed_now;

    fn story(room_id: Uuid, sort_order: i32, minutes: i64) -> StoredStory {
        StoredStory {
            id: Uuid::new_v4(),
            room_id,
            title: format!("story {sort_order}"),
            description: None,
            external_ref: None,
            external_url: None,
            final_estimate: None,
            sort_order,
            voting_started_at: None,
            revealed_at: None,
            version: 0,
            created_at: fixed_now() + Duration::minutes(minutes),
        }
    }

    #[tokio::test]
    async fn test_list_stories_orders_by_sort_order_then_creation() {
        let store = InMemoryStore::new();
        let room_id = Uuid::new_v4();
        let late = story(room_id, 1, 5);
        let early = story(room_id, 1, 0);
        let first = story(room_id, 0, 10);
        for s in [&late, &early, &first] {
            store.insert_story(s).await.unwrap();
        }

        let ids: Vec<Uuid> = store
            .list_stories(room_id)
            .await
            .unwrap()
            .iter()
            .map(|s| s.id)
            .collect();

        assert_eq!(ids, vec![first.id, early.id, late.id]);
    }

    #[tokio::test]
    async fn test_commit_stories_rejects_stale_version_without_writing() {
        let store = InMemoryStore::new();
        let room_id = Uuid::new_v4();
        let a = story(room_id, 0, 0);
        let b = story(room_id, 1, 0);
        store.insert_story(&a).await.unwrap();
        store.insert_story(&b).await.unwrap();

        let stale_b = StoredStory {
            version: 7,
            ..b.clone()
        };
        let result = store
            .commit_stories(StoryWriteBatch {
                stories: vec![
                    StoredStory {
                        title: "changed".to_owned(),
                        ..a.clone()
                    },
                    stale_b,
                ],
                clear_votes_for: vec![],
            })
            .await;

        match result.unwrap_err() {
            DomainError::ConcurrencyConflict {
                entity_id,
                expected,
                actual,
            } => {
                assert_eq!(entity_id, b.id);
                assert_eq!(expected, 7);
                assert_eq!(actual, 0);
            }
            other => panic!("expected ConcurrencyConflict, got {other:?}"),
        }
        let reloaded = store.load_story(a.id).await.unwrap().unwrap();
        assert_eq!(reloaded.title, a.title);
        assert_eq!(reloaded.version, 0);
    }

    #[tokio::test]
    async fn test_upsert_vote_overwrites_existing_pair() {
        let store = InMemoryStore::new();
        let story_id = Uuid::new_v4();
        let participant_id = Uuid::new_v4();
        let first = StoredVote {
            id: Uuid::new_v4(),
            room_id: Uuid::new_v4(),
            story_id,
            participant_id,
            value: "5".to_owned(),
            created_at: fixed_now(),
            updated_at: fixed_now(),
        };
        store.upsert_vote(&first).await.unwrap();

        let second = StoredVote {
            id: Uuid::new_v4(),
            value: "8".to_owned(),
            updated_at: fixed_now() + Duration::seconds(3),
            ..first.clone()
        };
        let stored = store.upsert_vote(&second).await.unwrap();

        assert_eq!(stored.id, first.id);
        assert_eq!(stored.value, "8");
        assert_eq!(store.list_votes(story_id).await.unwrap().len(), 1);
    }
}
