//! Shared application state.

use std::sync::{Arc, Mutex};

use planpoker_core::broadcast::Broadcaster;
use planpoker_core::clock::Clock;
use planpoker_core::repository::{
    JiraSettingsRepository, ParticipantRepository, RoomRepository, StoryRepository,
    VoteRepository,
};
use planpoker_core::rng::DeterministicRng;

/// Application state shared across all request handlers.
#[derive(Clone)]
pub struct AppState {
    /// Clock for timestamps.
    pub clock: Arc<dyn Clock + Send + Sync>,
    /// RNG for room slug suffixes.
    pub rng: Arc<Mutex<dyn DeterministicRng + Send>>,
    /// Room storage.
    pub rooms: Arc<dyn RoomRepository>,
    /// Participant storage.
    pub participants: Arc<dyn ParticipantRepository>,
    /// Story storage.
    pub stories: Arc<dyn StoryRepository>,
    /// Vote storage.
    pub votes: Arc<dyn VoteRepository>,
    /// Jira settings storage.
    pub jira_settings: Arc<dyn JiraSettingsRepository>,
    /// Fan-out for committed events.
    pub broadcaster: Arc<dyn Broadcaster>,
}

impl AppState {
    /// Create application state backed by a single store implementing every
    /// repository port.
    #[must_use]
    pub fn new<S>(
        store: Arc<S>,
        clock: Arc<dyn Clock + Send + Sync>,
        rng: Arc<Mutex<dyn DeterministicRng + Send>>,
        broadcaster: Arc<dyn Broadcaster>,
    ) -> Self
    where
        S: RoomRepository
            + ParticipantRepository
            + StoryRepository
            + VoteRepository
            + JiraSettingsRepository
            + 'static,
    {
        Self {
            clock,
            rng,
            rooms: store.clone(),
            participants: store.clone(),
            stories: store.clone(),
            votes: store.clone(),
            jira_settings: store,
            broadcaster,
        }
    }
}
