//! Broadcast port for notifying a room about committed changes.

use serde::{Deserialize, Serialize};

use crate::event::{DomainEvent, EventMetadata};

/// Fan-out of domain events to connected clients.
///
/// Publishing is fire-and-forget: it has no return value and runs after the
/// write has been committed, so a delivery failure never undoes a state
/// transition.
pub trait Broadcaster: Send + Sync {
    /// Publishes an event on its room channel.
    fn publish(&self, event: &dyn DomainEvent);
}

/// Wire form of a published event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BroadcastMessage {
    /// Channel name: `room.{room_id}` or `global`.
    pub channel: String,
    /// Event metadata.
    pub metadata: EventMetadata,
    /// Event-specific payload.
    pub payload: serde_json::Value,
}

impl BroadcastMessage {
    /// Builds the wire form of an event.
    #[must_use]
    pub fn from_event(event: &dyn DomainEvent) -> Self {
        let metadata = event.metadata().clone();
        let channel = match metadata.room_id {
            Some(room_id) => format!("room.{room_id}"),
            None => "global".to_owned(),
        };
        Self {
            channel,
            metadata,
            payload: event.to_payload(),
        }
    }
}

/// A broadcaster that drops every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullBroadcaster;

impl Broadcaster for NullBroadcaster {
    fn publish(&self, _event: &dyn DomainEvent) {}
}
