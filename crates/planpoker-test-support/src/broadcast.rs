//! Test broadcaster — records every published event.

use std::sync::Mutex;

use planpoker_core::broadcast::{BroadcastMessage, Broadcaster};
use planpoker_core::event::DomainEvent;

/// A broadcaster that keeps every published message in memory.
#[derive(Debug, Default)]
pub struct RecordingBroadcaster {
    messages: Mutex<Vec<BroadcastMessage>>,
}

impl RecordingBroadcaster {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a snapshot of all published messages.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn messages(&self) -> Vec<BroadcastMessage> {
        self.messages.lock().unwrap().clone()
    }

    /// Returns the event types of all published messages, in order.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn event_types(&self) -> Vec<String> {
        self.messages
            .lock()
            .unwrap()
            .iter()
            .map(|m| m.metadata.event_type.clone())
            .collect()
    }
}

impl Broadcaster for RecordingBroadcaster {
    fn publish(&self, event: &dyn DomainEvent) {
        self.messages
            .lock()
            .unwrap()
            .push(BroadcastMessage::from_event(event));
    }
}
