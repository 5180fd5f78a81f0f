//! In-process fan-out of committed events.

use planpoker_core::broadcast::{BroadcastMessage, Broadcaster};
use planpoker_core::event::DomainEvent;
use tokio::sync::broadcast;
use tracing::debug;

/// Number of messages a slow subscriber may lag behind before it starts
/// losing the oldest ones.
pub const DEFAULT_CAPACITY: usize = 256;

/// A [`Broadcaster`] backed by a `tokio` broadcast channel. Every
/// subscriber receives every message and filters by `channel` itself.
#[derive(Debug, Clone)]
pub struct ChannelBroadcaster {
    sender: broadcast::Sender<BroadcastMessage>,
}

impl ChannelBroadcaster {
    /// Creates a broadcaster buffering up to `capacity` messages per
    /// subscriber.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Subscribes to all messages published from now on.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<BroadcastMessage> {
        self.sender.subscribe()
    }
}

impl Default for ChannelBroadcaster {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl Broadcaster for ChannelBroadcaster {
    fn publish(&self, event: &dyn DomainEvent) {
        let message = BroadcastMessage::from_event(event);
        let channel = message.channel.clone();
        match self.sender.send(message) {
            Ok(receivers) => debug!(
                channel = %channel,
                event_type = event.event_type(),
                receivers,
                "event broadcast"
            ),
            Err(_) => debug!(
                channel = %channel,
                event_type = event.event_type(),
                "no subscribers, event dropped"
            ),
        }
    }
}
