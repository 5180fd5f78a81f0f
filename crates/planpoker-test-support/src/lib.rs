//! Shared test doubles and utilities for the planning poker backend.

mod broadcast;
mod clock;
mod repository;
mod rng;

pub use broadcast::RecordingBroadcaster;
pub use clock::{FixedClock, fixed_now};
pub use repository::{FailingStore, InMemoryStore};
pub use rng::{MockRng, SequenceRng};
