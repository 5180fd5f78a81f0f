//! Domain layer for the Estimation context.

pub mod aggregates;
pub mod commands;
pub mod coordinator;
pub mod events;
pub mod progress;
pub mod statistics;
pub mod vote;
