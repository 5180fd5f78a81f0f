//! Domain layer for the Room & Roster context.

pub mod aggregates;
pub mod commands;
pub mod deck;
pub mod events;
