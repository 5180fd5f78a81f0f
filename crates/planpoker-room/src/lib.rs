//! Planning poker — Room & Roster bounded context.
//!
//! Responsible for rooms and their card deck, the participant roster with
//! online presence, and emoji reactions thrown into a room.

pub mod application;
pub mod domain;
