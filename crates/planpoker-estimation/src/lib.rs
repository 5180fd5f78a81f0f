//! Planning poker — Estimation bounded context.
//!
//! Owns the story voting state machine (pending → voting → revealed →
//! completed), vote collection with hidden values until reveal, the
//! aggregation engine that suggests a final estimate, and the room-level
//! rule that at most one story is being voted on at a time.

pub mod application;
pub mod domain;
