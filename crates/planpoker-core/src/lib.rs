//! Planning Poker Core — shared domain abstractions.
//!
//! This crate defines the ports and types that all bounded contexts depend
//! on: time, randomness, commands, errors, broadcast events and persistence
//! records. It contains no infrastructure code.

pub mod broadcast;
pub mod clock;
pub mod command;
pub mod error;
pub mod event;
pub mod repository;
pub mod rng;
