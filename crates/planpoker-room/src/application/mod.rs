//! Application layer for the Room & Roster context.

pub mod command_handlers;
pub mod query_handlers;
