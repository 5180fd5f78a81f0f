//! Application layer for the Estimation context.

pub mod command_handlers;
pub mod query_handlers;
