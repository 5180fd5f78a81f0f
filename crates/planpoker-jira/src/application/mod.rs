//! Application layer for the Jira settings context.

pub mod command_handlers;
pub mod query_handlers;
