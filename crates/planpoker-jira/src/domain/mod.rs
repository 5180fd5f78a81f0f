//! Domain layer for the Jira settings context.

pub mod aggregates;
pub mod commands;
