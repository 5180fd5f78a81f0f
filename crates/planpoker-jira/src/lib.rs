//! Planning poker — Jira settings bounded context.
//!
//! Stores the connection settings used to import issues from Jira. Only
//! one set of settings per owner is active at a time, and the API token
//! is never part of any view.

pub mod application;
pub mod domain;
