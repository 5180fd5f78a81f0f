//! Planning poker — HTTP API.
//!
//! Exposes the room, estimation and Jira settings contexts as JSON over
//! HTTP and fans committed events out to in-process subscribers.

pub mod broadcast;
pub mod config;
pub mod error;
pub mod routes;
pub mod state;
pub mod telemetry;
