//! PostgreSQL implementation of the planning poker persistence ports.

pub mod pg_store;
mod rows;

pub use pg_store::PgStore;
