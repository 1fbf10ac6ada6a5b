//! `PostgreSQL` adapter for the task store port.

pub(crate) mod models;
pub(crate) mod repository;
mod schema;

pub use repository::{PostgresTaskStore, TaskPgPool};
