//! Port contracts for task and user persistence.
//!
//! Ports define infrastructure-agnostic interfaces used by task services.

pub mod store;

pub use store::{BatchWrite, DateFilter, TaskQuery, TaskStore, TaskStoreError, TaskStoreResult};
