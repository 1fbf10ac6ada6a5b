//! In-memory adapters for tests and single-process hosts.

mod store;

pub use store::{InMemoryTaskStore, StoreSnapshot};
