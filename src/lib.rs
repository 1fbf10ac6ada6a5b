//! Tasker: group task boards with once-a-day automation.
//!
//! Tasks in a group move between backlog, in progress, completed and
//! overspill. On the first session of each calendar day the engine
//! reclassifies past-due work as overspill, scores its urgency, and fills an
//! empty day with a few backlog candidates.
//!
//! # Architecture
//!
//! Tasker follows hexagonal architecture principles:
//!
//! - **Domain**: Pure business logic with no infrastructure dependencies
//! - **Ports**: Abstract trait interfaces for external interactions
//! - **Adapters**: Concrete implementations of ports (in-memory, `PostgreSQL`)
//!
//! # Modules
//!
//! - [`task`]: Task lifecycle, daily automation and board projection

pub mod task;
