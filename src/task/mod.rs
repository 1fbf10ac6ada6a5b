//! Task boards and daily automation.
//!
//! Users create tasks in a group backlog, start them, and complete them.
//! Once per user per calendar day, [`services::DailyAutomationService`]
//! moves unfinished work from earlier days into overspill with an urgency
//! score and promotes backlog tasks when the day is still empty. Both
//! transitions commit atomically with the user's automation marker. The
//! module follows hexagonal architecture:
//!
//! - Domain types in [`domain`]
//! - Port contracts in [`ports`]
//! - Adapter implementations in [`adapters`]
//! - Orchestration services in [`services`]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;
