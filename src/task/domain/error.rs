//! Error types for task domain validation and parsing.

use super::{TaskId, TaskStatus};
use thiserror::Error;

/// Errors returned while constructing or mutating domain task values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TaskDomainError {
    /// The task title is empty after trimming.
    #[error("task title must not be empty")]
    EmptyTitle,

    /// A user identifier is empty after trimming.
    #[error("user identifier must not be empty")]
    EmptyUserId,

    /// A group identifier is empty after trimming.
    #[error("group identifier must not be empty")]
    EmptyGroupId,

    /// A comment body is empty after trimming.
    #[error("comment body must not be empty")]
    EmptyComment,

    /// An urgency score lies outside `0..=100`.
    #[error("urgency score {0} is outside 0..=100")]
    UrgencyOutOfRange(u16),

    /// The requested status change is not permitted by the state machine.
    #[error("task {task_id} cannot move from {} to {}", from.as_str(), to.as_str())]
    InvalidStatusTransition {
        /// Task whose transition was rejected.
        task_id: TaskId,
        /// Status the task was in.
        from: TaskStatus,
        /// Status that was requested.
        to: TaskStatus,
    },
}

/// Error returned while parsing task statuses from persistence.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown task status: {0}")]
pub struct ParseTaskStatusError(pub String);

/// Error returned while parsing priorities from persistence or imports.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown task priority: {0}")]
pub struct ParsePriorityError(pub String);

/// Error returned while parsing `YYYY-MM-DD` calendar dates.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("invalid calendar date '{0}', expected YYYY-MM-DD")]
pub struct ParseCalendarDateError(pub String);
