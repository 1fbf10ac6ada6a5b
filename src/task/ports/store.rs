//! Store port for task queries, user markers, and atomic batch commits.

use crate::task::domain::{
    CalendarDate, GroupId, Task, TaskId, TaskPatch, TaskStatus, User, UserId, UserPatch,
};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for store operations.
pub type TaskStoreResult<T> = Result<T, TaskStoreError>;

/// Comparison applied to a task's planned day.
///
/// Tasks without a planned day never match a date filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateFilter {
    /// Planned strictly before the given day.
    Before(CalendarDate),
    /// Planned on the given day.
    On(CalendarDate),
}

impl DateFilter {
    /// Returns whether a planned day satisfies the filter.
    #[must_use]
    pub fn matches(self, planned: Option<CalendarDate>) -> bool {
        match (self, planned) {
            (Self::Before(day), Some(planned_day)) => planned_day < day,
            (Self::On(day), Some(planned_day)) => planned_day == day,
            (_, None) => false,
        }
    }
}

/// Task lookup scoped to one group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskQuery {
    /// Group whose tasks are searched.
    pub group_id: GroupId,
    /// Required status, if any.
    pub status: Option<TaskStatus>,
    /// Planned-day comparison, if any.
    pub date: Option<DateFilter>,
}

impl TaskQuery {
    /// Matches every task in the group.
    #[must_use]
    pub const fn in_group(group_id: GroupId) -> Self {
        Self {
            group_id,
            status: None,
            date: None,
        }
    }

    /// Restricts the query to one status.
    #[must_use]
    pub const fn with_status(mut self, status: TaskStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Restricts the query by planned day.
    #[must_use]
    pub const fn with_date(mut self, filter: DateFilter) -> Self {
        self.date = Some(filter);
        self
    }

    /// Returns whether `task` satisfies every condition.
    #[must_use]
    pub fn matches(&self, task: &Task) -> bool {
        task.group_id() == &self.group_id
            && self.status.is_none_or(|status| task.status() == status)
            && self.date.is_none_or(|filter| filter.matches(task.date_planned()))
    }
}

/// One record update inside an atomic batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchWrite {
    /// Partial update of a task.
    UpdateTask {
        /// Task to update.
        id: TaskId,
        /// Fields to change.
        patch: TaskPatch,
    },
    /// Partial update of a user.
    UpdateUser {
        /// User to update.
        id: UserId,
        /// Fields to change and the precondition to check.
        patch: UserPatch,
    },
}

/// Persistence contract consumed by task services.
#[async_trait]
pub trait TaskStore: Send + Sync {
    /// Loads a user record.
    ///
    /// Returns `None` when the user does not exist.
    async fn get_user(&self, uid: &UserId) -> TaskStoreResult<Option<User>>;

    /// Applies a partial update to a user record.
    ///
    /// # Errors
    ///
    /// Returns [`TaskStoreError::UserNotFound`] when the user does not exist
    /// or [`TaskStoreError::StaleAutomationMarker`] when the patch guard
    /// does not hold.
    async fn update_user(&self, uid: &UserId, patch: UserPatch) -> TaskStoreResult<()>;

    /// Returns the tasks matching `query`.
    async fn query_tasks(&self, query: &TaskQuery) -> TaskStoreResult<Vec<Task>>;

    /// Applies every write or none of them.
    ///
    /// # Errors
    ///
    /// Returns [`TaskStoreError::TaskNotFound`] or
    /// [`TaskStoreError::UserNotFound`] for missing records,
    /// [`TaskStoreError::TaskStatusChanged`] when a task no longer has a
    /// patch's expected status, and
    /// [`TaskStoreError::StaleAutomationMarker`] when a user guard fails. No
    /// write is applied when any error is returned.
    async fn atomic_batch_write(&self, writes: Vec<BatchWrite>) -> TaskStoreResult<()>;

    /// Stores new tasks, all or nothing.
    ///
    /// # Errors
    ///
    /// Returns [`TaskStoreError::DuplicateTask`] when an identifier already
    /// exists.
    async fn insert_tasks(&self, tasks: Vec<Task>) -> TaskStoreResult<()>;

    /// Finds a task by identifier.
    ///
    /// Returns `None` when the task does not exist.
    async fn find_task(&self, id: TaskId) -> TaskStoreResult<Option<Task>>;

    /// Replaces a stored task with `task`.
    ///
    /// # Errors
    ///
    /// Returns [`TaskStoreError::TaskNotFound`] when the task does not exist.
    async fn update_task(&self, task: &Task) -> TaskStoreResult<()>;

    /// Removes a task.
    ///
    /// # Errors
    ///
    /// Returns [`TaskStoreError::TaskNotFound`] when the task does not exist.
    async fn delete_task(&self, id: TaskId) -> TaskStoreResult<()>;
}

/// Errors returned by store implementations.
#[derive(Debug, Clone, Error)]
pub enum TaskStoreError {
    /// A task with the same identifier already exists.
    #[error("duplicate task identifier: {0}")]
    DuplicateTask(TaskId),

    /// The task was not found.
    #[error("task not found: {0}")]
    TaskNotFound(TaskId),

    /// The user was not found.
    #[error("user not found: {0}")]
    UserNotFound(UserId),

    /// The task left the status a patch expected since it was read.
    #[error("task {id} is no longer {}", .expected.as_str())]
    TaskStatusChanged {
        /// Task whose status changed.
        id: TaskId,
        /// Status the patch required.
        expected: TaskStatus,
    },

    /// The user's automation marker changed since it was read.
    #[error("automation marker for user {0} changed concurrently")]
    StaleAutomationMarker(UserId),

    /// The backing store could not be reached or failed mid-operation.
    #[error("store unavailable: {0}")]
    Unavailable(Arc<dyn std::error::Error + Send + Sync>),
}

impl TaskStoreError {
    /// Wraps an infrastructure error.
    pub fn unavailable(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Unavailable(Arc::new(err))
    }
}
