//! Service layer for user-driven task board operations.

use crate::task::{
    domain::{
        CalendarDate, Comment, DailyBoard, GroupId, ParsePriorityError, Priority, Task, TaskDraft,
        TaskDomainError, TaskId, TaskTitle, UserId,
    },
    ports::{TaskQuery, TaskStore, TaskStoreError},
};
use mockable::Clock;
use serde::Deserialize;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

/// Request payload for creating a backlog task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateTaskRequest {
    group_id: String,
    title: String,
    description: String,
    priority: Priority,
    labels: Vec<String>,
    assigned_to: Option<String>,
    created_by: Option<String>,
}

impl CreateTaskRequest {
    /// Creates a medium-priority request with required fields.
    #[must_use]
    pub fn new(group_id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            group_id: group_id.into(),
            title: title.into(),
            description: String::new(),
            priority: Priority::Medium,
            labels: Vec::new(),
            assigned_to: None,
            created_by: None,
        }
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Sets the priority.
    #[must_use]
    pub const fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    /// Sets category tags.
    #[must_use]
    pub fn with_labels(mut self, labels: impl IntoIterator<Item = String>) -> Self {
        self.labels = labels.into_iter().collect();
        self
    }

    /// Sets the assigned member.
    #[must_use]
    pub fn with_assignee(mut self, member: impl Into<String>) -> Self {
        self.assigned_to = Some(member.into());
        self
    }

    /// Sets the creating member.
    #[must_use]
    pub fn with_creator(mut self, member: impl Into<String>) -> Self {
        self.created_by = Some(member.into());
        self
    }

    fn into_draft(self) -> Result<TaskDraft, TaskDomainError> {
        let mut draft = TaskDraft::new(GroupId::new(self.group_id)?, TaskTitle::new(self.title)?);
        draft.description = self.description;
        draft.priority = self.priority;
        draft.labels = self.labels.into_iter().collect();
        draft.assigned_to = self.assigned_to.map(UserId::new).transpose()?;
        draft.created_by = self.created_by.map(UserId::new).transpose()?;
        Ok(draft)
    }
}

/// Priority as written in import files: a code (`0` high) or a name.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ImportedPriority {
    Code(u64),
    Name(String),
}

impl ImportedPriority {
    fn resolve(self) -> Result<Priority, ParsePriorityError> {
        match self {
            Self::Code(code) => Priority::from_code(code),
            Self::Name(name) => match name.trim().parse::<u64>() {
                Ok(code) => Priority::from_code(code),
                Err(_) => Priority::try_from(name.as_str()),
            },
        }
    }
}

/// One entry of a bulk import file.
#[derive(Debug, Deserialize)]
struct ImportedTask {
    title: String,
    #[serde(default)]
    description: String,
    priority: Option<ImportedPriority>,
    #[serde(default)]
    labels: Vec<String>,
    #[serde(default)]
    assigned_to: Option<String>,
}

/// Service-level errors for task board operations.
#[derive(Debug, Error)]
pub enum TaskBoardError {
    /// Domain validation failed.
    #[error(transparent)]
    Domain(#[from] TaskDomainError),
    /// Store operation failed.
    #[error(transparent)]
    Store(#[from] TaskStoreError),
    /// The task does not exist.
    #[error("task not found: {0}")]
    NotFound(TaskId),
    /// The import payload is not a JSON array of tasks.
    #[error("invalid task import: {0}")]
    InvalidImport(#[from] serde_json::Error),
    /// An imported task carried an unknown priority.
    #[error(transparent)]
    InvalidPriority(#[from] ParsePriorityError),
}

/// Result type for task board operations.
pub type TaskBoardResult<T> = Result<T, TaskBoardError>;

/// Task creation and manual status changes for a group's board.
///
/// Manual operations never move a task into overspill; only daily
/// automation does that.
pub struct TaskBoardService<S, C>
where
    S: TaskStore,
    C: Clock + Send + Sync,
{
    store: Arc<S>,
    clock: Arc<C>,
}

impl<S, C> Clone for TaskBoardService<S, C>
where
    S: TaskStore,
    C: Clock + Send + Sync,
{
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            clock: Arc::clone(&self.clock),
        }
    }
}

impl<S, C> TaskBoardService<S, C>
where
    S: TaskStore,
    C: Clock + Send + Sync,
{
    /// Creates a new task board service.
    #[must_use]
    pub const fn new(store: Arc<S>, clock: Arc<C>) -> Self {
        Self { store, clock }
    }

    /// Creates a task in the backlog.
    ///
    /// # Errors
    ///
    /// Returns [`TaskBoardError`] when validation fails or the store rejects
    /// the task.
    pub async fn create_task(&self, request: CreateTaskRequest) -> TaskBoardResult<Task> {
        let task = Task::new(request.into_draft()?, &*self.clock);
        self.store.insert_tasks(vec![task.clone()]).await?;
        Ok(task)
    }

    /// Creates every task in a JSON array, all or nothing.
    ///
    /// Each entry needs a `title`; `description`, `labels`, `assigned_to`,
    /// and `priority` (a code `0`-`2` or a name, defaulting to medium) are
    /// optional. Imported tasks start in the backlog.
    ///
    /// # Errors
    ///
    /// Returns [`TaskBoardError`] when the payload does not parse, an entry
    /// fails validation, or the store rejects the batch. Nothing is stored
    /// in that case.
    pub async fn import_tasks(
        &self,
        group_id: &GroupId,
        created_by: Option<&UserId>,
        payload: &str,
    ) -> TaskBoardResult<Vec<Task>> {
        let entries: Vec<ImportedTask> = serde_json::from_str(payload)?;
        let mut tasks = Vec::with_capacity(entries.len());
        for entry in entries {
            let mut draft = TaskDraft::new(group_id.clone(), TaskTitle::new(entry.title)?);
            draft.description = entry.description;
            draft.priority = entry
                .priority
                .map(ImportedPriority::resolve)
                .transpose()?
                .unwrap_or_default();
            draft.labels = entry.labels.into_iter().collect();
            draft.assigned_to = entry.assigned_to.map(UserId::new).transpose()?;
            draft.created_by = created_by.cloned();
            tasks.push(Task::new(draft, &*self.clock));
        }

        self.store.insert_tasks(tasks.clone()).await?;
        debug!(%group_id, imported = tasks.len(), "imported tasks");
        Ok(tasks)
    }

    /// Starts a backlog task today.
    ///
    /// # Errors
    ///
    /// Returns [`TaskBoardError`] when the task is missing or not in the
    /// backlog.
    pub async fn start_task(&self, id: TaskId) -> TaskBoardResult<Task> {
        let today = CalendarDate::today(&*self.clock);
        self.modify(id, |task, clock| task.start_on(today, clock))
            .await
    }

    /// Toggles a task between in progress and completed.
    ///
    /// # Errors
    ///
    /// Returns [`TaskBoardError`] when the task is missing or in neither
    /// status.
    pub async fn toggle_completion(&self, id: TaskId) -> TaskBoardResult<Task> {
        self.modify(id, |task, clock| task.toggle_completion(clock))
            .await
    }

    /// Moves an overspilled task back into progress on `day`, or today.
    ///
    /// # Errors
    ///
    /// Returns [`TaskBoardError`] when the task is missing or not
    /// overspilled.
    pub async fn reschedule_overspill(
        &self,
        id: TaskId,
        day: Option<CalendarDate>,
    ) -> TaskBoardResult<Task> {
        let target = day.unwrap_or_else(|| CalendarDate::today(&*self.clock));
        self.modify(id, |task, clock| task.reschedule(target, clock))
            .await
    }

    /// Appends a comment to a task.
    ///
    /// # Errors
    ///
    /// Returns [`TaskBoardError`] when the task is missing or the body is
    /// blank.
    pub async fn add_comment(
        &self,
        id: TaskId,
        author: UserId,
        body: impl Into<String>,
    ) -> TaskBoardResult<Task> {
        let comment = Comment::new(author, body, &*self.clock)?;
        self.modify(id, |task, _| {
            task.add_comment(comment);
            Ok(())
        })
        .await
    }

    /// Tags a task. Adding a label twice is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`TaskBoardError`] when the task is missing.
    pub async fn add_label(&self, id: TaskId, label: impl Into<String>) -> TaskBoardResult<Task> {
        let tag = label.into();
        self.modify(id, |task, _| {
            task.add_label(tag);
            Ok(())
        })
        .await
    }

    /// Assigns a task to a member, or clears the assignment with `None`.
    ///
    /// # Errors
    ///
    /// Returns [`TaskBoardError`] when the task is missing.
    pub async fn assign_task(&self, id: TaskId, member: Option<UserId>) -> TaskBoardResult<Task> {
        self.modify(id, |task, _| {
            task.assign_to(member);
            Ok(())
        })
        .await
    }

    /// Removes a task from the board.
    ///
    /// # Errors
    ///
    /// Returns [`TaskBoardError::NotFound`] when the task is missing.
    pub async fn delete_task(&self, id: TaskId) -> TaskBoardResult<()> {
        match self.store.delete_task(id).await {
            Ok(()) => {
                debug!(task_id = %id, "deleted task");
                Ok(())
            }
            Err(TaskStoreError::TaskNotFound(_)) => Err(TaskBoardError::NotFound(id)),
            Err(err) => Err(err.into()),
        }
    }

    /// Builds today's board for a group.
    ///
    /// # Errors
    ///
    /// Returns [`TaskBoardError::Store`] when the query fails.
    pub async fn board(&self, group_id: &GroupId) -> TaskBoardResult<DailyBoard> {
        let tasks = self
            .store
            .query_tasks(&TaskQuery::in_group(group_id.clone()))
            .await?;
        Ok(DailyBoard::project(tasks, CalendarDate::today(&*self.clock)))
    }

    async fn modify<F>(&self, id: TaskId, change: F) -> TaskBoardResult<Task>
    where
        F: FnOnce(&mut Task, &C) -> Result<(), TaskDomainError> + Send,
    {
        let mut task = self
            .store
            .find_task(id)
            .await?
            .ok_or(TaskBoardError::NotFound(id))?;
        change(&mut task, &*self.clock)?;
        self.store.update_task(&task).await?;
        Ok(task)
    }
}
