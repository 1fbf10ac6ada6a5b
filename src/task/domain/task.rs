//! Task aggregate root and its status state machine.

use super::{
    CalendarDate, GroupId, ParsePriorityError, ParseTaskStatusError, TaskDomainError, TaskId,
    TaskPatch, UrgencyScore, UserId,
};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Declared importance of a task.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    /// Must be handled first.
    High,
    /// Default importance.
    #[default]
    Medium,
    /// Can wait.
    Low,
}

impl Priority {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }

    /// Maps the numeric priority codes used by task imports (`0` is high).
    ///
    /// # Errors
    ///
    /// Returns [`ParsePriorityError`] for codes other than `0`, `1`, or `2`.
    pub fn from_code(code: u64) -> Result<Self, ParsePriorityError> {
        match code {
            0 => Ok(Self::High),
            1 => Ok(Self::Medium),
            2 => Ok(Self::Low),
            other => Err(ParsePriorityError(other.to_string())),
        }
    }
}

impl TryFrom<&str> for Priority {
    type Error = ParsePriorityError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "high" => Ok(Self::High),
            "medium" => Ok(Self::Medium),
            "low" => Ok(Self::Low),
            _ => Err(ParsePriorityError(value.to_owned())),
        }
    }
}

/// Task workflow status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Not yet scheduled for active work.
    Backlog,
    /// Scheduled for the day in `date_planned`.
    InProgress,
    /// Finished.
    Completed,
    /// Left unfinished after its planned day passed.
    Overspill,
}

impl TaskStatus {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Backlog => "backlog",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Overspill => "overspill",
        }
    }

    /// Returns whether the state machine allows moving to `target`.
    #[must_use]
    pub const fn can_transition_to(self, target: Self) -> bool {
        matches!(
            (self, target),
            (Self::Backlog | Self::Completed | Self::Overspill, Self::InProgress)
                | (Self::InProgress, Self::Completed | Self::Overspill)
        )
    }
}

impl TryFrom<&str> for TaskStatus {
    type Error = ParseTaskStatusError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_lowercase().replace('-', "_");
        match normalized.as_str() {
            "backlog" => Ok(Self::Backlog),
            "in_progress" => Ok(Self::InProgress),
            "completed" => Ok(Self::Completed),
            "overspill" => Ok(Self::Overspill),
            _ => Err(ParseTaskStatusError(value.to_owned())),
        }
    }
}

/// Non-empty task title.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskTitle(String);

impl TaskTitle {
    /// Creates a validated title.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::EmptyTitle`] if the value is blank.
    pub fn new(value: impl Into<String>) -> Result<Self, TaskDomainError> {
        let raw = value.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(TaskDomainError::EmptyTitle);
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the title as `str`.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for TaskTitle {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

/// A comment appended to a task's discussion thread.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    author: UserId,
    body: String,
    created_at: DateTime<Utc>,
}

impl Comment {
    /// Creates a comment stamped with the current time.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::EmptyComment`] if the body is blank.
    pub fn new(
        author: UserId,
        body: impl Into<String>,
        clock: &impl Clock,
    ) -> Result<Self, TaskDomainError> {
        let raw = body.into();
        if raw.trim().is_empty() {
            return Err(TaskDomainError::EmptyComment);
        }
        Ok(Self {
            author,
            body: raw,
            created_at: clock.utc(),
        })
    }

    /// Returns the comment author.
    #[must_use]
    pub const fn author(&self) -> &UserId {
        &self.author
    }

    /// Returns the comment text.
    #[must_use]
    pub fn body(&self) -> &str {
        &self.body
    }

    /// Returns when the comment was written.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

/// Validated input for creating a task in the backlog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskDraft {
    /// Owning group.
    pub group_id: GroupId,
    /// Task title.
    pub title: TaskTitle,
    /// Free-text description, possibly empty.
    pub description: String,
    /// Declared priority.
    pub priority: Priority,
    /// Category tags.
    pub labels: BTreeSet<String>,
    /// Member responsible for the work.
    pub assigned_to: Option<UserId>,
    /// Member who created the task.
    pub created_by: Option<UserId>,
}

impl TaskDraft {
    /// Creates a medium-priority draft with no description.
    #[must_use]
    pub const fn new(group_id: GroupId, title: TaskTitle) -> Self {
        Self {
            group_id,
            title,
            description: String::new(),
            priority: Priority::Medium,
            labels: BTreeSet::new(),
            assigned_to: None,
            created_by: None,
        }
    }
}

/// Task aggregate root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    id: TaskId,
    group_id: GroupId,
    title: TaskTitle,
    description: String,
    priority: Priority,
    status: TaskStatus,
    date_planned: Option<CalendarDate>,
    date_completed: Option<DateTime<Utc>>,
    urgency_score: Option<UrgencyScore>,
    labels: BTreeSet<String>,
    assigned_to: Option<UserId>,
    comments: Vec<Comment>,
    created_by: Option<UserId>,
    created_at: DateTime<Utc>,
}

/// Parameter object for reconstructing a persisted task aggregate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedTaskData {
    /// Persisted task identifier.
    pub id: TaskId,
    /// Owning group.
    pub group_id: GroupId,
    /// Persisted title.
    pub title: TaskTitle,
    /// Persisted description.
    pub description: String,
    /// Persisted priority.
    pub priority: Priority,
    /// Persisted status.
    pub status: TaskStatus,
    /// Day the task is planned for, if scheduled.
    pub date_planned: Option<CalendarDate>,
    /// Completion timestamp, if completed.
    pub date_completed: Option<DateTime<Utc>>,
    /// Urgency annotation written on overspill.
    pub urgency_score: Option<UrgencyScore>,
    /// Category tags.
    pub labels: BTreeSet<String>,
    /// Assigned member.
    pub assigned_to: Option<UserId>,
    /// Discussion thread.
    pub comments: Vec<Comment>,
    /// Creating member.
    pub created_by: Option<UserId>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl Task {
    /// Creates a new backlog task.
    #[must_use]
    pub fn new(draft: TaskDraft, clock: &impl Clock) -> Self {
        Self {
            id: TaskId::new(),
            group_id: draft.group_id,
            title: draft.title,
            description: draft.description,
            priority: draft.priority,
            status: TaskStatus::Backlog,
            date_planned: None,
            date_completed: None,
            urgency_score: None,
            labels: draft.labels,
            assigned_to: draft.assigned_to,
            comments: Vec::new(),
            created_by: draft.created_by,
            created_at: clock.utc(),
        }
    }

    /// Reconstructs a task from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedTaskData) -> Self {
        Self {
            id: data.id,
            group_id: data.group_id,
            title: data.title,
            description: data.description,
            priority: data.priority,
            status: data.status,
            date_planned: data.date_planned,
            date_completed: data.date_completed,
            urgency_score: data.urgency_score,
            labels: data.labels,
            assigned_to: data.assigned_to,
            comments: data.comments,
            created_by: data.created_by,
            created_at: data.created_at,
        }
    }

    /// Returns the task identifier.
    #[must_use]
    pub const fn id(&self) -> TaskId {
        self.id
    }

    /// Returns the owning group.
    #[must_use]
    pub const fn group_id(&self) -> &GroupId {
        &self.group_id
    }

    /// Returns the title.
    #[must_use]
    pub const fn title(&self) -> &TaskTitle {
        &self.title
    }

    /// Returns the description.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Returns the declared priority.
    #[must_use]
    pub const fn priority(&self) -> Priority {
        self.priority
    }

    /// Returns the workflow status.
    #[must_use]
    pub const fn status(&self) -> TaskStatus {
        self.status
    }

    /// Returns the planned day, if scheduled.
    #[must_use]
    pub const fn date_planned(&self) -> Option<CalendarDate> {
        self.date_planned
    }

    /// Returns the completion timestamp, if completed.
    #[must_use]
    pub const fn date_completed(&self) -> Option<DateTime<Utc>> {
        self.date_completed
    }

    /// Returns the urgency annotation, if the task has overspilled.
    #[must_use]
    pub const fn urgency_score(&self) -> Option<UrgencyScore> {
        self.urgency_score
    }

    /// Returns the category tags.
    #[must_use]
    pub const fn labels(&self) -> &BTreeSet<String> {
        &self.labels
    }

    /// Returns the assigned member, if any.
    #[must_use]
    pub const fn assigned_to(&self) -> Option<&UserId> {
        self.assigned_to.as_ref()
    }

    /// Returns the discussion thread in posting order.
    #[must_use]
    pub fn comments(&self) -> &[Comment] {
        &self.comments
    }

    /// Returns the creating member, if recorded.
    #[must_use]
    pub const fn created_by(&self) -> Option<&UserId> {
        self.created_by.as_ref()
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Moves the task to `target`, maintaining the completion stamp.
    ///
    /// Entering [`TaskStatus::Completed`] records the current time in
    /// `date_completed`; leaving it clears the stamp.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::InvalidStatusTransition`] when the state
    /// machine does not permit the move. The task is left unchanged.
    pub fn transition_to(
        &mut self,
        target: TaskStatus,
        clock: &impl Clock,
    ) -> Result<(), TaskDomainError> {
        self.ensure_transition(target)?;
        self.date_completed = match target {
            TaskStatus::Completed => Some(clock.utc()),
            _ => None,
        };
        self.status = target;
        Ok(())
    }

    /// Starts a backlog task on the given day.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::InvalidStatusTransition`] unless the task is
    /// in the backlog.
    pub fn start_on(&mut self, day: CalendarDate, clock: &impl Clock) -> Result<(), TaskDomainError> {
        self.require_status(TaskStatus::Backlog, TaskStatus::InProgress)?;
        self.transition_to(TaskStatus::InProgress, clock)?;
        self.date_planned = Some(day);
        Ok(())
    }

    /// Re-schedules an overspilled task onto the given day.
    ///
    /// The urgency score is kept as a record of the carry-over.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::InvalidStatusTransition`] unless the task is
    /// overspilled.
    pub fn reschedule(
        &mut self,
        day: CalendarDate,
        clock: &impl Clock,
    ) -> Result<(), TaskDomainError> {
        self.require_status(TaskStatus::Overspill, TaskStatus::InProgress)?;
        self.transition_to(TaskStatus::InProgress, clock)?;
        self.date_planned = Some(day);
        Ok(())
    }

    /// Toggles between completed and in progress.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::InvalidStatusTransition`] when the task is
    /// neither in progress nor completed.
    pub fn toggle_completion(&mut self, clock: &impl Clock) -> Result<(), TaskDomainError> {
        let target = if self.status == TaskStatus::Completed {
            TaskStatus::InProgress
        } else {
            TaskStatus::Completed
        };
        self.transition_to(target, clock)
    }

    /// Appends a comment to the thread.
    pub fn add_comment(&mut self, comment: Comment) {
        self.comments.push(comment);
    }

    /// Adds a category tag. Returns `false` if it was already present.
    pub fn add_label(&mut self, label: impl Into<String>) -> bool {
        self.labels.insert(label.into())
    }

    /// Assigns the task to a member, or clears the assignment.
    pub fn assign_to(&mut self, member: Option<UserId>) {
        self.assigned_to = member;
    }

    /// Applies a partial update as written by the store.
    ///
    /// Fields absent from the patch are left untouched. A status other than
    /// completed clears the completion stamp.
    pub fn apply_patch(&mut self, patch: &TaskPatch) {
        if let Some(status) = patch.status {
            if status != TaskStatus::Completed {
                self.date_completed = None;
            }
            self.status = status;
        }
        if let Some(day) = patch.date_planned {
            self.date_planned = Some(day);
        }
        if let Some(score) = patch.urgency_score {
            self.urgency_score = Some(score);
        }
    }

    fn require_status(&self, expected: TaskStatus, to: TaskStatus) -> Result<(), TaskDomainError> {
        if self.status == expected {
            return Ok(());
        }
        Err(self.invalid_transition(to))
    }

    fn ensure_transition(&self, target: TaskStatus) -> Result<(), TaskDomainError> {
        if self.status.can_transition_to(target) {
            return Ok(());
        }
        Err(self.invalid_transition(target))
    }

    const fn invalid_transition(&self, to: TaskStatus) -> TaskDomainError {
        TaskDomainError::InvalidStatusTransition {
            task_id: self.id,
            from: self.status,
            to,
        }
    }
}
