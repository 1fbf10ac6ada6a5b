//! Partial updates staged by services and applied atomically by stores.

use super::{CalendarDate, GroupId, TaskStatus, UrgencyScore};

/// Field changes for a task record. `None` leaves a field untouched.
///
/// When `expected_status` is set, stores apply the patch only while the
/// stored task still has that status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TaskPatch {
    /// Status the stored task must still have.
    pub expected_status: Option<TaskStatus>,
    /// New workflow status.
    pub status: Option<TaskStatus>,
    /// New planned day.
    pub date_planned: Option<CalendarDate>,
    /// New urgency annotation.
    pub urgency_score: Option<UrgencyScore>,
}

impl TaskPatch {
    /// Reclassifies an unfinished task as overspill with its urgency.
    ///
    /// The planned day is kept as the record of when it was due.
    #[must_use]
    pub const fn overspill(score: UrgencyScore) -> Self {
        Self {
            expected_status: Some(TaskStatus::InProgress),
            status: Some(TaskStatus::Overspill),
            date_planned: None,
            urgency_score: Some(score),
        }
    }

    /// Promotes a backlog task into the given day.
    #[must_use]
    pub const fn promote(day: CalendarDate) -> Self {
        Self {
            expected_status: Some(TaskStatus::Backlog),
            status: Some(TaskStatus::InProgress),
            date_planned: Some(day),
            urgency_score: None,
        }
    }

    /// Returns whether the patch changes nothing.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.status.is_none() && self.date_planned.is_none() && self.urgency_score.is_none()
    }

    /// Returns whether a task in `current` status may receive the patch.
    #[must_use]
    pub fn permits(&self, current: TaskStatus) -> bool {
        self.expected_status.is_none_or(|expected| expected == current)
    }
}

/// Precondition a store checks before applying a [`UserPatch`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum WriteGuard {
    /// Apply regardless of the stored record.
    #[default]
    Unconditional,
    /// Apply only while the stored automation marker still equals the value.
    LastAutomationDateIs(Option<CalendarDate>),
}

/// Field changes for a user record. `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserPatch {
    /// New active group.
    pub group_id: Option<GroupId>,
    /// New automation marker.
    pub last_automation_date: Option<CalendarDate>,
    /// Precondition on the stored record.
    pub guard: WriteGuard,
}

impl UserPatch {
    /// Records a completed automation run, guarded against a concurrent run
    /// that already moved the marker away from `previous`.
    #[must_use]
    pub const fn automation_ran(today: CalendarDate, previous: Option<CalendarDate>) -> Self {
        Self {
            group_id: None,
            last_automation_date: Some(today),
            guard: WriteGuard::LastAutomationDateIs(previous),
        }
    }

    /// Switches the user's active group.
    #[must_use]
    pub const fn activate_group(group_id: GroupId) -> Self {
        Self {
            group_id: Some(group_id),
            last_automation_date: None,
            guard: WriteGuard::Unconditional,
        }
    }

    /// Returns whether the patch changes nothing.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.group_id.is_none() && self.last_automation_date.is_none()
    }
}
