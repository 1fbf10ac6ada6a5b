//! User record as seen by the automation engine.

use super::{CalendarDate, GroupId, UserId, UserPatch, WriteGuard};
use serde::{Deserialize, Serialize};

/// A member whose task board is automated once per day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    uid: UserId,
    group_id: Option<GroupId>,
    last_automation_date: Option<CalendarDate>,
}

impl User {
    /// Creates a user that has never been automated.
    #[must_use]
    pub const fn new(uid: UserId, group_id: Option<GroupId>) -> Self {
        Self {
            uid,
            group_id,
            last_automation_date: None,
        }
    }

    /// Sets the automation marker, as when loading from storage.
    #[must_use]
    pub const fn with_last_automation_date(mut self, date: Option<CalendarDate>) -> Self {
        self.last_automation_date = date;
        self
    }

    /// Returns the user identifier.
    #[must_use]
    pub const fn uid(&self) -> &UserId {
        &self.uid
    }

    /// Returns the active group, if the user has joined one.
    #[must_use]
    pub const fn group_id(&self) -> Option<&GroupId> {
        self.group_id.as_ref()
    }

    /// Returns the day automation last ran for this user.
    #[must_use]
    pub const fn last_automation_date(&self) -> Option<CalendarDate> {
        self.last_automation_date
    }

    /// Returns whether automation already ran on `today`.
    #[must_use]
    pub fn automated_on(&self, today: CalendarDate) -> bool {
        self.last_automation_date == Some(today)
    }

    /// Returns whether the stored record satisfies `guard`.
    #[must_use]
    pub fn satisfies(&self, guard: WriteGuard) -> bool {
        match guard {
            WriteGuard::Unconditional => true,
            WriteGuard::LastAutomationDateIs(expected) => self.last_automation_date == expected,
        }
    }

    /// Applies a partial update. The guard is the caller's responsibility.
    pub fn apply_patch(&mut self, patch: &UserPatch) {
        if let Some(group_id) = &patch.group_id {
            self.group_id = Some(group_id.clone());
        }
        if let Some(date) = patch.last_automation_date {
            self.last_automation_date = Some(date);
        }
    }
}
