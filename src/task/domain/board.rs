//! Projection of a group's tasks into the sections of a day's board.

use super::{CalendarDate, Task, TaskStatus};
use std::cmp::Reverse;

/// Completed versus planned work for one day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayProgress {
    /// Tasks planned for the day that are completed.
    pub completed: usize,
    /// All tasks planned for the day.
    pub total: usize,
}

/// A group's tasks split into today's work, overspill, and backlog.
///
/// Each section lists the newest tasks first. Tasks planned for other days
/// that are neither overspilled nor in the backlog appear in no section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DailyBoard {
    day: CalendarDate,
    today: Vec<Task>,
    overspill: Vec<Task>,
    backlog: Vec<Task>,
}

impl DailyBoard {
    /// Builds the board for `day` from a group's tasks.
    #[must_use]
    pub fn project(tasks: impl IntoIterator<Item = Task>, day: CalendarDate) -> Self {
        let mut board = Self {
            day,
            today: Vec::new(),
            overspill: Vec::new(),
            backlog: Vec::new(),
        };
        for task in tasks {
            match task.status() {
                TaskStatus::InProgress | TaskStatus::Completed
                    if task.date_planned() == Some(day) =>
                {
                    board.today.push(task);
                }
                TaskStatus::Overspill => board.overspill.push(task),
                TaskStatus::Backlog => board.backlog.push(task),
                TaskStatus::InProgress | TaskStatus::Completed => {}
            }
        }
        for section in [&mut board.today, &mut board.overspill, &mut board.backlog] {
            section.sort_by_key(|task| Reverse(task.created_at()));
        }
        board
    }

    /// Returns the day the board was built for.
    #[must_use]
    pub const fn day(&self) -> CalendarDate {
        self.day
    }

    /// Returns tasks planned for the day, in progress or completed.
    #[must_use]
    pub fn today(&self) -> &[Task] {
        &self.today
    }

    /// Returns tasks carried over from earlier days.
    #[must_use]
    pub fn overspill(&self) -> &[Task] {
        &self.overspill
    }

    /// Returns unscheduled tasks.
    #[must_use]
    pub fn backlog(&self) -> &[Task] {
        &self.backlog
    }

    /// Returns how much of the day's plan is done.
    #[must_use]
    pub fn progress(&self) -> DayProgress {
        let completed = self
            .today
            .iter()
            .filter(|task| task.status() == TaskStatus::Completed)
            .count();
        DayProgress {
            completed,
            total: self.today.len(),
        }
    }
}
