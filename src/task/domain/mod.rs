//! Domain model for group task boards and their daily automation.
//!
//! Tasks, users, and the pure scoring and selection policies live here with
//! no infrastructure dependencies. Randomness and time are injected.

mod board;
mod calendar;
mod error;
mod ids;
mod patch;
mod selection;
mod task;
mod urgency;
mod user;

pub use board::{DailyBoard, DayProgress};
pub use calendar::CalendarDate;
pub use error::{
    ParseCalendarDateError, ParsePriorityError, ParseTaskStatusError, TaskDomainError,
};
pub use ids::{GroupId, TaskId, UserId};
pub use patch::{TaskPatch, UserPatch, WriteGuard};
pub use selection::{CandidateSelector, PriorityJitterSelector, SelectionConfig};
pub use task::{Comment, PersistedTaskData, Priority, Task, TaskDraft, TaskStatus, TaskTitle};
pub use urgency::{KeywordUrgencyScorer, ScoringConfig, UrgencyScore, UrgencyScorer};
pub use user::User;
