//! Application services for task boards and their daily automation.

mod board;
mod config;
mod daily;
mod session;

pub use board::{CreateTaskRequest, TaskBoardError, TaskBoardResult, TaskBoardService};
pub use config::AutomationConfig;
pub use daily::{
    AutomationContext, AutomationOutcome, AutomationReport, DailyAutomationError,
    DailyAutomationResult, DailyAutomationService, SelectionDecision, SkipReason, Transition,
};
pub use session::SessionActivation;
