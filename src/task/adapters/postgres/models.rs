//! Diesel row models for task and user persistence.

use super::schema::{tasks, users};
use chrono::{DateTime, NaiveDate, Utc};
use diesel::prelude::*;
use serde_json::Value;

/// Query result row for task records.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = tasks)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct TaskRow {
    /// Task identifier.
    pub id: uuid::Uuid,
    /// Owning group identifier.
    pub group_id: String,
    /// Task title.
    pub title: String,
    /// Free-text description.
    pub description: String,
    /// Declared priority.
    pub priority: String,
    /// Workflow status.
    pub status: String,
    /// Planned day.
    pub date_planned: Option<NaiveDate>,
    /// Completion timestamp.
    pub date_completed: Option<DateTime<Utc>>,
    /// Urgency annotation.
    pub urgency_score: Option<i16>,
    /// Category tags JSON payload.
    pub labels: Value,
    /// Assigned member.
    pub assigned_to: Option<String>,
    /// Comment thread JSON payload.
    pub comments: Value,
    /// Creating member.
    pub created_by: Option<String>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// Insert model for task records.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = tasks)]
pub struct NewTaskRow {
    /// Task identifier.
    pub id: uuid::Uuid,
    /// Owning group identifier.
    pub group_id: String,
    /// Task title.
    pub title: String,
    /// Free-text description.
    pub description: String,
    /// Declared priority.
    pub priority: String,
    /// Workflow status.
    pub status: String,
    /// Planned day.
    pub date_planned: Option<NaiveDate>,
    /// Completion timestamp.
    pub date_completed: Option<DateTime<Utc>>,
    /// Urgency annotation.
    pub urgency_score: Option<i16>,
    /// Category tags JSON payload.
    pub labels: Value,
    /// Assigned member.
    pub assigned_to: Option<String>,
    /// Comment thread JSON payload.
    pub comments: Value,
    /// Creating member.
    pub created_by: Option<String>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// Full replacement of a task's mutable columns.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = tasks)]
#[diesel(treat_none_as_null = true)]
pub struct TaskReplacement {
    /// Task title.
    pub title: String,
    /// Free-text description.
    pub description: String,
    /// Declared priority.
    pub priority: String,
    /// Workflow status.
    pub status: String,
    /// Planned day.
    pub date_planned: Option<NaiveDate>,
    /// Completion timestamp.
    pub date_completed: Option<DateTime<Utc>>,
    /// Urgency annotation.
    pub urgency_score: Option<i16>,
    /// Category tags JSON payload.
    pub labels: Value,
    /// Assigned member.
    pub assigned_to: Option<String>,
    /// Comment thread JSON payload.
    pub comments: Value,
}

/// Partial task update; `None` columns are left untouched.
#[derive(Debug, Clone, Copy, AsChangeset)]
#[diesel(table_name = tasks)]
pub struct TaskChangeset {
    /// Workflow status.
    pub status: Option<&'static str>,
    /// Planned day.
    pub date_planned: Option<NaiveDate>,
    /// Urgency annotation.
    pub urgency_score: Option<i16>,
}

/// Query result row for user records.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct UserRow {
    /// User identifier.
    pub uid: String,
    /// Active group identifier.
    pub group_id: Option<String>,
    /// Day automation last ran.
    pub last_automation_date: Option<NaiveDate>,
}

/// Partial user update; `None` columns are left untouched.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = users)]
pub struct UserChangeset {
    /// Active group identifier.
    pub group_id: Option<String>,
    /// Day automation last ran.
    pub last_automation_date: Option<NaiveDate>,
}
