//! `PostgreSQL` store implementation for tasks and automation markers.

use super::{
    models::{NewTaskRow, TaskChangeset, TaskReplacement, TaskRow, UserChangeset, UserRow},
    schema::{tasks, users},
};
use crate::task::{
    domain::{
        CalendarDate, Comment, GroupId, PersistedTaskData, Priority, Task, TaskId, TaskPatch,
        TaskStatus, TaskTitle, UrgencyScore, User, UserId, UserPatch, WriteGuard,
    },
    ports::{BatchWrite, DateFilter, TaskQuery, TaskStore, TaskStoreError, TaskStoreResult},
};
use async_trait::async_trait;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use std::collections::BTreeSet;

/// `PostgreSQL` connection pool type used by the task store.
pub type TaskPgPool = Pool<ConnectionManager<PgConnection>>;

/// `PostgreSQL`-backed task store.
///
/// Batches run inside a single database transaction. Guarded user updates
/// lock the user row and compare the stored automation marker before
/// writing, so a concurrent run rolls the whole batch back.
#[derive(Debug, Clone)]
pub struct PostgresTaskStore {
    pool: TaskPgPool,
}

impl PostgresTaskStore {
    /// Creates a new store from a `PostgreSQL` connection pool.
    #[must_use]
    pub const fn new(pool: TaskPgPool) -> Self {
        Self { pool }
    }

    async fn run_blocking<F, T>(&self, f: F) -> TaskStoreResult<T>
    where
        F: FnOnce(&mut PgConnection) -> TaskStoreResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut connection = pool.get().map_err(TaskStoreError::unavailable)?;
            f(&mut connection)
        })
        .await
        .map_err(TaskStoreError::unavailable)?
    }
}

impl From<DieselError> for TaskStoreError {
    fn from(err: DieselError) -> Self {
        Self::unavailable(err)
    }
}

#[async_trait]
impl TaskStore for PostgresTaskStore {
    async fn get_user(&self, uid: &UserId) -> TaskStoreResult<Option<User>> {
        let lookup = uid.clone();
        self.run_blocking(move |connection| {
            let row = users::table
                .filter(users::uid.eq(lookup.as_str()))
                .select(UserRow::as_select())
                .first::<UserRow>(connection)
                .optional()?;
            row.map(row_to_user).transpose()
        })
        .await
    }

    async fn update_user(&self, uid: &UserId, patch: UserPatch) -> TaskStoreResult<()> {
        let target = uid.clone();
        self.run_blocking(move |connection| {
            connection.transaction(|tx| update_user_row(tx, &target, &patch))
        })
        .await
    }

    async fn query_tasks(&self, query: &TaskQuery) -> TaskStoreResult<Vec<Task>> {
        let lookup = query.clone();
        self.run_blocking(move |connection| {
            let mut statement = tasks::table
                .filter(tasks::group_id.eq(lookup.group_id.as_str()))
                .select(TaskRow::as_select())
                .into_boxed();
            if let Some(status) = lookup.status {
                statement = statement.filter(tasks::status.eq(status.as_str()));
            }
            statement = match lookup.date {
                Some(DateFilter::Before(day)) => {
                    statement.filter(tasks::date_planned.lt(day.into_inner()))
                }
                Some(DateFilter::On(day)) => {
                    statement.filter(tasks::date_planned.eq(day.into_inner()))
                }
                None => statement,
            };
            let rows = statement
                .order((tasks::created_at.desc(), tasks::id.asc()))
                .load::<TaskRow>(connection)?;
            rows.into_iter().map(row_to_task).collect()
        })
        .await
    }

    async fn atomic_batch_write(&self, writes: Vec<BatchWrite>) -> TaskStoreResult<()> {
        self.run_blocking(move |connection| {
            connection.transaction(|tx| {
                for write in &writes {
                    match write {
                        BatchWrite::UpdateTask { id, patch } => update_task_row(tx, *id, patch)?,
                        BatchWrite::UpdateUser { id, patch } => update_user_row(tx, id, patch)?,
                    }
                }
                Ok(())
            })
        })
        .await
    }

    async fn insert_tasks(&self, new_tasks: Vec<Task>) -> TaskStoreResult<()> {
        let rows = new_tasks
            .iter()
            .map(to_new_row)
            .collect::<TaskStoreResult<Vec<_>>>()?;
        let ids: Vec<uuid::Uuid> = rows.iter().map(|row| row.id).collect();

        self.run_blocking(move |connection| {
            connection.transaction(|tx| {
                let existing = tasks::table
                    .filter(tasks::id.eq_any(ids.clone()))
                    .select(tasks::id)
                    .first::<uuid::Uuid>(tx)
                    .optional()?;
                if let Some(id) = existing {
                    return Err(TaskStoreError::DuplicateTask(TaskId::from_uuid(id)));
                }

                diesel::insert_into(tasks::table)
                    .values(&rows)
                    .execute(tx)
                    .map_err(|err| {
                        let unique_violation = matches!(
                            err,
                            DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _)
                        );
                        match ids.first() {
                            Some(id) if unique_violation => {
                                TaskStoreError::DuplicateTask(TaskId::from_uuid(*id))
                            }
                            _ => TaskStoreError::unavailable(err),
                        }
                    })?;
                Ok(())
            })
        })
        .await
    }

    async fn find_task(&self, id: TaskId) -> TaskStoreResult<Option<Task>> {
        self.run_blocking(move |connection| {
            let row = tasks::table
                .filter(tasks::id.eq(id.into_inner()))
                .select(TaskRow::as_select())
                .first::<TaskRow>(connection)
                .optional()?;
            row.map(row_to_task).transpose()
        })
        .await
    }

    async fn update_task(&self, task: &Task) -> TaskStoreResult<()> {
        let id = task.id();
        let replacement = to_replacement(task)?;
        self.run_blocking(move |connection| {
            let updated = diesel::update(tasks::table.filter(tasks::id.eq(id.into_inner())))
                .set(&replacement)
                .execute(connection)?;
            if updated == 0 {
                return Err(TaskStoreError::TaskNotFound(id));
            }
            Ok(())
        })
        .await
    }

    async fn delete_task(&self, id: TaskId) -> TaskStoreResult<()> {
        self.run_blocking(move |connection| {
            let deleted = diesel::delete(tasks::table.filter(tasks::id.eq(id.into_inner())))
                .execute(connection)?;
            if deleted == 0 {
                return Err(TaskStoreError::TaskNotFound(id));
            }
            Ok(())
        })
        .await
    }
}

fn update_task_row(
    connection: &mut PgConnection,
    id: TaskId,
    patch: &TaskPatch,
) -> TaskStoreResult<()> {
    let stored_status = tasks::table
        .filter(tasks::id.eq(id.into_inner()))
        .select(tasks::status)
        .for_update()
        .first::<String>(connection)
        .optional()?
        .ok_or(TaskStoreError::TaskNotFound(id))?;
    if let Some(expected) = patch
        .expected_status
        .filter(|expected| stored_status != expected.as_str())
    {
        return Err(TaskStoreError::TaskStatusChanged { id, expected });
    }
    if patch.is_empty() {
        return Ok(());
    }

    diesel::update(tasks::table.filter(tasks::id.eq(id.into_inner())))
        .set(to_task_changeset(patch))
        .execute(connection)?;
    Ok(())
}

fn update_user_row(
    connection: &mut PgConnection,
    uid: &UserId,
    patch: &UserPatch,
) -> TaskStoreResult<()> {
    let stored = users::table
        .filter(users::uid.eq(uid.as_str()))
        .select(UserRow::as_select())
        .for_update()
        .first::<UserRow>(connection)
        .optional()?
        .ok_or_else(|| TaskStoreError::UserNotFound(uid.clone()))?;

    if let WriteGuard::LastAutomationDateIs(expected) = patch.guard {
        if stored.last_automation_date != expected.map(CalendarDate::into_inner) {
            return Err(TaskStoreError::StaleAutomationMarker(uid.clone()));
        }
    }
    if patch.is_empty() {
        return Ok(());
    }

    let changeset = UserChangeset {
        group_id: patch.group_id.as_ref().map(|group| group.as_str().to_owned()),
        last_automation_date: patch.last_automation_date.map(CalendarDate::into_inner),
    };
    diesel::update(users::table.filter(users::uid.eq(uid.as_str())))
        .set(&changeset)
        .execute(connection)?;
    Ok(())
}

fn to_task_changeset(patch: &TaskPatch) -> TaskChangeset {
    TaskChangeset {
        status: patch.status.map(TaskStatus::as_str),
        date_planned: patch.date_planned.map(CalendarDate::into_inner),
        urgency_score: patch.urgency_score.map(|score| i16::from(score.value())),
    }
}

pub(crate) fn to_new_row(task: &Task) -> TaskStoreResult<NewTaskRow> {
    Ok(NewTaskRow {
        id: task.id().into_inner(),
        group_id: task.group_id().as_str().to_owned(),
        title: task.title().as_str().to_owned(),
        description: task.description().to_owned(),
        priority: task.priority().as_str().to_owned(),
        status: task.status().as_str().to_owned(),
        date_planned: task.date_planned().map(CalendarDate::into_inner),
        date_completed: task.date_completed(),
        urgency_score: task.urgency_score().map(|score| i16::from(score.value())),
        labels: serde_json::to_value(task.labels()).map_err(TaskStoreError::unavailable)?,
        assigned_to: task.assigned_to().map(|member| member.as_str().to_owned()),
        comments: serde_json::to_value(task.comments()).map_err(TaskStoreError::unavailable)?,
        created_by: task.created_by().map(|member| member.as_str().to_owned()),
        created_at: task.created_at(),
    })
}

fn to_replacement(task: &Task) -> TaskStoreResult<TaskReplacement> {
    let row = to_new_row(task)?;
    Ok(TaskReplacement {
        title: row.title,
        description: row.description,
        priority: row.priority,
        status: row.status,
        date_planned: row.date_planned,
        date_completed: row.date_completed,
        urgency_score: row.urgency_score,
        labels: row.labels,
        assigned_to: row.assigned_to,
        comments: row.comments,
    })
}

pub(crate) fn row_to_task(row: TaskRow) -> TaskStoreResult<Task> {
    let TaskRow {
        id,
        group_id,
        title,
        description,
        priority,
        status,
        date_planned,
        date_completed,
        urgency_score,
        labels,
        assigned_to,
        comments,
        created_by,
        created_at,
    } = row;

    let urgency_score = urgency_score
        .map(|raw| {
            let value = u16::try_from(raw).map_err(TaskStoreError::unavailable)?;
            UrgencyScore::new(value).map_err(TaskStoreError::unavailable)
        })
        .transpose()?;

    let data = PersistedTaskData {
        id: TaskId::from_uuid(id),
        group_id: GroupId::new(group_id).map_err(TaskStoreError::unavailable)?,
        title: TaskTitle::new(title).map_err(TaskStoreError::unavailable)?,
        description,
        priority: Priority::try_from(priority.as_str()).map_err(TaskStoreError::unavailable)?,
        status: TaskStatus::try_from(status.as_str()).map_err(TaskStoreError::unavailable)?,
        date_planned: date_planned.map(CalendarDate::new),
        date_completed,
        urgency_score,
        labels: serde_json::from_value::<BTreeSet<String>>(labels)
            .map_err(TaskStoreError::unavailable)?,
        assigned_to: assigned_to
            .map(UserId::new)
            .transpose()
            .map_err(TaskStoreError::unavailable)?,
        comments: serde_json::from_value::<Vec<Comment>>(comments)
            .map_err(TaskStoreError::unavailable)?,
        created_by: created_by
            .map(UserId::new)
            .transpose()
            .map_err(TaskStoreError::unavailable)?,
        created_at,
    };
    Ok(Task::from_persisted(data))
}

fn row_to_user(row: UserRow) -> TaskStoreResult<User> {
    let uid = UserId::new(row.uid).map_err(TaskStoreError::unavailable)?;
    let group_id = row
        .group_id
        .map(GroupId::new)
        .transpose()
        .map_err(TaskStoreError::unavailable)?;
    Ok(User::new(uid, group_id)
        .with_last_automation_date(row.last_automation_date.map(CalendarDate::new)))
}
