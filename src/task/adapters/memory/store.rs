//! In-memory task store with optional fault injection.

use async_trait::async_trait;
use std::cmp::Reverse;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::task::{
    domain::{Task, TaskId, User, UserId, UserPatch},
    ports::{BatchWrite, TaskQuery, TaskStore, TaskStoreError, TaskStoreResult},
};

/// Thread-safe in-memory task store.
///
/// Batches are applied to a copy of the records and swapped in only when
/// every write succeeds, so a failed batch leaves no trace. Faults can be
/// injected to exercise error handling in callers.
#[derive(Debug, Clone, Default)]
pub struct InMemoryTaskStore {
    state: Arc<RwLock<InMemoryState>>,
}

#[derive(Debug, Default)]
struct InMemoryState {
    tasks: HashMap<TaskId, Task>,
    users: HashMap<UserId, User>,
    committed_batches: usize,
    faults: FaultPlan,
}

#[derive(Debug, Default)]
struct FaultPlan {
    user_reads: bool,
    batch_writes: bool,
    queries: Vec<TaskQuery>,
}

/// Point-in-time copy of every stored record, ordered for comparison.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreSnapshot {
    /// Stored tasks by identifier.
    pub tasks: BTreeMap<TaskId, Task>,
    /// Stored users by identifier.
    pub users: BTreeMap<UserId, User>,
}

impl InMemoryTaskStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces a user record.
    ///
    /// # Errors
    ///
    /// Returns [`TaskStoreError::Unavailable`] if the lock is poisoned.
    pub fn put_user(&self, user: User) -> TaskStoreResult<()> {
        let mut state = self.write_state()?;
        state.users.insert(user.uid().clone(), user);
        Ok(())
    }

    /// Returns a copy of every stored record.
    ///
    /// # Errors
    ///
    /// Returns [`TaskStoreError::Unavailable`] if the lock is poisoned.
    pub fn snapshot(&self) -> TaskStoreResult<StoreSnapshot> {
        let state = self.read_state()?;
        Ok(StoreSnapshot {
            tasks: state
                .tasks
                .iter()
                .map(|(id, task)| (*id, task.clone()))
                .collect(),
            users: state
                .users
                .iter()
                .map(|(id, user)| (id.clone(), user.clone()))
                .collect(),
        })
    }

    /// Returns how many batches have been committed.
    ///
    /// # Errors
    ///
    /// Returns [`TaskStoreError::Unavailable`] if the lock is poisoned.
    pub fn committed_batches(&self) -> TaskStoreResult<usize> {
        Ok(self.read_state()?.committed_batches)
    }

    /// Makes every subsequent user read fail as unavailable.
    ///
    /// # Errors
    ///
    /// Returns [`TaskStoreError::Unavailable`] if the lock is poisoned.
    pub fn fail_user_reads(&self) -> TaskStoreResult<()> {
        self.write_state()?.faults.user_reads = true;
        Ok(())
    }

    /// Makes every subsequent batch commit fail as unavailable.
    ///
    /// # Errors
    ///
    /// Returns [`TaskStoreError::Unavailable`] if the lock is poisoned.
    pub fn fail_batch_writes(&self) -> TaskStoreResult<()> {
        self.write_state()?.faults.batch_writes = true;
        Ok(())
    }

    /// Makes queries equal to `query` fail as unavailable.
    ///
    /// # Errors
    ///
    /// Returns [`TaskStoreError::Unavailable`] if the lock is poisoned.
    pub fn fail_query(&self, query: TaskQuery) -> TaskStoreResult<()> {
        self.write_state()?.faults.queries.push(query);
        Ok(())
    }

    /// Clears every injected fault.
    ///
    /// # Errors
    ///
    /// Returns [`TaskStoreError::Unavailable`] if the lock is poisoned.
    pub fn heal(&self) -> TaskStoreResult<()> {
        self.write_state()?.faults = FaultPlan::default();
        Ok(())
    }

    fn read_state(&self) -> TaskStoreResult<RwLockReadGuard<'_, InMemoryState>> {
        self.state
            .read()
            .map_err(|err| TaskStoreError::unavailable(std::io::Error::other(err.to_string())))
    }

    fn write_state(&self) -> TaskStoreResult<RwLockWriteGuard<'_, InMemoryState>> {
        self.state
            .write()
            .map_err(|err| TaskStoreError::unavailable(std::io::Error::other(err.to_string())))
    }
}

fn injected(operation: &str) -> TaskStoreError {
    TaskStoreError::unavailable(std::io::Error::other(format!(
        "injected {operation} failure"
    )))
}

fn apply_user_patch(
    users: &mut HashMap<UserId, User>,
    uid: &UserId,
    patch: &UserPatch,
) -> TaskStoreResult<()> {
    let user = users
        .get_mut(uid)
        .ok_or_else(|| TaskStoreError::UserNotFound(uid.clone()))?;
    if !user.satisfies(patch.guard) {
        return Err(TaskStoreError::StaleAutomationMarker(uid.clone()));
    }
    user.apply_patch(patch);
    Ok(())
}

fn apply_write(
    tasks: &mut HashMap<TaskId, Task>,
    users: &mut HashMap<UserId, User>,
    write: &BatchWrite,
) -> TaskStoreResult<()> {
    match write {
        BatchWrite::UpdateTask { id, patch } => {
            let task = tasks.get_mut(id).ok_or(TaskStoreError::TaskNotFound(*id))?;
            let current = task.status();
            if let Some(expected) = patch.expected_status.filter(|_| !patch.permits(current)) {
                return Err(TaskStoreError::TaskStatusChanged { id: *id, expected });
            }
            task.apply_patch(patch);
            Ok(())
        }
        BatchWrite::UpdateUser { id, patch } => apply_user_patch(users, id, patch),
    }
}

#[async_trait]
impl TaskStore for InMemoryTaskStore {
    async fn get_user(&self, uid: &UserId) -> TaskStoreResult<Option<User>> {
        let state = self.read_state()?;
        if state.faults.user_reads {
            return Err(injected("user read"));
        }
        Ok(state.users.get(uid).cloned())
    }

    async fn update_user(&self, uid: &UserId, patch: UserPatch) -> TaskStoreResult<()> {
        let mut state = self.write_state()?;
        apply_user_patch(&mut state.users, uid, &patch)
    }

    async fn query_tasks(&self, query: &TaskQuery) -> TaskStoreResult<Vec<Task>> {
        let state = self.read_state()?;
        if state.faults.queries.contains(query) {
            return Err(injected("query"));
        }
        let mut found: Vec<Task> = state
            .tasks
            .values()
            .filter(|task| query.matches(task))
            .cloned()
            .collect();
        found.sort_by_key(|task| (Reverse(task.created_at()), task.id()));
        Ok(found)
    }

    async fn atomic_batch_write(&self, writes: Vec<BatchWrite>) -> TaskStoreResult<()> {
        let mut state = self.write_state()?;
        if state.faults.batch_writes {
            return Err(injected("batch write"));
        }

        let mut tasks = state.tasks.clone();
        let mut users = state.users.clone();
        for write in &writes {
            apply_write(&mut tasks, &mut users, write)?;
        }

        state.tasks = tasks;
        state.users = users;
        state.committed_batches += 1;
        Ok(())
    }

    async fn insert_tasks(&self, tasks: Vec<Task>) -> TaskStoreResult<()> {
        let mut state = self.write_state()?;
        let mut staged = HashMap::with_capacity(tasks.len());
        for task in tasks {
            if state.tasks.contains_key(&task.id()) || staged.contains_key(&task.id()) {
                return Err(TaskStoreError::DuplicateTask(task.id()));
            }
            staged.insert(task.id(), task);
        }
        state.tasks.extend(staged);
        Ok(())
    }

    async fn find_task(&self, id: TaskId) -> TaskStoreResult<Option<Task>> {
        let state = self.read_state()?;
        Ok(state.tasks.get(&id).cloned())
    }

    async fn update_task(&self, task: &Task) -> TaskStoreResult<()> {
        let mut state = self.write_state()?;
        let stored = state
            .tasks
            .get_mut(&task.id())
            .ok_or(TaskStoreError::TaskNotFound(task.id()))?;
        *stored = task.clone();
        Ok(())
    }

    async fn delete_task(&self, id: TaskId) -> TaskStoreResult<()> {
        let mut state = self.write_state()?;
        if state.tasks.remove(&id).is_none() {
            return Err(TaskStoreError::TaskNotFound(id));
        }
        Ok(())
    }
}
