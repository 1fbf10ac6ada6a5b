//! Daily automation: overspill reclassification and backlog promotion.
//!
//! [`DailyAutomationService`] runs at most once per user per calendar day.
//! Both transitions are staged in memory and committed together with the
//! user's automation marker in a single atomic batch, so a failure at any
//! point leaves the store as it was and the next session retries.

use super::AutomationConfig;
use crate::task::{
    domain::{
        CalendarDate, CandidateSelector, GroupId, KeywordUrgencyScorer, PriorityJitterSelector,
        TaskId, TaskPatch, TaskStatus, UrgencyScore, UrgencyScorer, UserId, UserPatch,
    },
    ports::{BatchWrite, DateFilter, TaskQuery, TaskStore, TaskStoreError},
};
use mockable::Clock;
use std::collections::HashSet;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};
use thiserror::Error;
use tracing::{debug, info};

/// Who automation runs for and in which group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AutomationContext {
    user_id: UserId,
    group_id: Option<GroupId>,
}

impl AutomationContext {
    /// Creates a context for `user_id` acting in `group_id`.
    #[must_use]
    pub const fn new(user_id: UserId, group_id: Option<GroupId>) -> Self {
        Self { user_id, group_id }
    }

    /// Returns the user being automated.
    #[must_use]
    pub const fn user_id(&self) -> &UserId {
        &self.user_id
    }

    /// Returns the active group, if any.
    #[must_use]
    pub const fn group_id(&self) -> Option<&GroupId> {
        self.group_id.as_ref()
    }
}

/// Why a run made no changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The context carried no group.
    NoActiveGroup,
    /// The user's marker already equals today.
    AlreadyRanToday,
    /// Another run for the same user is in progress in this process.
    RunInFlight,
    /// Another session committed today's run between our read and commit.
    ConcurrentRun,
}

/// What the selection transition decided.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionDecision {
    /// Backlog tasks were promoted into today.
    Promoted,
    /// Today already had in-progress work, so the backlog was left alone.
    DayAlreadyPlanned,
    /// There was nothing in the backlog to promote.
    BacklogEmpty,
    /// The backlog had tasks but the selector picked none.
    NothingSelected,
}

/// Mutations committed by a completed run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AutomationReport {
    /// Day the run was for.
    pub day: CalendarDate,
    /// Tasks reclassified as overspill with their urgency.
    pub overspilled: Vec<(TaskId, UrgencyScore)>,
    /// Backlog tasks promoted into the day, in selection order.
    pub promoted: Vec<TaskId>,
    /// Outcome of the selection transition.
    pub selection: SelectionDecision,
}

/// Result of invoking the daily automation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AutomationOutcome {
    /// The run committed its batch.
    Completed(AutomationReport),
    /// The run made no changes.
    Skipped(SkipReason),
}

/// The transition whose query failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Reclassification of past-due in-progress tasks.
    Overspill,
    /// Promotion of backlog tasks into today.
    Selection,
}

impl fmt::Display for Transition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Overspill => "overspill",
            Self::Selection => "selection",
        })
    }
}

/// Errors that abort a run without changing any record.
#[derive(Debug, Error)]
pub enum DailyAutomationError {
    /// The user record does not exist.
    #[error("user not found: {0}")]
    UserNotFound(UserId),
    /// Loading the user or committing the batch failed.
    #[error("task store unavailable: {0}")]
    StoreUnavailable(#[source] TaskStoreError),
    /// A staged task changed status before the batch committed. Nothing was
    /// written; the next run reads the task again.
    #[error("task {0} changed while daily automation was running")]
    TaskChanged(TaskId),
    /// A transition query failed, so neither transition is committed.
    #[error("{transition} query failed: {source}")]
    PartialQueryFailure {
        /// Transition whose query failed.
        transition: Transition,
        /// Underlying store error.
        #[source]
        source: TaskStoreError,
    },
}

/// Result type for daily automation.
pub type DailyAutomationResult<T> = Result<T, DailyAutomationError>;

/// Marks a user as having a run in progress until dropped.
struct InFlightGuard {
    registry: Arc<Mutex<HashSet<UserId>>>,
    user_id: UserId,
}

impl InFlightGuard {
    fn acquire(registry: &Arc<Mutex<HashSet<UserId>>>, user_id: &UserId) -> Option<Self> {
        let inserted = registry
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(user_id.clone());
        inserted.then(|| Self {
            registry: Arc::clone(registry),
            user_id: user_id.clone(),
        })
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.registry
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.user_id);
    }
}

/// Once-a-day state-transition driver for a user's group board.
///
/// Clones share the store, strategies, and in-flight registry.
pub struct DailyAutomationService<S, C>
where
    S: TaskStore,
    C: Clock + Send + Sync,
{
    store: Arc<S>,
    clock: Arc<C>,
    scorer: Arc<dyn UrgencyScorer>,
    selector: Arc<dyn CandidateSelector>,
    daily_pick_count: usize,
    in_flight: Arc<Mutex<HashSet<UserId>>>,
}

impl<S, C> Clone for DailyAutomationService<S, C>
where
    S: TaskStore,
    C: Clock + Send + Sync,
{
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            clock: Arc::clone(&self.clock),
            scorer: Arc::clone(&self.scorer),
            selector: Arc::clone(&self.selector),
            daily_pick_count: self.daily_pick_count,
            in_flight: Arc::clone(&self.in_flight),
        }
    }
}

impl<S, C> DailyAutomationService<S, C>
where
    S: TaskStore,
    C: Clock + Send + Sync,
{
    /// Creates a service using the keyword scorer and jitter selector
    /// configured by `config`.
    #[must_use]
    pub fn new(store: Arc<S>, clock: Arc<C>, config: &AutomationConfig) -> Self {
        let selector = match config.selection_seed {
            Some(seed) => PriorityJitterSelector::seeded(seed, config.selection),
            None => PriorityJitterSelector::from_entropy(config.selection),
        };
        Self {
            store,
            clock,
            scorer: Arc::new(KeywordUrgencyScorer::new(config.scoring.clone())),
            selector: Arc::new(selector),
            daily_pick_count: config.daily_pick_count,
            in_flight: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    /// Replaces the urgency scoring strategy.
    #[must_use]
    pub fn with_scorer(mut self, scorer: Arc<dyn UrgencyScorer>) -> Self {
        self.scorer = scorer;
        self
    }

    /// Replaces the candidate selection strategy.
    #[must_use]
    pub fn with_selector(mut self, selector: Arc<dyn CandidateSelector>) -> Self {
        self.selector = selector;
        self
    }

    /// Runs the daily automation for the user and group in `context`.
    ///
    /// Returns [`AutomationOutcome::Skipped`] when there is no group, the
    /// user already ran today, or another run for the user is in progress.
    /// Otherwise past-due in-progress tasks become overspill, an empty day is
    /// filled from the backlog, and both are committed with the user's
    /// marker in one batch.
    ///
    /// # Errors
    ///
    /// Returns [`DailyAutomationError`] when the user is missing or the store
    /// fails. No record is changed in that case.
    pub async fn run_daily_automation(
        &self,
        context: &AutomationContext,
    ) -> DailyAutomationResult<AutomationOutcome> {
        let user_id = context.user_id();
        let Some(group_id) = context.group_id() else {
            debug!(%user_id, "no active group, skipping daily automation");
            return Ok(AutomationOutcome::Skipped(SkipReason::NoActiveGroup));
        };
        let Some(_guard) = InFlightGuard::acquire(&self.in_flight, user_id) else {
            debug!(%user_id, "daily automation already in flight");
            return Ok(AutomationOutcome::Skipped(SkipReason::RunInFlight));
        };

        let today = CalendarDate::today(&*self.clock);
        let user = self
            .store
            .get_user(user_id)
            .await
            .map_err(DailyAutomationError::StoreUnavailable)?
            .ok_or_else(|| DailyAutomationError::UserNotFound(user_id.clone()))?;
        if user.automated_on(today) {
            debug!(%user_id, %today, "daily automation already ran today");
            return Ok(AutomationOutcome::Skipped(SkipReason::AlreadyRanToday));
        }

        let mut writes = Vec::new();
        let overspilled = self.stage_overspill(group_id, today, &mut writes).await?;
        let (selection, promoted) = self.stage_selection(group_id, today, &mut writes).await?;
        writes.push(BatchWrite::UpdateUser {
            id: user_id.clone(),
            patch: UserPatch::automation_ran(today, user.last_automation_date()),
        });

        match self.store.atomic_batch_write(writes).await {
            Ok(()) => {}
            Err(TaskStoreError::StaleAutomationMarker(_)) => {
                debug!(%user_id, %today, "another session committed today's run first");
                return Ok(AutomationOutcome::Skipped(SkipReason::ConcurrentRun));
            }
            Err(TaskStoreError::TaskStatusChanged { id, .. }) => {
                debug!(%user_id, task_id = %id, "task changed before commit");
                return Err(DailyAutomationError::TaskChanged(id));
            }
            Err(err) => return Err(DailyAutomationError::StoreUnavailable(err)),
        }

        info!(
            %user_id,
            %group_id,
            %today,
            overspilled = overspilled.len(),
            promoted = promoted.len(),
            ?selection,
            "daily automation committed"
        );
        Ok(AutomationOutcome::Completed(AutomationReport {
            day: today,
            overspilled,
            promoted,
            selection,
        }))
    }

    async fn stage_overspill(
        &self,
        group_id: &GroupId,
        today: CalendarDate,
        writes: &mut Vec<BatchWrite>,
    ) -> DailyAutomationResult<Vec<(TaskId, UrgencyScore)>> {
        let query = TaskQuery::in_group(group_id.clone())
            .with_status(TaskStatus::InProgress)
            .with_date(DateFilter::Before(today));
        let past_due = self
            .store
            .query_tasks(&query)
            .await
            .map_err(|source| DailyAutomationError::PartialQueryFailure {
                transition: Transition::Overspill,
                source,
            })?;

        let mut overspilled = Vec::with_capacity(past_due.len());
        for task in &past_due {
            let score = self.scorer.score(task);
            writes.push(BatchWrite::UpdateTask {
                id: task.id(),
                patch: TaskPatch::overspill(score),
            });
            overspilled.push((task.id(), score));
        }
        Ok(overspilled)
    }

    async fn stage_selection(
        &self,
        group_id: &GroupId,
        today: CalendarDate,
        writes: &mut Vec<BatchWrite>,
    ) -> DailyAutomationResult<(SelectionDecision, Vec<TaskId>)> {
        let query_failed = |source| DailyAutomationError::PartialQueryFailure {
            transition: Transition::Selection,
            source,
        };

        let planned_today = TaskQuery::in_group(group_id.clone())
            .with_status(TaskStatus::InProgress)
            .with_date(DateFilter::On(today));
        let todays_work = self
            .store
            .query_tasks(&planned_today)
            .await
            .map_err(query_failed)?;
        if !todays_work.is_empty() {
            return Ok((SelectionDecision::DayAlreadyPlanned, Vec::new()));
        }

        let backlog_query = TaskQuery::in_group(group_id.clone()).with_status(TaskStatus::Backlog);
        let backlog = self
            .store
            .query_tasks(&backlog_query)
            .await
            .map_err(query_failed)?;
        if backlog.is_empty() {
            return Ok((SelectionDecision::BacklogEmpty, Vec::new()));
        }

        let promoted = self
            .selector
            .select_top_candidates(&backlog, self.daily_pick_count);
        if promoted.is_empty() {
            return Ok((SelectionDecision::NothingSelected, promoted));
        }
        writes.extend(promoted.iter().map(|id| BatchWrite::UpdateTask {
            id: *id,
            patch: TaskPatch::promote(today),
        }));
        Ok((SelectionDecision::Promoted, promoted))
    }
}
