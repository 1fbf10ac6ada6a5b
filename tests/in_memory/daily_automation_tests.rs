//! In-memory integration tests for the daily automation run.

use super::helpers::{Harness, day, harness};
use rstest::rstest;
use std::collections::HashSet;
use tasker::task::{
    domain::{GroupId, Priority, TaskPatch, TaskStatus, UserPatch},
    ports::{BatchWrite, DateFilter, TaskQuery, TaskStore, TaskStoreError},
    services::{
        AutomationOutcome, AutomationReport, CreateTaskRequest, DailyAutomationError,
        SelectionDecision, SkipReason, Transition,
    },
};

async fn completed(harness: &Harness) -> AutomationReport {
    match harness
        .automation
        .run_daily_automation(&harness.context())
        .await
        .expect("automation run succeeds")
    {
        AutomationOutcome::Completed(report) => report,
        AutomationOutcome::Skipped(reason) => panic!("run skipped: {reason:?}"),
    }
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn next_day_overspills_unfinished_work_and_fills_the_day(harness: Harness) {
    let urgent = harness.started("Fix client ASAP", Priority::High).await;
    let routine = harness.started("Water plants", Priority::Medium).await;
    let first = harness.backlog("Buy milk", Priority::Medium).await;
    let second = harness.backlog("Sort photos", Priority::Low).await;
    harness.clock.set_day(day("2024-01-02"));

    let report = completed(&harness).await;

    assert_eq!(report.day, day("2024-01-02"));
    let scores: HashSet<_> = report
        .overspilled
        .iter()
        .map(|(id, score)| (*id, score.value()))
        .collect();
    assert_eq!(
        scores,
        HashSet::from([(urgent.id(), 95), (routine.id(), 30)])
    );
    assert_eq!(report.selection, SelectionDecision::Promoted);
    assert_eq!(
        report.promoted.iter().copied().collect::<HashSet<_>>(),
        HashSet::from([first.id(), second.id()])
    );

    let urgent_after = harness.reload(&urgent).await;
    assert_eq!(urgent_after.status(), TaskStatus::Overspill);
    assert_eq!(urgent_after.date_planned(), Some(day("2024-01-01")));
    assert_eq!(urgent_after.urgency_score().map(|score| score.value()), Some(95));

    let first_after = harness.reload(&first).await;
    assert_eq!(first_after.status(), TaskStatus::InProgress);
    assert_eq!(first_after.date_planned(), Some(day("2024-01-02")));

    let user = harness
        .store
        .get_user(&harness.user_id)
        .await
        .expect("user lookup")
        .expect("user exists");
    assert_eq!(user.last_automation_date(), Some(day("2024-01-02")));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn second_run_on_the_same_day_changes_nothing(harness: Harness) {
    harness.started("Water plants", Priority::Medium).await;
    harness.backlog("Buy milk", Priority::Medium).await;
    harness.clock.set_day(day("2024-01-02"));
    completed(&harness).await;
    let before = harness.store.snapshot().expect("snapshot");
    let batches = harness.store.committed_batches().expect("batch count");

    let outcome = harness
        .automation
        .run_daily_automation(&harness.context())
        .await
        .expect("repeat run succeeds");

    assert_eq!(outcome, AutomationOutcome::Skipped(SkipReason::AlreadyRanToday));
    assert_eq!(harness.store.snapshot().expect("snapshot"), before);
    assert_eq!(harness.store.committed_batches().expect("batch count"), batches);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn planned_day_leaves_the_backlog_alone(harness: Harness) {
    let yesterday = harness.started("Call plumber", Priority::Low).await;
    let waiting = harness.backlog("Buy milk", Priority::High).await;
    harness.clock.set_day(day("2024-01-02"));
    harness.started("Already planned", Priority::Medium).await;

    let report = completed(&harness).await;

    assert_eq!(report.selection, SelectionDecision::DayAlreadyPlanned);
    assert!(report.promoted.is_empty());
    assert_eq!(report.overspilled.len(), 1);
    assert_eq!(
        harness.reload(&yesterday).await.status(),
        TaskStatus::Overspill
    );
    assert_eq!(harness.reload(&waiting).await.status(), TaskStatus::Backlog);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn empty_backlog_still_records_the_run(harness: Harness) {
    harness.clock.set_day(day("2024-01-02"));

    let report = completed(&harness).await;

    assert_eq!(report.selection, SelectionDecision::BacklogEmpty);
    assert!(report.overspilled.is_empty());
    assert_eq!(harness.store.committed_batches().expect("batch count"), 1);
}

#[rstest]
#[case(1, 1)]
#[case(3, 3)]
#[case(7, 3)]
#[tokio::test(flavor = "multi_thread")]
async fn promotes_at_most_the_daily_pick_count(
    harness: Harness,
    #[case] backlog_size: usize,
    #[case] expected: usize,
) {
    let mut backlog = HashSet::new();
    for index in 0..backlog_size {
        let task = harness
            .backlog(&format!("Chore {index}"), Priority::Medium)
            .await;
        backlog.insert(task.id());
    }
    harness.clock.set_day(day("2024-01-02"));

    let report = completed(&harness).await;

    let promoted: HashSet<_> = report.promoted.iter().copied().collect();
    assert_eq!(report.promoted.len(), expected);
    assert_eq!(promoted.len(), expected);
    assert!(promoted.is_subset(&backlog));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn completed_and_current_tasks_are_not_overspilled(harness: Harness) {
    let done = harness.started("Pay rent", Priority::High).await;
    harness
        .board
        .toggle_completion(done.id())
        .await
        .expect("complete task");
    harness.clock.set_day(day("2024-01-02"));
    let today = harness.started("Plan week", Priority::Medium).await;

    let report = completed(&harness).await;

    assert!(report.overspilled.is_empty());
    assert_eq!(harness.reload(&done).await.status(), TaskStatus::Completed);
    assert_eq!(harness.reload(&today).await.status(), TaskStatus::InProgress);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn other_groups_are_untouched(harness: Harness) {
    let work = GroupId::new("work").expect("valid group");
    let created = harness
        .board
        .create_task(CreateTaskRequest::new(work.as_str(), "Quarterly report"))
        .await
        .expect("create task in other group");
    let foreign = harness
        .board
        .start_task(created.id())
        .await
        .expect("start task in other group");
    harness.clock.set_day(day("2024-01-02"));

    completed(&harness).await;

    assert_eq!(harness.reload(&foreign).await, foreign);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn failed_commit_leaves_every_record_unchanged(harness: Harness) {
    harness.started("Water plants", Priority::Medium).await;
    harness.backlog("Buy milk", Priority::Medium).await;
    harness.clock.set_day(day("2024-01-02"));
    let before = harness.store.snapshot().expect("snapshot");
    harness.store.fail_batch_writes().expect("inject fault");

    let result = harness
        .automation
        .run_daily_automation(&harness.context())
        .await;

    assert!(matches!(
        result,
        Err(DailyAutomationError::StoreUnavailable(_))
    ));
    assert_eq!(harness.store.snapshot().expect("snapshot"), before);

    harness.store.heal().expect("heal store");
    let retry = completed(&harness).await;
    assert_eq!(retry.overspilled.len(), 1);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn failed_selection_query_discards_the_overspill(harness: Harness) {
    let stale = harness.started("Water plants", Priority::Medium).await;
    harness.clock.set_day(day("2024-01-02"));
    harness
        .store
        .fail_query(
            TaskQuery::in_group(harness.group_id.clone())
                .with_status(TaskStatus::Backlog),
        )
        .expect("inject fault");
    let before = harness.store.snapshot().expect("snapshot");

    let result = harness
        .automation
        .run_daily_automation(&harness.context())
        .await;

    assert!(matches!(
        result,
        Err(DailyAutomationError::PartialQueryFailure {
            transition: Transition::Selection,
            ..
        })
    ));
    assert_eq!(harness.store.snapshot().expect("snapshot"), before);
    assert_eq!(harness.reload(&stale).await.status(), TaskStatus::InProgress);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn failed_overspill_query_is_reported(harness: Harness) {
    harness.clock.set_day(day("2024-01-02"));
    harness
        .store
        .fail_query(
            TaskQuery::in_group(harness.group_id.clone())
                .with_status(TaskStatus::InProgress)
                .with_date(DateFilter::Before(day("2024-01-02"))),
        )
        .expect("inject fault");

    let result = harness
        .automation
        .run_daily_automation(&harness.context())
        .await;

    assert!(matches!(
        result,
        Err(DailyAutomationError::PartialQueryFailure {
            transition: Transition::Overspill,
            ..
        })
    ));
    assert_eq!(harness.store.committed_batches().expect("batch count"), 0);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn stale_marker_rejects_the_whole_batch(harness: Harness) {
    let task = harness.backlog("Buy milk", Priority::Medium).await;
    harness
        .store
        .update_user(
            &harness.user_id,
            UserPatch::automation_ran(day("2024-01-02"), None),
        )
        .await
        .expect("first session records its run");
    let before = harness.store.snapshot().expect("snapshot");

    let result = harness
        .store
        .atomic_batch_write(vec![
            BatchWrite::UpdateTask {
                id: task.id(),
                patch: TaskPatch::promote(day("2024-01-02")),
            },
            BatchWrite::UpdateUser {
                id: harness.user_id.clone(),
                patch: UserPatch::automation_ran(day("2024-01-02"), None),
            },
        ])
        .await;

    assert!(matches!(
        result,
        Err(TaskStoreError::StaleAutomationMarker(_))
    ));
    assert_eq!(harness.store.snapshot().expect("snapshot"), before);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn promotion_of_a_started_task_rejects_the_whole_batch(harness: Harness) {
    let task = harness.started("Buy milk", Priority::Medium).await;
    let before = harness.store.snapshot().expect("snapshot");

    let result = harness
        .store
        .atomic_batch_write(vec![
            BatchWrite::UpdateUser {
                id: harness.user_id.clone(),
                patch: UserPatch::automation_ran(day("2024-01-02"), None),
            },
            BatchWrite::UpdateTask {
                id: task.id(),
                patch: TaskPatch::promote(day("2024-01-02")),
            },
        ])
        .await;

    assert!(matches!(
        result,
        Err(TaskStoreError::TaskStatusChanged { id, expected: TaskStatus::Backlog })
            if id == task.id()
    ));
    assert_eq!(harness.store.snapshot().expect("snapshot"), before);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn concurrent_sessions_commit_once(harness: Harness) {
    harness.started("Water plants", Priority::Medium).await;
    harness.backlog("Buy milk", Priority::Medium).await;
    harness.clock.set_day(day("2024-01-02"));
    let context = harness.context();
    let other = harness.automation.clone();

    let (left, right) = tokio::join!(
        harness.automation.run_daily_automation(&context),
        other.run_daily_automation(&context),
    );

    let outcomes = [
        left.expect("first run succeeds"),
        right.expect("second run succeeds"),
    ];
    let completed_runs = outcomes
        .iter()
        .filter(|outcome| matches!(outcome, AutomationOutcome::Completed(_)))
        .count();
    assert_eq!(completed_runs, 1);
    assert!(outcomes.iter().any(|outcome| matches!(
        outcome,
        AutomationOutcome::Skipped(
            SkipReason::AlreadyRanToday | SkipReason::RunInFlight | SkipReason::ConcurrentRun
        )
    )));
    assert_eq!(harness.store.committed_batches().expect("batch count"), 1);
}
