//! In-memory integration tests for task board operations.

use super::helpers::{Harness, day, harness};
use rstest::rstest;
use tasker::task::{
    domain::{GroupId, Priority, TaskDomainError, TaskId, TaskStatus, UserId},
    ports::{TaskQuery, TaskStore},
    services::{CreateTaskRequest, TaskBoardError},
};

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn created_tasks_land_in_the_backlog(harness: Harness) {
    let request = CreateTaskRequest::new("family", "Renew passport")
        .with_description("Photos first")
        .with_priority(Priority::High)
        .with_labels(vec!["admin".to_owned()])
        .with_assignee("bob")
        .with_creator("alice");

    let created = harness
        .board
        .create_task(request)
        .await
        .expect("task creation succeeds");

    assert_eq!(created.status(), TaskStatus::Backlog);
    assert_eq!(created.priority(), Priority::High);
    assert_eq!(created.description(), "Photos first");
    assert_eq!(
        created.assigned_to().map(UserId::as_str),
        Some("bob")
    );
    assert_eq!(harness.reload(&created).await, created);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn blank_titles_are_rejected(harness: Harness) {
    let result = harness
        .board
        .create_task(CreateTaskRequest::new("family", "  "))
        .await;

    assert!(matches!(
        result,
        Err(TaskBoardError::Domain(TaskDomainError::EmptyTitle))
    ));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn import_accepts_codes_and_names_as_backlog_tasks(harness: Harness) {
    let creator = UserId::new("alice").expect("valid user");
    let payload = r#"[
        {"title": "Fix boiler", "priority": 0, "labels": ["home"]},
        {"title": "Buy stamps", "priority": "low", "status": "completed"},
        {"title": "Read book", "priority": "1"},
        {"title": "Call gran"}
    ]"#;

    let imported = harness
        .board
        .import_tasks(&harness.group_id, Some(&creator), payload)
        .await
        .expect("import succeeds");

    let priorities: Vec<_> = imported.iter().map(|task| task.priority()).collect();
    assert_eq!(
        priorities,
        vec![Priority::High, Priority::Low, Priority::Medium, Priority::Medium]
    );
    assert!(
        imported
            .iter()
            .all(|task| task.status() == TaskStatus::Backlog)
    );
    assert!(
        imported
            .iter()
            .all(|task| task.created_by() == Some(&creator))
    );
}

#[rstest]
#[case(r#"{"title": "not a list"}"#)]
#[case(r#"[{"description": "missing title"}]"#)]
#[tokio::test(flavor = "multi_thread")]
async fn malformed_imports_are_rejected(harness: Harness, #[case] payload: &str) {
    let result = harness
        .board
        .import_tasks(&harness.group_id, None, payload)
        .await;

    assert!(matches!(result, Err(TaskBoardError::InvalidImport(_))));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn import_with_unknown_priority_stores_nothing(harness: Harness) {
    let payload = r#"[{"title": "Fine"}, {"title": "Broken", "priority": 7}]"#;

    let result = harness
        .board
        .import_tasks(&harness.group_id, None, payload)
        .await;

    assert!(matches!(result, Err(TaskBoardError::InvalidPriority(_))));
    let board = harness.board.board(&harness.group_id).await.expect("board");
    assert!(board.backlog().is_empty());
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn start_and_toggle_follow_the_state_machine(harness: Harness) {
    let task = harness.backlog("Water plants", Priority::Medium).await;

    let started = harness
        .board
        .start_task(task.id())
        .await
        .expect("start backlog task");
    assert_eq!(started.date_planned(), Some(day("2024-01-01")));

    let done = harness
        .board
        .toggle_completion(task.id())
        .await
        .expect("complete task");
    assert_eq!(done.status(), TaskStatus::Completed);
    assert!(done.date_completed().is_some());

    let reopened = harness
        .board
        .toggle_completion(task.id())
        .await
        .expect("reopen task");
    assert_eq!(reopened.status(), TaskStatus::InProgress);
    assert_eq!(reopened.date_completed(), None);

    let restart = harness.board.start_task(task.id()).await;
    assert!(matches!(
        restart,
        Err(TaskBoardError::Domain(
            TaskDomainError::InvalidStatusTransition { .. }
        ))
    ));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn overspilled_task_can_be_rescheduled_today(harness: Harness) {
    let task = harness.started("Water plants", Priority::Medium).await;
    harness.clock.set_day(day("2024-01-02"));
    harness
        .automation
        .run_daily_automation(&harness.context())
        .await
        .expect("automation run succeeds");

    let rescheduled = harness
        .board
        .reschedule_overspill(task.id(), None)
        .await
        .expect("reschedule overspill");

    assert_eq!(rescheduled.status(), TaskStatus::InProgress);
    assert_eq!(rescheduled.date_planned(), Some(day("2024-01-02")));
    assert_eq!(
        rescheduled.urgency_score().map(|score| score.value()),
        Some(30)
    );
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn unknown_task_is_not_found(harness: Harness) {
    let missing = TaskId::new();

    let result = harness.board.toggle_completion(missing).await;

    assert!(matches!(result, Err(TaskBoardError::NotFound(id)) if id == missing));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn deleted_tasks_leave_the_board(harness: Harness) {
    let kept = harness.backlog("Water plants", Priority::Low).await;
    let removed = harness.backlog("Cancel gym", Priority::Medium).await;

    harness
        .board
        .delete_task(removed.id())
        .await
        .expect("delete succeeds");

    let found = harness
        .store
        .find_task(removed.id())
        .await
        .expect("lookup succeeds");
    assert!(found.is_none());
    let board = harness
        .board
        .board(&harness.group_id)
        .await
        .expect("board builds");
    let backlog: Vec<TaskId> = board.backlog().iter().map(|task| task.id()).collect();
    assert_eq!(backlog, vec![kept.id()]);

    let again = harness.board.delete_task(removed.id()).await;
    assert!(matches!(again, Err(TaskBoardError::NotFound(id)) if id == removed.id()));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn comments_are_appended_in_order(harness: Harness) {
    let task = harness.backlog("Plan trip", Priority::Low).await;
    let author = UserId::new("alice").expect("valid user");

    harness
        .board
        .add_comment(task.id(), author.clone(), "Booked flights")
        .await
        .expect("first comment");
    let updated = harness
        .board
        .add_comment(task.id(), author, "Hotel next")
        .await
        .expect("second comment");

    let bodies: Vec<_> = updated.comments().iter().map(|comment| comment.body()).collect();
    assert_eq!(bodies, vec!["Booked flights", "Hotel next"]);
    assert!(matches!(
        harness
            .board
            .add_comment(task.id(), UserId::new("bob").expect("valid user"), " ")
            .await,
        Err(TaskBoardError::Domain(TaskDomainError::EmptyComment))
    ));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn board_shows_only_the_requested_group(harness: Harness) {
    harness.started("Water plants", Priority::Medium).await;
    harness.backlog("Buy milk", Priority::Medium).await;
    harness
        .board
        .create_task(CreateTaskRequest::new("work", "Quarterly report"))
        .await
        .expect("create task in other group");

    let board = harness.board.board(&harness.group_id).await.expect("board");

    assert_eq!(board.today().len(), 1);
    assert_eq!(board.backlog().len(), 1);
    let work = GroupId::new("work").expect("valid group");
    let other = harness.board.board(&work).await.expect("board");
    assert_eq!(other.backlog().len(), 1);
    assert!(
        harness
            .store
            .query_tasks(&TaskQuery::in_group(work))
            .await
            .expect("query")
            .iter()
            .all(|task| task.group_id().as_str() == "work")
    );
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn labels_and_assignment_are_updated_in_place(harness: Harness) {
    let task = harness.backlog("Clean gutters", Priority::Low).await;
    let bob = UserId::new("bob").expect("valid user");

    harness
        .board
        .add_label(task.id(), "outdoor")
        .await
        .expect("first label");
    let labelled = harness
        .board
        .add_label(task.id(), "outdoor")
        .await
        .expect("repeat label");
    assert_eq!(labelled.labels().len(), 1);

    let assigned = harness
        .board
        .assign_task(task.id(), Some(bob.clone()))
        .await
        .expect("assign task");
    assert_eq!(assigned.assigned_to(), Some(&bob));

    let cleared = harness
        .board
        .assign_task(task.id(), None)
        .await
        .expect("clear assignment");
    assert_eq!(cleared.assigned_to(), None);
    assert_eq!(cleared.status(), TaskStatus::Backlog);
}
