//! Shared harness for in-memory store integration tests.

use chrono::{DateTime, Local, TimeDelta, TimeZone, Utc};
use mockable::Clock;
use rstest::fixture;
use std::sync::{Arc, Mutex, PoisonError};
use tasker::task::{
    adapters::memory::InMemoryTaskStore,
    domain::{CalendarDate, GroupId, Priority, Task, User, UserId},
    services::{
        AutomationConfig, AutomationContext, CreateTaskRequest, DailyAutomationService,
        SessionActivation, TaskBoardService,
    },
};

/// Clock whose current instant tests can move between days.
#[derive(Debug)]
pub struct SettableClock {
    now: Mutex<DateTime<Local>>,
}

impl SettableClock {
    /// Creates a clock at local noon on `day`.
    pub fn on(day: CalendarDate) -> Self {
        Self {
            now: Mutex::new(local_noon(day)),
        }
    }

    /// Jumps to local noon on `day`.
    pub fn set_day(&self, day: CalendarDate) {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner) = local_noon(day);
    }

    /// Moves the clock forward by one second.
    pub fn tick(&self) {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner) += TimeDelta::seconds(1);
    }
}

impl Clock for SettableClock {
    fn local(&self) -> DateTime<Local> {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn utc(&self) -> DateTime<Utc> {
        self.local().with_timezone(&Utc)
    }
}

fn local_noon(day: CalendarDate) -> DateTime<Local> {
    let noon = day
        .into_inner()
        .and_hms_opt(12, 0, 0)
        .expect("noon is a valid time");
    Local
        .from_local_datetime(&noon)
        .earliest()
        .expect("local noon exists")
}

/// Parses an ISO day, panicking on malformed fixtures.
pub fn day(value: &str) -> CalendarDate {
    value.parse().expect("valid fixture date")
}

/// Automation service type used by the harness.
pub type TestAutomation = DailyAutomationService<InMemoryTaskStore, SettableClock>;

/// Board service type used by the harness.
pub type TestBoard = TaskBoardService<InMemoryTaskStore, SettableClock>;

/// Store, clock, and services wired together for one test.
pub struct Harness {
    pub store: Arc<InMemoryTaskStore>,
    pub clock: Arc<SettableClock>,
    pub automation: TestAutomation,
    pub board: TestBoard,
    pub session: SessionActivation<InMemoryTaskStore, SettableClock>,
    pub user_id: UserId,
    pub group_id: GroupId,
}

impl Harness {
    /// Builds a harness on 2024-01-01 with user `alice` active in `family`.
    pub fn new() -> Self {
        let store = Arc::new(InMemoryTaskStore::new());
        let clock = Arc::new(SettableClock::on(day("2024-01-01")));
        let automation = DailyAutomationService::new(
            Arc::clone(&store),
            Arc::clone(&clock),
            &AutomationConfig::seeded(42),
        );
        let board = TaskBoardService::new(Arc::clone(&store), Arc::clone(&clock));
        let session = SessionActivation::new(Arc::clone(&store), automation.clone());
        let user_id = UserId::new("alice").expect("valid user");
        let group_id = GroupId::new("family").expect("valid group");
        store
            .put_user(User::new(user_id.clone(), Some(group_id.clone())))
            .expect("seed user");

        Self {
            store,
            clock,
            automation,
            board,
            session,
            user_id,
            group_id,
        }
    }

    /// Returns the automation context for the harness user and group.
    pub fn context(&self) -> AutomationContext {
        AutomationContext::new(self.user_id.clone(), Some(self.group_id.clone()))
    }

    /// Creates a backlog task in the harness group.
    pub async fn backlog(&self, title: &str, priority: Priority) -> Task {
        let request = CreateTaskRequest::new(self.group_id.as_str(), title).with_priority(priority);
        let task = self
            .board
            .create_task(request)
            .await
            .expect("create backlog task");
        self.clock.tick();
        task
    }

    /// Creates a task and starts it today.
    pub async fn started(&self, title: &str, priority: Priority) -> Task {
        let task = self.backlog(title, priority).await;
        self.board
            .start_task(task.id())
            .await
            .expect("start backlog task")
    }

    /// Fetches a stored task by identifier.
    pub async fn reload(&self, task: &Task) -> Task {
        use tasker::task::ports::TaskStore;

        self.store
            .find_task(task.id())
            .await
            .expect("store lookup")
            .expect("task exists")
    }
}

impl Default for Harness {
    fn default() -> Self {
        Self::new()
    }
}

/// Provides a fresh harness for each test.
#[fixture]
pub fn harness() -> Harness {
    Harness::new()
}
