//! Shared world state for Kanban board BDD scenarios.

use std::collections::HashMap;
use std::sync::Arc;

use mockable::DefaultClock;
use rstest::fixture;
use swimlane::kanban::{
    adapters::{
        memory::{InMemoryKanbanStore, InMemoryUserDirectory},
        notifier::NoopNotifier,
    },
    domain::{BoardLayout, Column, ColumnId, Task, TaskId, UserId},
    services::{BoardService, KanbanServiceError, TaskService},
};

/// Board service used by the BDD world.
pub type TestBoardService = BoardService<InMemoryKanbanStore, NoopNotifier, DefaultClock>;

/// Task service used by the BDD world.
pub type TestTaskService =
    TaskService<InMemoryKanbanStore, InMemoryUserDirectory, NoopNotifier, DefaultClock>;

/// Scenario world for Kanban ordering behaviour tests.
pub struct KanbanWorld {
    pub boards: TestBoardService,
    pub tasks: TestTaskService,
    pub actor: UserId,
    pub layout: Option<BoardLayout>,
    pub tasks_by_title: HashMap<String, TaskId>,
    pub last_error: Option<KanbanServiceError>,
}

impl KanbanWorld {
    /// Creates a world with an empty store.
    #[must_use]
    pub fn new() -> Self {
        let store = Arc::new(InMemoryKanbanStore::new());
        let notifier = Arc::new(NoopNotifier);
        let clock = Arc::new(DefaultClock);
        Self {
            boards: BoardService::new(
                Arc::clone(&store),
                Arc::clone(&notifier),
                Arc::clone(&clock),
            ),
            tasks: TaskService::new(store, Arc::new(InMemoryUserDirectory::new()), notifier, clock),
            actor: UserId::new(),
            layout: None,
            tasks_by_title: HashMap::new(),
            last_error: None,
        }
    }

    /// Returns the board created by the scenario.
    ///
    /// # Errors
    ///
    /// Returns an error when no board has been created yet.
    pub fn layout(&self) -> Result<&BoardLayout, eyre::Report> {
        self.layout
            .as_ref()
            .ok_or_else(|| eyre::eyre!("missing board in scenario world"))
    }

    /// Resolves a column by display name.
    ///
    /// # Errors
    ///
    /// Returns an error when the board has no such column.
    pub fn column(&self, name: &str) -> Result<ColumnId, eyre::Report> {
        self.layout()?
            .columns
            .iter()
            .find(|column| column.name() == name)
            .map(Column::id)
            .ok_or_else(|| eyre::eyre!("unknown column {name}"))
    }

    /// Resolves a task by title.
    ///
    /// # Errors
    ///
    /// Returns an error when no task with that title was created.
    pub fn task(&self, title: &str) -> Result<TaskId, eyre::Report> {
        self.tasks_by_title
            .get(title)
            .copied()
            .ok_or_else(|| eyre::eyre!("unknown task {title}"))
    }

    /// Lists a column's tasks in position order.
    ///
    /// # Errors
    ///
    /// Returns an error when the column is unknown or the listing fails.
    pub fn column_tasks(&self, name: &str) -> Result<Vec<Task>, eyre::Report> {
        let column_id = self.column(name)?;
        Ok(run_async(self.tasks.list_column(column_id))?)
    }
}

impl Default for KanbanWorld {
    fn default() -> Self {
        Self::new()
    }
}

/// Fixture that creates a new scenario world.
#[fixture]
pub fn world() -> KanbanWorld {
    KanbanWorld::default()
}

/// Splits a comma-separated step argument into trimmed items.
pub fn list_items(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_owned)
        .collect()
}

/// Runs an async operation within sync step definitions.
pub fn run_async<T>(future: impl std::future::Future<Output = T>) -> T {
    tokio::task::block_in_place(|| tokio::runtime::Handle::current().block_on(future))
}
