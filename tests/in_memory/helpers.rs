//! Shared fixtures for in-memory integration tests.

use std::sync::Arc;

use mockable::DefaultClock;
use rstest::fixture;
use swimlane::kanban::{
    adapters::{
        memory::{InMemoryKanbanStore, InMemoryUserDirectory},
        notifier::BroadcastNotifier,
    },
    domain::{BoardLayout, ColumnId, Task, UserId},
    services::{BoardService, CreateBoardRequest, CreateTaskRequest, TaskService},
};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Board service wired to the in-memory store.
pub type Boards = BoardService<InMemoryKanbanStore, BroadcastNotifier, DefaultClock>;

/// Task service wired to the in-memory store.
pub type Tasks =
    TaskService<InMemoryKanbanStore, InMemoryUserDirectory, BroadcastNotifier, DefaultClock>;

/// Services sharing one store and one notifier.
pub struct Kanban {
    pub notifier: Arc<BroadcastNotifier>,
    pub boards: Boards,
    pub tasks: Arc<Tasks>,
    pub actor: UserId,
}

impl Kanban {
    /// Creates a board with the default columns.
    ///
    /// # Errors
    ///
    /// Returns an error if board creation fails.
    pub async fn board(&self, name: &str) -> eyre::Result<BoardLayout> {
        Ok(self
            .boards
            .create_board(CreateBoardRequest::new(name, self.actor))
            .await?)
    }

    /// Appends tasks with the given titles to a column.
    ///
    /// # Errors
    ///
    /// Returns an error if any creation fails.
    pub async fn seed(
        &self,
        layout: &BoardLayout,
        column_id: ColumnId,
        titles: &[&str],
    ) -> eyre::Result<Vec<Task>> {
        let mut created = Vec::with_capacity(titles.len());
        for title in titles {
            let request = CreateTaskRequest::new(layout.board.id(), column_id, *title, self.actor);
            created.push(self.tasks.create_task(request).await?);
        }
        Ok(created)
    }

    /// Returns the positions of a column's tasks in listing order.
    ///
    /// # Errors
    ///
    /// Returns an error if the listing fails.
    pub async fn positions(&self, column_id: ColumnId) -> eyre::Result<Vec<u32>> {
        Ok(self
            .tasks
            .list_column(column_id)
            .await?
            .iter()
            .map(|task| task.position().value())
            .collect())
    }
}

/// Installs a test-friendly subscriber once; `RUST_LOG` controls verbosity.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("off"));
    drop(
        tracing_subscriber::registry()
            .with(fmt::layer().with_test_writer())
            .with(filter)
            .try_init(),
    );
}

/// Provides services over a fresh store for each test.
#[fixture]
pub fn kanban() -> Kanban {
    init_tracing();
    let store = Arc::new(InMemoryKanbanStore::new());
    let notifier = Arc::new(BroadcastNotifier::new(64));
    let clock = Arc::new(DefaultClock);
    Kanban {
        boards: BoardService::new(Arc::clone(&store), Arc::clone(&notifier), Arc::clone(&clock)),
        tasks: Arc::new(TaskService::new(
            store,
            Arc::new(InMemoryUserDirectory::new()),
            Arc::clone(&notifier),
            clock,
        )),
        notifier,
        actor: UserId::new(),
    }
}
