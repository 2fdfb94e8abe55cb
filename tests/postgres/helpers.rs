//! Shared fixtures for `PostgreSQL` integration tests.

pub use super::cluster::{BoxError, PostgresCluster, TemporaryDatabase, postgres_cluster};
use diesel::PgConnection;
use diesel::r2d2::{ConnectionManager, Pool};
use mockable::DefaultClock;
use rstest::fixture;
use std::sync::Arc;
use swimlane::kanban::{
    adapters::{
        memory::InMemoryUserDirectory,
        notifier::RecordingNotifier,
        postgres::{KanbanPgPool, PostgresKanbanStore},
    },
    domain::{BoardLayout, Column, ColumnId, Task, UserId},
    services::{BoardService, CreateBoardRequest, CreateTaskRequest, TaskService},
};

/// Board service wired to `PostgreSQL`.
pub type PgBoards = BoardService<PostgresKanbanStore, RecordingNotifier, DefaultClock>;

/// Task service wired to `PostgreSQL`.
pub type PgTasks =
    TaskService<PostgresKanbanStore, InMemoryUserDirectory, RecordingNotifier, DefaultClock>;

/// Services over a freshly migrated database.
pub struct PgKanban {
    pub store: Arc<PostgresKanbanStore>,
    pub notifier: Arc<RecordingNotifier>,
    pub boards: PgBoards,
    pub tasks: Arc<PgTasks>,
    pub actor: UserId,
    // Dropped last so pooled connections close before the database goes.
    _database: TemporaryDatabase,
}

impl PgKanban {
    /// Creates a board with the default columns.
    ///
    /// # Errors
    ///
    /// Returns an error if board creation fails.
    pub async fn board(&self, name: &str) -> Result<BoardLayout, BoxError> {
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
    ) -> Result<Vec<Task>, BoxError> {
        let mut created = Vec::with_capacity(titles.len());
        for title in titles {
            let request = CreateTaskRequest::new(layout.board.id(), column_id, *title, self.actor);
            created.push(self.tasks.create_task(request).await?);
        }
        Ok(created)
    }

    /// Returns `(title, position)` pairs for a column in listing order.
    ///
    /// # Errors
    ///
    /// Returns an error if the listing fails.
    pub async fn column(&self, column_id: ColumnId) -> Result<Vec<(String, u32)>, BoxError> {
        Ok(self
            .tasks
            .list_column(column_id)
            .await?
            .iter()
            .map(|task| (task.title().as_str().to_owned(), task.position().value()))
            .collect())
    }
}

/// Returns the id of the column at `index` in board order.
///
/// # Errors
///
/// Returns an error when the board has fewer columns.
pub fn column_at(layout: &BoardLayout, index: usize) -> Result<ColumnId, BoxError> {
    layout
        .columns
        .get(index)
        .map(Column::id)
        .ok_or_else(|| format!("board has no column {index}").into())
}

/// Provides services over a new migrated database.
///
/// # Errors
///
/// Returns an error if the database or its pool cannot be created.
#[fixture]
pub async fn pg_kanban(
    postgres_cluster: Result<PostgresCluster, BoxError>,
) -> Result<PgKanban, BoxError> {
    let cluster = postgres_cluster?;
    let database = cluster.migrated_database().await?;
    let pool: KanbanPgPool = Pool::builder()
        .max_size(4)
        .build(ConnectionManager::<PgConnection>::new(database.url()))
        .map_err(|err| Box::new(err) as BoxError)?;

    let store = Arc::new(PostgresKanbanStore::new(pool));
    let notifier = Arc::new(RecordingNotifier::new());
    let clock = Arc::new(DefaultClock);
    Ok(PgKanban {
        boards: BoardService::new(Arc::clone(&store), Arc::clone(&notifier), Arc::clone(&clock)),
        tasks: Arc::new(TaskService::new(
            Arc::clone(&store),
            Arc::new(InMemoryUserDirectory::new()),
            Arc::clone(&notifier),
            clock,
        )),
        store,
        notifier,
        actor: UserId::new(),
        _database: database,
    })
}
