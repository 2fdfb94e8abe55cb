//! Repository ports for boards, tasks and time logs.
//!
//! Every method that writes more than one row is atomic: callers observe
//! either the whole change or none of it. [`TaskRepository::relocate`] and
//! [`TaskRepository::insert`] are additionally serialised per column so
//! concurrent writers cannot break the dense ordering of a column.

use crate::kanban::domain::{
    Board, BoardId, BoardMember, Column, ColumnId, HistorySource, KanbanDomainError, Task,
    TaskDraft, TaskHistoryEntry, TaskId, TaskPosition, TaskSlot, TimeLogEntry, UserId,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use thiserror::Error;

/// Result type for Kanban repository operations.
pub type KanbanRepositoryResult<T> = Result<T, KanbanRepositoryError>;

/// Board, column and membership persistence contract.
#[async_trait]
pub trait BoardRepository: Send + Sync {
    /// Stores a board, its columns and the creator's membership together.
    ///
    /// # Errors
    ///
    /// Returns [`KanbanRepositoryError::DuplicateBoard`] when the board ID
    /// already exists.
    async fn create_board(
        &self,
        board: &Board,
        columns: &[Column],
        creator: &BoardMember,
    ) -> KanbanRepositoryResult<()>;

    /// Finds a board by identifier.
    async fn find_board(&self, id: BoardId) -> KanbanRepositoryResult<Option<Board>>;

    /// Lists boards ordered by creation time.
    async fn list_boards(&self, include_inactive: bool) -> KanbanRepositoryResult<Vec<Board>>;

    /// Persists changed board details.
    ///
    /// # Errors
    ///
    /// Returns [`KanbanRepositoryError::BoardNotFound`] when the board does not
    /// exist.
    async fn update_board(&self, board: &Board) -> KanbanRepositoryResult<()>;

    /// Returns a board's columns ordered by display position.
    async fn columns(&self, board_id: BoardId) -> KanbanRepositoryResult<Vec<Column>>;

    /// Finds a column by identifier.
    async fn find_column(&self, id: ColumnId) -> KanbanRepositoryResult<Option<Column>>;

    /// Rewrites column positions to follow `order` and returns the new layout.
    ///
    /// # Errors
    ///
    /// Returns [`KanbanRepositoryError::Domain`] when `order` does not name
    /// every column of the board exactly once.
    async fn reorder_columns(
        &self,
        board_id: BoardId,
        order: &[ColumnId],
    ) -> KanbanRepositoryResult<Vec<Column>>;

    /// Adds a member to a board.
    ///
    /// # Errors
    ///
    /// Returns [`KanbanRepositoryError::DuplicateMember`] when the user is
    /// already a member.
    async fn add_member(&self, member: &BoardMember) -> KanbanRepositoryResult<()>;

    /// Changes the role of an existing member.
    ///
    /// # Errors
    ///
    /// Returns [`KanbanRepositoryError::MemberNotFound`] when the user is not
    /// a member.
    async fn update_member(&self, member: &BoardMember) -> KanbanRepositoryResult<()>;

    /// Removes a member from a board.
    ///
    /// # Errors
    ///
    /// Returns [`KanbanRepositoryError::MemberNotFound`] when the user is not
    /// a member.
    async fn remove_member(&self, board_id: BoardId, user_id: UserId)
    -> KanbanRepositoryResult<()>;

    /// Lists the members of a board ordered by join time.
    async fn members(&self, board_id: BoardId) -> KanbanRepositoryResult<Vec<BoardMember>>;

    /// Finds one membership.
    async fn find_member(
        &self,
        board_id: BoardId,
        user_id: UserId,
    ) -> KanbanRepositoryResult<Option<BoardMember>>;
}

/// Request to move a task, executed atomically by [`TaskRepository::relocate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelocateTask {
    /// Task to move.
    pub task_id: TaskId,
    /// Destination column.
    pub target_column: ColumnId,
    /// Requested destination position; clamped to the column tail.
    pub target_position: TaskPosition,
    /// Acting user.
    pub actor: UserId,
    /// What triggered the move.
    pub source: HistorySource,
    /// Timestamp recorded on the task and the history row.
    pub at: DateTime<Utc>,
}

/// Outcome of a relocation or compaction step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relocation {
    /// The task at its new slot.
    pub task: Task,
    /// Slot the task occupied before.
    pub from: TaskSlot,
    /// History row written for the change; `None` when nothing moved.
    pub history: Option<TaskHistoryEntry>,
}

impl Relocation {
    /// Returns `true` when the task changed slot.
    #[must_use]
    pub fn moved(&self) -> bool {
        self.history.is_some()
    }
}

/// Outcome of [`TaskRepository::set_locked`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockChange {
    /// The stored task after the write.
    pub task: Task,
    /// `false` when the flag already had the requested value.
    pub changed: bool,
}

/// Task persistence contract, including the position ledger.
#[async_trait]
pub trait TaskRepository: Send + Sync {
    /// Stores a draft at the tail of its column.
    ///
    /// Assigns the next task code and the tail position, copies the column
    /// status and appends the creation history row.
    ///
    /// # Errors
    ///
    /// Returns [`KanbanRepositoryError::ColumnNotFound`] when the column does
    /// not exist, [`KanbanRepositoryError::Domain`] when it belongs to another
    /// board, or [`KanbanRepositoryError::DuplicateTask`] when the ID exists.
    async fn insert(&self, draft: &TaskDraft, source: HistorySource)
    -> KanbanRepositoryResult<Task>;

    /// Finds a task by identifier.
    async fn find_task(&self, id: TaskId) -> KanbanRepositoryResult<Option<Task>>;

    /// Lists a board's tasks ordered by column position, then task position.
    async fn tasks_for_board(&self, board_id: BoardId) -> KanbanRepositoryResult<Vec<Task>>;

    /// Lists a column's tasks ordered by position.
    async fn tasks_for_column(&self, column_id: ColumnId) -> KanbanRepositoryResult<Vec<Task>>;

    /// Persists editable task fields (title, description, priority,
    /// assignee, due date, authorship).
    ///
    /// Ordering fields and the lock flag keep their stored values; they are
    /// written only by [`TaskRepository::relocate`] and
    /// [`TaskRepository::set_locked`].
    ///
    /// # Errors
    ///
    /// Returns [`KanbanRepositoryError::TaskNotFound`] when the task does not
    /// exist.
    async fn update_task(&self, task: &Task) -> KanbanRepositoryResult<()>;

    /// Writes the lock flag of the stored task, leaving its other fields as
    /// they are.
    ///
    /// # Errors
    ///
    /// Returns [`KanbanRepositoryError::TaskNotFound`] when the task does not
    /// exist.
    async fn set_locked(
        &self,
        id: TaskId,
        locked: bool,
        actor: UserId,
        at: DateTime<Utc>,
    ) -> KanbanRepositoryResult<LockChange>;

    /// Moves a task, shifting its neighbours and appending a history row.
    ///
    /// A request that leaves the task where it is changes nothing.
    ///
    /// # Errors
    ///
    /// Returns [`KanbanRepositoryError::TaskNotFound`],
    /// [`KanbanRepositoryError::ColumnNotFound`], or
    /// [`KanbanRepositoryError::Domain`] wrapping
    /// [`KanbanDomainError::TaskLocked`] or
    /// [`KanbanDomainError::ColumnNotOnBoard`].
    async fn relocate(&self, request: &RelocateTask) -> KanbanRepositoryResult<Relocation>;

    /// Deletes a task together with its history and time logs.
    ///
    /// Sibling positions are left as they are.
    ///
    /// # Errors
    ///
    /// Returns [`KanbanRepositoryError::TaskNotFound`] when the task does not
    /// exist.
    async fn delete_task(&self, id: TaskId) -> KanbanRepositoryResult<Task>;

    /// Renumbers a column to `1..=n`, recording a system history row per
    /// moved task.
    ///
    /// # Errors
    ///
    /// Returns [`KanbanRepositoryError::ColumnNotFound`] when the column does
    /// not exist.
    async fn compact_column(
        &self,
        column_id: ColumnId,
        actor: UserId,
        at: DateTime<Utc>,
    ) -> KanbanRepositoryResult<Vec<Relocation>>;

    /// Returns a task's history ordered oldest first.
    async fn history_for_task(&self, id: TaskId)
    -> KanbanRepositoryResult<Vec<TaskHistoryEntry>>;
}

/// Time log persistence contract.
#[async_trait]
pub trait TimeLogRepository: Send + Sync {
    /// Stores a time log entry.
    ///
    /// # Errors
    ///
    /// Returns [`KanbanRepositoryError::TaskNotFound`] when the task does not
    /// exist.
    async fn record_time(&self, entry: &TimeLogEntry) -> KanbanRepositoryResult<()>;

    /// Lists a task's time log entries ordered oldest first.
    async fn time_logs_for_task(&self, id: TaskId) -> KanbanRepositoryResult<Vec<TimeLogEntry>>;
}

/// Errors returned by Kanban repository implementations.
#[derive(Debug, Clone, Error)]
pub enum KanbanRepositoryError {
    /// The board was not found.
    #[error("board not found: {0}")]
    BoardNotFound(BoardId),

    /// The column was not found.
    #[error("column not found: {0}")]
    ColumnNotFound(ColumnId),

    /// The task was not found.
    #[error("task not found: {0}")]
    TaskNotFound(TaskId),

    /// A board with the same identifier already exists.
    #[error("duplicate board identifier: {0}")]
    DuplicateBoard(BoardId),

    /// A task with the same identifier already exists.
    #[error("duplicate task identifier: {0}")]
    DuplicateTask(TaskId),

    /// The user is already a member of the board.
    #[error("user {user_id} is already a member of board {board_id}")]
    DuplicateMember {
        /// Board identifier.
        board_id: BoardId,
        /// User identifier.
        user_id: UserId,
    },

    /// The user is not a member of the board.
    #[error("user {user_id} is not a member of board {board_id}")]
    MemberNotFound {
        /// Board identifier.
        board_id: BoardId,
        /// User identifier.
        user_id: UserId,
    },

    /// The task changed column while the move was acquiring locks.
    #[error("task {0} was moved concurrently; retry the move")]
    ConcurrentMove(TaskId),

    /// A domain rule rejected the stored state change.
    #[error(transparent)]
    Domain(#[from] KanbanDomainError),

    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl KanbanRepositoryError {
    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}
