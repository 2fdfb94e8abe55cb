//! Error types for Kanban domain validation and parsing.

use super::{BoardId, ColumnId, TaskId};
use thiserror::Error;

/// Errors returned while constructing or mutating Kanban domain values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum KanbanDomainError {
    /// The task title is empty after trimming.
    #[error("task title must not be empty")]
    EmptyTaskTitle,

    /// The board name is empty after trimming.
    #[error("board name must not be empty")]
    EmptyBoardName,

    /// A task position must be at least one.
    #[error("invalid task position {0}, expected a positive integer")]
    InvalidTaskPosition(u32),

    /// A task code does not follow the `KAN-<number>` format.
    #[error("invalid task code '{0}', expected KAN-<number>")]
    InvalidTaskCode(String),

    /// Logged time must be a positive number of minutes.
    #[error("logged minutes must be positive")]
    EmptyTimeLog,

    /// Logged time exceeds what a single entry may hold.
    #[error("{0} logged minutes exceed the per-entry limit")]
    TimeLogTooLong(u32),

    /// The task is locked and cannot be moved.
    #[error("task {0} is locked")]
    TaskLocked(TaskId),

    /// The column belongs to a different board than the task or request.
    #[error("column {column_id} does not belong to board {board_id}")]
    ColumnNotOnBoard {
        /// Column identifier.
        column_id: ColumnId,
        /// Board the column was expected to belong to.
        board_id: BoardId,
    },

    /// A column reorder request does not list every column exactly once.
    #[error("column order lists {actual} columns, board has {expected}")]
    ColumnOrderLengthMismatch {
        /// Number of columns on the board.
        expected: usize,
        /// Number of identifiers supplied.
        actual: usize,
    },

    /// A column reorder request names a column twice.
    #[error("column {0} appears more than once in the requested order")]
    DuplicateColumnInOrder(ColumnId),
}

/// Error returned while parsing task priorities from persistence.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown task priority: {0}")]
pub struct ParseTaskPriorityError(pub String);

/// Error returned while parsing board member roles from persistence.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown board role: {0}")]
pub struct ParseBoardRoleError(pub String);

/// Error returned while parsing history sources from persistence.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown history source: {0}")]
pub struct ParseHistorySourceError(pub String);
