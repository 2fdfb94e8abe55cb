//! Service-level errors and their caller-facing classification.

use crate::kanban::{
    domain::{BoardId, ColumnId, KanbanDomainError, TaskId},
    ports::{KanbanRepositoryError, UserDirectoryError},
};
use thiserror::Error;

/// Coarse error class surfaced to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// A referenced board, column, task or membership does not exist.
    NotFound,
    /// The request is malformed or violates a validation rule.
    InvalidInput,
    /// The request is well formed but not allowed in the current state.
    Forbidden,
    /// Unexpected infrastructure failure.
    Internal,
}

/// Errors returned by Kanban services.
#[derive(Debug, Error)]
pub enum KanbanServiceError {
    /// Domain validation failed.
    #[error(transparent)]
    Domain(#[from] KanbanDomainError),

    /// Repository operation failed.
    #[error(transparent)]
    Repository(#[from] KanbanRepositoryError),

    /// Identity lookup failed.
    #[error(transparent)]
    Directory(#[from] UserDirectoryError),

    /// The board does not exist.
    #[error("board not found: {0}")]
    BoardNotFound(BoardId),

    /// The task does not exist.
    #[error("task not found: {0}")]
    TaskNotFound(TaskId),

    /// The referenced column does not exist or is not on the task's board.
    #[error("invalid column reference: {0}")]
    InvalidColumnReference(ColumnId),
}

/// Result type for Kanban service operations.
pub type KanbanServiceResult<T> = Result<T, KanbanServiceError>;

impl KanbanServiceError {
    /// Classifies the error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Domain(err) => domain_kind(err),
            Self::Repository(err) => repository_kind(err),
            Self::Directory(_) => ErrorKind::Internal,
            Self::BoardNotFound(_) | Self::TaskNotFound(_) => ErrorKind::NotFound,
            Self::InvalidColumnReference(_) => ErrorKind::InvalidInput,
        }
    }
}

const fn domain_kind(err: &KanbanDomainError) -> ErrorKind {
    match err {
        KanbanDomainError::TaskLocked(_) => ErrorKind::Forbidden,
        _ => ErrorKind::InvalidInput,
    }
}

const fn repository_kind(err: &KanbanRepositoryError) -> ErrorKind {
    match err {
        KanbanRepositoryError::BoardNotFound(_)
        | KanbanRepositoryError::ColumnNotFound(_)
        | KanbanRepositoryError::TaskNotFound(_)
        | KanbanRepositoryError::MemberNotFound { .. } => ErrorKind::NotFound,
        KanbanRepositoryError::DuplicateBoard(_)
        | KanbanRepositoryError::DuplicateTask(_)
        | KanbanRepositoryError::DuplicateMember { .. } => ErrorKind::InvalidInput,
        KanbanRepositoryError::Domain(inner) => domain_kind(inner),
        KanbanRepositoryError::ConcurrentMove(_) | KanbanRepositoryError::Persistence(_) => {
            ErrorKind::Internal
        }
    }
}

/// Maps a missing column onto the invalid-reference error callers expect.
pub(super) fn column_reference(err: KanbanRepositoryError) -> KanbanServiceError {
    match err {
        KanbanRepositoryError::ColumnNotFound(column_id)
        | KanbanRepositoryError::Domain(KanbanDomainError::ColumnNotOnBoard { column_id, .. }) => {
            KanbanServiceError::InvalidColumnReference(column_id)
        }
        other => KanbanServiceError::Repository(other),
    }
}
