//! Change notifications published to board observers.

use super::{Board, BoardId, Column, Task, TaskCode, TaskId, ledger::TaskSlot};
use serde::{Deserialize, Serialize};

/// A committed change on a board.
///
/// Events are published after the mutation is durable; delivery is best
/// effort.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum KanbanEvent {
    /// A board and its default columns were created.
    BoardCreated {
        /// The new board.
        board: Board,
        /// Seeded columns in display order.
        columns: Vec<Column>,
    },
    /// Board details or the column list changed.
    BoardUpdated {
        /// The board after the change.
        board: Board,
        /// Columns in display order after the change.
        columns: Vec<Column>,
    },
    /// A task was added to a column.
    TaskCreated {
        /// The new task.
        task: Task,
    },
    /// Task fields changed.
    TaskUpdated {
        /// The task after the change.
        task: Task,
    },
    /// A task changed column or position.
    TaskMoved {
        /// The task at its new slot.
        task: Task,
        /// Slot the task left.
        from: TaskSlot,
    },
    /// A task was deleted.
    TaskDeleted {
        /// Board the task belonged to.
        board_id: BoardId,
        /// Deleted task identifier.
        task_id: TaskId,
        /// Deleted task code.
        code: TaskCode,
    },
}

impl KanbanEvent {
    /// Returns the channel event name observers subscribe to.
    #[must_use]
    pub const fn event_name(&self) -> &'static str {
        match self {
            Self::BoardCreated { .. } => "kanban:board_created",
            Self::BoardUpdated { .. } => "kanban:board_updated",
            Self::TaskCreated { .. } => "kanban:task_created",
            Self::TaskUpdated { .. } => "kanban:task_updated",
            Self::TaskMoved { .. } => "kanban:task_moved",
            Self::TaskDeleted { .. } => "kanban:task_deleted",
        }
    }

    /// Returns the board whose observers receive the event.
    #[must_use]
    pub const fn board_id(&self) -> BoardId {
        match self {
            Self::BoardCreated { board, .. } | Self::BoardUpdated { board, .. } => board.id(),
            Self::TaskCreated { task }
            | Self::TaskUpdated { task }
            | Self::TaskMoved { task, .. } => task.board_id(),
            Self::TaskDeleted { board_id, .. } => *board_id,
        }
    }

    /// Serialises the event body sent alongside [`KanbanEvent::event_name`].
    ///
    /// # Errors
    ///
    /// Returns a [`serde_json::Error`] if the payload cannot be encoded.
    pub fn payload(&self) -> Result<serde_json::Value, serde_json::Error> {
        serde_json::to_value(self)
    }
}
