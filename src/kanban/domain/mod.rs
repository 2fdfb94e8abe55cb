//! Domain model for the Kanban board core.
//!
//! Boards own an ordered set of columns; columns own a dense, ordered set of
//! tasks. Ordering logic lives in [`ledger`] and is expressed as plans that
//! adapters execute, so the rules are identical for every storage backend.

mod board;
mod column;
mod error;
mod event;
mod history;
mod ids;
pub mod ledger;
mod priority;
mod task;
mod time_log;

pub use board::{Board, BoardLayout, BoardMember, BoardName, BoardRole, PersistedBoardData};
pub use column::{
    Column, ColumnTemplate, DEFAULT_COLUMN_LAYOUT, PersistedColumnData, plan_column_order,
};
pub use error::{
    KanbanDomainError, ParseBoardRoleError, ParseHistorySourceError, ParseTaskPriorityError,
};
pub use event::KanbanEvent;
pub use history::{HistorySource, TaskHistoryEntry};
pub use ids::{
    BoardId, ColumnId, ColumnPosition, HistoryId, TaskCode, TaskId, TaskPosition, TimeLogId,
    UserId,
};
pub use ledger::{MovePlan, PositionShift, ShiftDirection, TaskSlot};
pub use priority::TaskPriority;
pub use task::{PersistedTaskData, Task, TaskDraft, TaskPatch, TaskTitle};
pub use time_log::{LoggedMinutes, TimeLogEntry, total_minutes};
