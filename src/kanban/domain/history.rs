//! Append-only task history.

use super::{
    BoardId, ColumnId, HistoryId, ParseHistorySourceError, Task, TaskId, TaskPosition, UserId,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// What triggered a recorded transition.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HistorySource {
    /// A user acting through the board UI.
    #[default]
    Manual,
    /// An external integration callback.
    Webhook,
    /// Housekeeping performed by the system, such as column compaction.
    System,
}

impl HistorySource {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Manual => "manual",
            Self::Webhook => "webhook",
            Self::System => "system",
        }
    }
}

impl TryFrom<&str> for HistorySource {
    type Error = ParseHistorySourceError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "manual" => Ok(Self::Manual),
            "webhook" => Ok(Self::Webhook),
            "system" => Ok(Self::System),
            _ => Err(ParseHistorySourceError(value.to_owned())),
        }
    }
}

impl fmt::Display for HistorySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immutable audit record of one task transition.
///
/// The `old_*` fields are empty for the creation record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskHistoryEntry {
    /// Entry identifier.
    pub id: HistoryId,
    /// Task the entry describes.
    pub task_id: TaskId,
    /// Board the task belongs to.
    pub board_id: BoardId,
    /// What triggered the transition.
    pub source: HistorySource,
    /// Status before the transition.
    pub old_status: Option<String>,
    /// Status after the transition.
    pub new_status: String,
    /// Column before the transition.
    pub old_column_id: Option<ColumnId>,
    /// Column after the transition.
    pub new_column_id: ColumnId,
    /// Position before the transition.
    pub old_position: Option<TaskPosition>,
    /// Position after the transition.
    pub new_position: TaskPosition,
    /// Acting user.
    pub changed_by: UserId,
    /// When the transition happened.
    pub changed_at: DateTime<Utc>,
}

impl TaskHistoryEntry {
    /// Records the creation of `task`.
    #[must_use]
    pub fn created(task: &Task, source: HistorySource) -> Self {
        Self {
            id: HistoryId::new(),
            task_id: task.id(),
            board_id: task.board_id(),
            source,
            old_status: None,
            new_status: task.status().to_owned(),
            old_column_id: None,
            new_column_id: task.column_id(),
            old_position: None,
            new_position: task.position(),
            changed_by: task.created_by(),
            changed_at: task.created_at(),
        }
    }

    /// Records the transition from `before` to `after`.
    #[must_use]
    pub fn transition(
        before: &Task,
        after: &Task,
        source: HistorySource,
        changed_by: UserId,
        changed_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: HistoryId::new(),
            task_id: after.id(),
            board_id: after.board_id(),
            source,
            old_status: Some(before.status().to_owned()),
            new_status: after.status().to_owned(),
            old_column_id: Some(before.column_id()),
            new_column_id: after.column_id(),
            old_position: Some(before.position()),
            new_position: after.position(),
            changed_by,
            changed_at,
        }
    }

    /// Returns `true` when the entry changed the task's column.
    #[must_use]
    pub fn changed_column(&self) -> bool {
        self.old_column_id
            .is_some_and(|column_id| column_id != self.new_column_id)
    }
}
