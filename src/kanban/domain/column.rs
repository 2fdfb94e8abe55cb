//! Board columns, the default column layout and column reordering.

use super::{BoardId, ColumnId, ColumnPosition, KanbanDomainError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Static description of a seeded column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnTemplate {
    /// Display name.
    pub name: &'static str,
    /// Status label mirrored onto tasks in the column.
    pub status: &'static str,
    /// Display color.
    pub color: &'static str,
}

/// Columns seeded on every new board, in display order.
pub const DEFAULT_COLUMN_LAYOUT: [ColumnTemplate; 5] = [
    ColumnTemplate {
        name: "To Do",
        status: "Open",
        color: "#6B7280",
    },
    ColumnTemplate {
        name: "In Progress",
        status: "In Progress",
        color: "#3B82F6",
    },
    ColumnTemplate {
        name: "Review",
        status: "Review",
        color: "#F59E0B",
    },
    ColumnTemplate {
        name: "Testing",
        status: "Testing",
        color: "#8B5CF6",
    },
    ColumnTemplate {
        name: "Done",
        status: "Done",
        color: "#10B981",
    },
];

/// A lane on a board. Tasks in the column carry its status label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    id: ColumnId,
    board_id: BoardId,
    name: String,
    status_label: String,
    position: ColumnPosition,
    color: String,
    created_at: DateTime<Utc>,
}

/// Parameter object for reconstructing a persisted column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedColumnData {
    /// Persisted column identifier.
    pub id: ColumnId,
    /// Owning board.
    pub board_id: BoardId,
    /// Display name.
    pub name: String,
    /// Status label mirrored onto tasks.
    pub status_label: String,
    /// Board-scoped display position.
    pub position: ColumnPosition,
    /// Display color.
    pub color: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl Column {
    /// Builds the default columns for a freshly created board.
    #[must_use]
    pub fn default_layout(board_id: BoardId, created_at: DateTime<Utc>) -> Vec<Self> {
        DEFAULT_COLUMN_LAYOUT
            .iter()
            .zip(0_u32..)
            .map(|(template, position)| Self {
                id: ColumnId::new(),
                board_id,
                name: template.name.to_owned(),
                status_label: template.status.to_owned(),
                position: ColumnPosition::new(position),
                color: template.color.to_owned(),
                created_at,
            })
            .collect()
    }

    /// Reconstructs a column from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedColumnData) -> Self {
        Self {
            id: data.id,
            board_id: data.board_id,
            name: data.name,
            status_label: data.status_label,
            position: data.position,
            color: data.color,
            created_at: data.created_at,
        }
    }

    /// Returns the column identifier.
    #[must_use]
    pub const fn id(&self) -> ColumnId {
        self.id
    }

    /// Returns the owning board.
    #[must_use]
    pub const fn board_id(&self) -> BoardId {
        self.board_id
    }

    /// Returns the display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the status label tasks in this column carry.
    #[must_use]
    pub fn status_label(&self) -> &str {
        &self.status_label
    }

    /// Returns the display position.
    #[must_use]
    pub const fn position(&self) -> ColumnPosition {
        self.position
    }

    /// Returns the display color.
    #[must_use]
    pub fn color(&self) -> &str {
        &self.color
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Moves the column to a new display position.
    pub const fn set_position(&mut self, position: ColumnPosition) {
        self.position = position;
    }
}

/// Validates a full column reorder and assigns positions `0..n`.
///
/// `requested` must name every column of the board exactly once.
///
/// # Errors
///
/// Returns [`KanbanDomainError::ColumnOrderLengthMismatch`] when the lengths
/// differ, [`KanbanDomainError::DuplicateColumnInOrder`] when an identifier
/// repeats, or [`KanbanDomainError::ColumnNotOnBoard`] when an identifier does
/// not belong to the board.
pub fn plan_column_order(
    board_id: BoardId,
    current: &[Column],
    requested: &[ColumnId],
) -> Result<Vec<(ColumnId, ColumnPosition)>, KanbanDomainError> {
    if current.len() != requested.len() {
        return Err(KanbanDomainError::ColumnOrderLengthMismatch {
            expected: current.len(),
            actual: requested.len(),
        });
    }

    let known: HashSet<ColumnId> = current.iter().map(Column::id).collect();
    let mut seen = HashSet::with_capacity(requested.len());
    for column_id in requested {
        if !known.contains(column_id) {
            return Err(KanbanDomainError::ColumnNotOnBoard {
                column_id: *column_id,
                board_id,
            });
        }
        if !seen.insert(*column_id) {
            return Err(KanbanDomainError::DuplicateColumnInOrder(*column_id));
        }
    }

    Ok(requested
        .iter()
        .zip(0_u32..)
        .map(|(column_id, position)| (*column_id, ColumnPosition::new(position)))
        .collect())
}
