//! Position ledger: dense, column-scoped task ordering.
//!
//! Positions inside a column form the sequence `1..=n`. The ledger never
//! touches storage itself; it turns an insert, move or compaction into a
//! plan of range shifts that an adapter executes inside one transaction.
//!
//! A move is expressed as at most two [`PositionShift`]s:
//!
//! - across columns, the target column opens a hole at the requested
//!   position (`[target, ∞)` shifts up) and the source column closes the
//!   hole left behind (`(source, ∞)` shifts down);
//! - inside one column, only the tasks between the old and new slot move,
//!   one step towards the vacated position.
//!
//! Deleting a task leaves a hole. [`compaction`] renumbers a column back to
//! `1..=n` when a caller asks for it.

use super::{ColumnId, TaskId, TaskPosition};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// A column and position pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TaskSlot {
    /// Column holding the task.
    pub column_id: ColumnId,
    /// Position inside the column.
    pub position: TaskPosition,
}

impl TaskSlot {
    /// Creates a slot.
    #[must_use]
    pub const fn new(column_id: ColumnId, position: TaskPosition) -> Self {
        Self {
            column_id,
            position,
        }
    }
}

/// Direction of a range shift.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShiftDirection {
    /// Every covered position increases by one.
    Up,
    /// Every covered position decreases by one.
    Down,
}

impl ShiftDirection {
    /// Returns the signed step applied to covered positions.
    #[must_use]
    pub const fn delta(self) -> i32 {
        match self {
            Self::Up => 1,
            Self::Down => -1,
        }
    }
}

/// Shift of every task whose position lies in `lower..=upper` of a column.
///
/// An absent upper bound covers the rest of the column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PositionShift {
    column_id: ColumnId,
    lower: TaskPosition,
    upper: Option<TaskPosition>,
    direction: ShiftDirection,
}

impl PositionShift {
    /// Returns the column the shift applies to.
    #[must_use]
    pub const fn column_id(&self) -> ColumnId {
        self.column_id
    }

    /// Returns the inclusive lower bound.
    #[must_use]
    pub const fn lower(&self) -> TaskPosition {
        self.lower
    }

    /// Returns the inclusive upper bound, if the range is bounded.
    #[must_use]
    pub const fn upper(&self) -> Option<TaskPosition> {
        self.upper
    }

    /// Returns the shift direction.
    #[must_use]
    pub const fn direction(&self) -> ShiftDirection {
        self.direction
    }

    /// Returns `true` when the slot falls inside the shifted range.
    #[must_use]
    pub fn covers(&self, column_id: ColumnId, position: TaskPosition) -> bool {
        column_id == self.column_id
            && position >= self.lower
            && self.upper.is_none_or(|upper| position <= upper)
    }

    /// Returns the position after applying the shift to a covered slot.
    fn apply(&self, position: TaskPosition) -> TaskPosition {
        match self.direction {
            ShiftDirection::Up => position.next(),
            ShiftDirection::Down => position.previous().unwrap_or(TaskPosition::FIRST),
        }
    }
}

/// Plan relocating one task and shifting its neighbours.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MovePlan {
    origin: TaskSlot,
    destination: TaskSlot,
    shifts: Vec<PositionShift>,
}

impl MovePlan {
    /// Plans moving the task at `origin` to `requested` in `target_column`.
    ///
    /// `target_max` is the highest position currently used in the target
    /// column (including the moving task when the move stays in its column).
    /// Requests past the tail are clamped to the tail so the column stays
    /// dense: `max + 1` for a foreign column, `max` for the task's own.
    #[must_use]
    pub fn new(
        origin: TaskSlot,
        target_column: ColumnId,
        requested: TaskPosition,
        target_max: Option<TaskPosition>,
    ) -> Self {
        if origin.column_id == target_column {
            let tail = target_max.map_or(origin.position, |max| max.max(origin.position));
            let destination = TaskSlot::new(target_column, requested.min(tail));
            return Self::within_column(origin, destination);
        }

        let tail = target_max.map_or(TaskPosition::FIRST, TaskPosition::next);
        let destination = TaskSlot::new(target_column, requested.min(tail));
        let shifts = vec![
            PositionShift {
                column_id: destination.column_id,
                lower: destination.position,
                upper: None,
                direction: ShiftDirection::Up,
            },
            PositionShift {
                column_id: origin.column_id,
                lower: origin.position.next(),
                upper: None,
                direction: ShiftDirection::Down,
            },
        ];
        Self {
            origin,
            destination,
            shifts,
        }
    }

    fn within_column(origin: TaskSlot, destination: TaskSlot) -> Self {
        let shift = match destination.position.cmp(&origin.position) {
            Ordering::Greater => Some(PositionShift {
                column_id: origin.column_id,
                lower: origin.position.next(),
                upper: Some(destination.position),
                direction: ShiftDirection::Down,
            }),
            Ordering::Less => origin.position.previous().map(|upper| PositionShift {
                column_id: origin.column_id,
                lower: destination.position,
                upper: Some(upper),
                direction: ShiftDirection::Up,
            }),
            Ordering::Equal => None,
        };
        Self {
            origin,
            destination,
            shifts: shift.into_iter().collect(),
        }
    }

    /// Returns where the task currently sits.
    #[must_use]
    pub const fn origin(&self) -> TaskSlot {
        self.origin
    }

    /// Returns where the task lands.
    #[must_use]
    pub const fn destination(&self) -> TaskSlot {
        self.destination
    }

    /// Returns the neighbour shifts in execution order.
    #[must_use]
    pub fn shifts(&self) -> &[PositionShift] {
        &self.shifts
    }

    /// Returns `true` when the task stays where it is.
    #[must_use]
    pub fn is_noop(&self) -> bool {
        self.origin == self.destination
    }

    /// Returns the position a neighbour ends up at once the plan is applied.
    ///
    /// Shifts are evaluated against the position before the move; no slot is
    /// covered by more than one shift.
    #[must_use]
    pub fn shifted_position(&self, column_id: ColumnId, position: TaskPosition) -> TaskPosition {
        self.shifts
            .iter()
            .find(|shift| shift.covers(column_id, position))
            .map_or(position, |shift| shift.apply(position))
    }
}

/// Returns the position a new task takes at the tail of a column.
///
/// `1` for an empty column, otherwise one past the highest position.
#[must_use]
pub fn tail_position(existing: impl IntoIterator<Item = TaskPosition>) -> TaskPosition {
    existing
        .into_iter()
        .max()
        .map_or(TaskPosition::FIRST, TaskPosition::next)
}

/// Renumbers a column to `1..=n`, preserving relative order.
///
/// Returns only the tasks whose position changes, paired with their new
/// position.
#[must_use]
pub fn compaction(
    existing: impl IntoIterator<Item = (TaskId, TaskPosition)>,
) -> Vec<(TaskId, TaskPosition)> {
    let mut ordered: Vec<(TaskId, TaskPosition)> = existing.into_iter().collect();
    ordered.sort_by_key(|(_, position)| *position);
    let mut next = TaskPosition::FIRST;
    let mut changes = Vec::new();
    for (task_id, current) in ordered {
        if current != next {
            changes.push((task_id, next));
        }
        next = next.next();
    }
    changes
}
