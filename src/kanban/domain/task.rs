//! Task aggregate root, creation drafts and field patches.

use super::{
    BoardId, Column, ColumnId, KanbanDomainError, TaskCode, TaskId, TaskPosition, TaskPriority,
    UserId, ledger::TaskSlot,
};
use chrono::{DateTime, NaiveDate, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Validated, trimmed task title.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskTitle(String);

impl TaskTitle {
    /// Creates a validated task title.
    ///
    /// # Errors
    ///
    /// Returns [`KanbanDomainError::EmptyTaskTitle`] when the value is blank.
    pub fn new(value: impl Into<String>) -> Result<Self, KanbanDomainError> {
        let raw = value.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(KanbanDomainError::EmptyTaskTitle);
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the title as `str`.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TaskTitle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A task that has been validated but not yet placed on a board.
///
/// The repository assigns the tail position, the task code and the status
/// label when it persists the draft.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskDraft {
    id: TaskId,
    board_id: BoardId,
    column_id: ColumnId,
    title: TaskTitle,
    description: Option<String>,
    priority: TaskPriority,
    assignee: Option<UserId>,
    due_date: Option<NaiveDate>,
    created_by: UserId,
    created_at: DateTime<Utc>,
}

impl TaskDraft {
    /// Creates a draft targeting the tail of `column_id`.
    #[must_use]
    pub fn new(
        board_id: BoardId,
        column_id: ColumnId,
        title: TaskTitle,
        created_by: UserId,
        clock: &impl Clock,
    ) -> Self {
        Self {
            id: TaskId::new(),
            board_id,
            column_id,
            title,
            description: None,
            priority: TaskPriority::default(),
            assignee: None,
            due_date: None,
            created_by,
            created_at: clock.utc(),
        }
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = normalize_text(Some(description.into()));
        self
    }

    /// Sets the priority.
    #[must_use]
    pub const fn with_priority(mut self, priority: TaskPriority) -> Self {
        self.priority = priority;
        self
    }

    /// Sets the assignee.
    #[must_use]
    pub const fn with_assignee(mut self, assignee: UserId) -> Self {
        self.assignee = Some(assignee);
        self
    }

    /// Sets the due date.
    #[must_use]
    pub const fn with_due_date(mut self, due_date: NaiveDate) -> Self {
        self.due_date = Some(due_date);
        self
    }

    /// Returns the identifier the task will be stored under.
    #[must_use]
    pub const fn id(&self) -> TaskId {
        self.id
    }

    /// Returns the target board.
    #[must_use]
    pub const fn board_id(&self) -> BoardId {
        self.board_id
    }

    /// Returns the target column.
    #[must_use]
    pub const fn column_id(&self) -> ColumnId {
        self.column_id
    }

    /// Returns the creating user.
    #[must_use]
    pub const fn created_by(&self) -> UserId {
        self.created_by
    }

    /// Returns the draft timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

/// Task aggregate root.
///
/// `status` is stored, not derived: it is always rewritten from the status
/// label of the column the task lands in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    id: TaskId,
    board_id: BoardId,
    column_id: ColumnId,
    code: TaskCode,
    title: TaskTitle,
    description: Option<String>,
    status: String,
    priority: TaskPriority,
    position: TaskPosition,
    assignee: Option<UserId>,
    due_date: Option<NaiveDate>,
    is_locked: bool,
    created_by: UserId,
    updated_by: UserId,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Parameter object for reconstructing a persisted task aggregate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedTaskData {
    /// Persisted task identifier.
    pub id: TaskId,
    /// Owning board.
    pub board_id: BoardId,
    /// Current column.
    pub column_id: ColumnId,
    /// Human-readable code.
    pub code: TaskCode,
    /// Title.
    pub title: TaskTitle,
    /// Description, if any.
    pub description: Option<String>,
    /// Status label copied from the column.
    pub status: String,
    /// Priority.
    pub priority: TaskPriority,
    /// Column-scoped position.
    pub position: TaskPosition,
    /// Assignee, if any.
    pub assignee: Option<UserId>,
    /// Due date, if any.
    pub due_date: Option<NaiveDate>,
    /// Whether moves are currently rejected.
    pub is_locked: bool,
    /// Creating user.
    pub created_by: UserId,
    /// Last user to change the task.
    pub updated_by: UserId,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Field changes applied by a task update. `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskPatch {
    /// Replacement title.
    pub title: Option<TaskTitle>,
    /// Replacement description; `Some(None)` clears it.
    pub description: Option<Option<String>>,
    /// Replacement priority.
    pub priority: Option<TaskPriority>,
    /// Replacement assignee; `Some(None)` unassigns.
    pub assignee: Option<Option<UserId>>,
    /// Replacement due date; `Some(None)` clears it.
    pub due_date: Option<Option<NaiveDate>>,
}

impl TaskPatch {
    /// Returns `true` when the patch changes nothing.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.priority.is_none()
            && self.assignee.is_none()
            && self.due_date.is_none()
    }
}

impl Task {
    /// Materialises a draft at `position` in `column` under `code`.
    ///
    /// # Errors
    ///
    /// Returns [`KanbanDomainError::ColumnNotOnBoard`] when the column is not
    /// the draft's target or belongs to another board.
    pub fn from_draft(
        draft: TaskDraft,
        column: &Column,
        code: TaskCode,
        position: TaskPosition,
    ) -> Result<Self, KanbanDomainError> {
        if column.id() != draft.column_id || column.board_id() != draft.board_id {
            return Err(KanbanDomainError::ColumnNotOnBoard {
                column_id: draft.column_id,
                board_id: draft.board_id,
            });
        }
        Ok(Self {
            id: draft.id,
            board_id: draft.board_id,
            column_id: draft.column_id,
            code,
            title: draft.title,
            description: draft.description,
            status: column.status_label().to_owned(),
            priority: draft.priority,
            position,
            assignee: draft.assignee,
            due_date: draft.due_date,
            is_locked: false,
            created_by: draft.created_by,
            updated_by: draft.created_by,
            created_at: draft.created_at,
            updated_at: draft.created_at,
        })
    }

    /// Reconstructs a task from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedTaskData) -> Self {
        Self {
            id: data.id,
            board_id: data.board_id,
            column_id: data.column_id,
            code: data.code,
            title: data.title,
            description: data.description,
            status: data.status,
            priority: data.priority,
            position: data.position,
            assignee: data.assignee,
            due_date: data.due_date,
            is_locked: data.is_locked,
            created_by: data.created_by,
            updated_by: data.updated_by,
            created_at: data.created_at,
            updated_at: data.updated_at,
        }
    }

    /// Returns the task identifier.
    #[must_use]
    pub const fn id(&self) -> TaskId {
        self.id
    }

    /// Returns the owning board.
    #[must_use]
    pub const fn board_id(&self) -> BoardId {
        self.board_id
    }

    /// Returns the current column.
    #[must_use]
    pub const fn column_id(&self) -> ColumnId {
        self.column_id
    }

    /// Returns the task code.
    #[must_use]
    pub const fn code(&self) -> TaskCode {
        self.code
    }

    /// Returns the title.
    #[must_use]
    pub const fn title(&self) -> &TaskTitle {
        &self.title
    }

    /// Returns the description, if any.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Returns the status label mirrored from the column.
    #[must_use]
    pub fn status(&self) -> &str {
        &self.status
    }

    /// Returns the priority.
    #[must_use]
    pub const fn priority(&self) -> TaskPriority {
        self.priority
    }

    /// Returns the column-scoped position.
    #[must_use]
    pub const fn position(&self) -> TaskPosition {
        self.position
    }

    /// Returns the column and position the task occupies.
    #[must_use]
    pub const fn slot(&self) -> TaskSlot {
        TaskSlot::new(self.column_id, self.position)
    }

    /// Returns the assignee, if any.
    #[must_use]
    pub const fn assignee(&self) -> Option<UserId> {
        self.assignee
    }

    /// Returns the due date, if any.
    #[must_use]
    pub const fn due_date(&self) -> Option<NaiveDate> {
        self.due_date
    }

    /// Returns whether moves are rejected.
    #[must_use]
    pub const fn is_locked(&self) -> bool {
        self.is_locked
    }

    /// Returns the creating user.
    #[must_use]
    pub const fn created_by(&self) -> UserId {
        self.created_by
    }

    /// Returns the last user to change the task.
    #[must_use]
    pub const fn updated_by(&self) -> UserId {
        self.updated_by
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the last update timestamp.
    #[must_use]
    pub const fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Applies a field patch. Ordering fields are never touched here.
    pub fn apply_patch(&mut self, patch: TaskPatch, actor: UserId, clock: &impl Clock) {
        let TaskPatch {
            title,
            description,
            priority,
            assignee,
            due_date,
        } = patch;
        if let Some(new_title) = title {
            self.title = new_title;
        }
        if let Some(new_description) = description {
            self.description = normalize_text(new_description);
        }
        if let Some(new_priority) = priority {
            self.priority = new_priority;
        }
        if let Some(new_assignee) = assignee {
            self.assignee = new_assignee;
        }
        if let Some(new_due_date) = due_date {
            self.due_date = new_due_date;
        }
        self.touch(actor, clock.utc());
    }

    /// Rejects moves until [`Task::unlock`] is called.
    pub fn lock(&mut self, actor: UserId, clock: &impl Clock) {
        self.set_lock(true, actor, clock.utc());
    }

    /// Allows moves again.
    pub fn unlock(&mut self, actor: UserId, clock: &impl Clock) {
        self.set_lock(false, actor, clock.utc());
    }

    /// Writes the lock flag, returning `false` when it already had that value.
    ///
    /// An unchanged flag leaves authorship and timestamps alone.
    pub(crate) fn set_lock(&mut self, locked: bool, actor: UserId, at: DateTime<Utc>) -> bool {
        if self.is_locked == locked {
            return false;
        }
        self.is_locked = locked;
        self.touch(actor, at);
        true
    }

    /// Checks that the task may be moved.
    ///
    /// # Errors
    ///
    /// Returns [`KanbanDomainError::TaskLocked`] when the task is locked.
    pub const fn ensure_movable(&self) -> Result<(), KanbanDomainError> {
        if self.is_locked {
            return Err(KanbanDomainError::TaskLocked(self.id));
        }
        Ok(())
    }

    /// Lands the task in `column` at `position`, copying the column status.
    ///
    /// # Errors
    ///
    /// Returns [`KanbanDomainError::ColumnNotOnBoard`] when the column belongs
    /// to another board.
    pub fn place(
        &mut self,
        column: &Column,
        position: TaskPosition,
        actor: UserId,
        at: DateTime<Utc>,
    ) -> Result<(), KanbanDomainError> {
        if column.board_id() != self.board_id {
            return Err(KanbanDomainError::ColumnNotOnBoard {
                column_id: column.id(),
                board_id: self.board_id,
            });
        }
        column.status_label().clone_into(&mut self.status);
        self.column_id = column.id();
        self.position = position;
        self.touch(actor, at);
        Ok(())
    }

    /// Rewrites the position as a side effect of a sibling move.
    ///
    /// Authorship and timestamps are left untouched.
    pub(crate) const fn shift_to(&mut self, position: TaskPosition) {
        self.position = position;
    }

    /// Takes column, status, position and the lock flag from the stored copy
    /// of the task.
    pub(crate) fn adopt_slot(&mut self, stored: &Self) {
        self.column_id = stored.column_id;
        stored.status.clone_into(&mut self.status);
        self.position = stored.position;
        self.is_locked = stored.is_locked;
    }

    fn touch(&mut self, actor: UserId, at: DateTime<Utc>) {
        self.updated_by = actor;
        self.updated_at = at;
    }
}

fn normalize_text(text: Option<String>) -> Option<String> {
    text.map(|value| value.trim().to_owned())
        .filter(|value| !value.is_empty())
}
