//! Task orchestration: creation, edits, moves, deletion and time tracking.

use super::{
    error::{KanbanServiceError, KanbanServiceResult, column_reference},
    notify::dispatch,
};
use crate::kanban::{
    domain::{
        BoardId, ColumnId, HistorySource, KanbanEvent, LoggedMinutes, Task, TaskDraft,
        TaskHistoryEntry, TaskId, TaskPatch, TaskPosition, TaskPriority, TaskTitle, TimeLogEntry,
        UserId, total_minutes,
    },
    ports::{
        KanbanNotifier, KanbanRepositoryError, RelocateTask, Relocation, TaskRepository,
        TimeLogRepository, UserDirectory, UserProfile,
    },
};
use chrono::NaiveDate;
use mockable::Clock;
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// Request payload for creating a task at the tail of a column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateTaskRequest {
    board_id: BoardId,
    column_id: ColumnId,
    title: String,
    created_by: UserId,
    description: Option<String>,
    priority: Option<String>,
    assignee: Option<UserId>,
    due_date: Option<NaiveDate>,
    source: HistorySource,
}

impl CreateTaskRequest {
    /// Creates a request with the required fields.
    #[must_use]
    pub fn new(
        board_id: BoardId,
        column_id: ColumnId,
        title: impl Into<String>,
        created_by: UserId,
    ) -> Self {
        Self {
            board_id,
            column_id,
            title: title.into(),
            created_by,
            description: None,
            priority: None,
            assignee: None,
            due_date: None,
            source: HistorySource::Manual,
        }
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Sets the priority label; unrecognised labels become `Medium`.
    #[must_use]
    pub fn with_priority(mut self, priority: impl Into<String>) -> Self {
        self.priority = Some(priority.into());
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

    /// Sets what triggered the creation.
    #[must_use]
    pub const fn with_source(mut self, source: HistorySource) -> Self {
        self.source = source;
        self
    }
}

/// Field changes for a task. Absent fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateTaskRequest {
    /// Replacement title.
    pub title: Option<String>,
    /// Replacement description; `Some(None)` clears it.
    pub description: Option<Option<String>>,
    /// Replacement priority label, normalised through the priority table.
    pub priority: Option<String>,
    /// Replacement assignee; `Some(None)` unassigns.
    pub assignee: Option<Option<UserId>>,
    /// Replacement due date; `Some(None)` clears it.
    pub due_date: Option<Option<NaiveDate>>,
}

impl UpdateTaskRequest {
    fn into_patch(self) -> KanbanServiceResult<TaskPatch> {
        Ok(TaskPatch {
            title: self.title.map(TaskTitle::new).transpose()?,
            description: self.description,
            priority: self.priority.as_deref().map(TaskPriority::normalize),
            assignee: self.assignee,
            due_date: self.due_date,
        })
    }
}

/// Request to move a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveTaskRequest {
    /// Destination column.
    pub target_column: ColumnId,
    /// Requested one-based position; clamped to the column tail.
    pub target_position: u32,
    /// Acting user.
    pub actor: UserId,
    /// What triggered the move.
    pub source: HistorySource,
}

impl MoveTaskRequest {
    /// Creates a manual move request.
    #[must_use]
    pub const fn new(target_column: ColumnId, target_position: u32, actor: UserId) -> Self {
        Self {
            target_column,
            target_position,
            actor,
            source: HistorySource::Manual,
        }
    }

    /// Sets what triggered the move.
    #[must_use]
    pub const fn with_source(mut self, source: HistorySource) -> Self {
        self.source = source;
        self
    }
}

/// A task joined with its assignee's profile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskDetails {
    /// The task.
    pub task: Task,
    /// Assignee profile; `None` when unassigned or unknown to the directory.
    pub assignee: Option<UserProfile>,
}

/// Task orchestration service.
#[derive(Clone)]
pub struct TaskService<R, D, N, C>
where
    R: TaskRepository + TimeLogRepository,
    D: UserDirectory,
    N: KanbanNotifier,
    C: Clock + Send + Sync,
{
    repository: Arc<R>,
    directory: Arc<D>,
    notifier: Arc<N>,
    clock: Arc<C>,
}

impl<R, D, N, C> TaskService<R, D, N, C>
where
    R: TaskRepository + TimeLogRepository,
    D: UserDirectory,
    N: KanbanNotifier,
    C: Clock + Send + Sync,
{
    /// Creates a new task service.
    #[must_use]
    pub const fn new(
        repository: Arc<R>,
        directory: Arc<D>,
        notifier: Arc<N>,
        clock: Arc<C>,
    ) -> Self {
        Self {
            repository,
            directory,
            notifier,
            clock,
        }
    }

    /// Creates a task at the tail of its column.
    ///
    /// # Errors
    ///
    /// Returns [`KanbanServiceError::Domain`] for a blank title and
    /// [`KanbanServiceError::InvalidColumnReference`] when the column does not
    /// exist or belongs to another board. Nothing is stored in either case.
    #[instrument(
        skip(self, request),
        fields(board_id = %request.board_id, column_id = %request.column_id)
    )]
    pub async fn create_task(&self, request: CreateTaskRequest) -> KanbanServiceResult<Task> {
        let title = TaskTitle::new(request.title)?;
        let mut draft = TaskDraft::new(
            request.board_id,
            request.column_id,
            title,
            request.created_by,
            &*self.clock,
        );
        if let Some(description) = request.description {
            draft = draft.with_description(description);
        }
        if let Some(priority) = request.priority {
            draft = draft.with_priority(TaskPriority::normalize(&priority));
        }
        if let Some(assignee) = request.assignee {
            draft = draft.with_assignee(assignee);
        }
        if let Some(due_date) = request.due_date {
            draft = draft.with_due_date(due_date);
        }

        let task = self
            .repository
            .insert(&draft, request.source)
            .await
            .map_err(column_reference)?;
        info!(
            task_id = %task.id(),
            code = %task.code(),
            position = %task.position(),
            "task created"
        );

        dispatch(&*self.notifier, KanbanEvent::TaskCreated { task: task.clone() }).await;
        Ok(task)
    }

    /// Returns a task.
    ///
    /// # Errors
    ///
    /// Returns [`KanbanServiceError::TaskNotFound`] when the task does not
    /// exist.
    pub async fn get_task(&self, task_id: TaskId) -> KanbanServiceResult<Task> {
        self.require_task(task_id).await
    }

    /// Returns a task joined with its assignee's profile.
    ///
    /// # Errors
    ///
    /// Returns [`KanbanServiceError::TaskNotFound`] when the task does not
    /// exist or [`KanbanServiceError::Directory`] when the lookup fails.
    pub async fn get_task_details(&self, task_id: TaskId) -> KanbanServiceResult<TaskDetails> {
        let task = self.require_task(task_id).await?;
        let assignee = match task.assignee() {
            Some(user_id) => self.directory.profile(user_id).await?,
            None => None,
        };
        Ok(TaskDetails { task, assignee })
    }

    /// Lists a board's tasks by column, then by position.
    ///
    /// # Errors
    ///
    /// Returns [`KanbanServiceError::Repository`] when persistence fails.
    pub async fn list_tasks(&self, board_id: BoardId) -> KanbanServiceResult<Vec<Task>> {
        Ok(self.repository.tasks_for_board(board_id).await?)
    }

    /// Lists a column's tasks by position.
    ///
    /// # Errors
    ///
    /// Returns [`KanbanServiceError::Repository`] when persistence fails.
    pub async fn list_column(&self, column_id: ColumnId) -> KanbanServiceResult<Vec<Task>> {
        Ok(self.repository.tasks_for_column(column_id).await?)
    }

    /// Applies field changes to a task.
    ///
    /// # Errors
    ///
    /// Returns [`KanbanServiceError::TaskNotFound`] when the task does not
    /// exist or [`KanbanServiceError::Domain`] for a blank title.
    #[instrument(skip(self, request))]
    pub async fn update_task(
        &self,
        task_id: TaskId,
        request: UpdateTaskRequest,
        actor: UserId,
    ) -> KanbanServiceResult<Task> {
        let patch = request.into_patch()?;
        let mut task = self.require_task(task_id).await?;
        if patch.is_empty() {
            return Ok(task);
        }
        task.apply_patch(patch, actor, &*self.clock);
        self.repository.update_task(&task).await?;
        debug!(task_id = %task_id, "task updated");

        dispatch(&*self.notifier, KanbanEvent::TaskUpdated { task: task.clone() }).await;
        Ok(task)
    }

    /// Moves a task to a column and position.
    ///
    /// A move onto the task's current slot changes nothing and publishes
    /// nothing.
    ///
    /// # Errors
    ///
    /// Returns [`KanbanServiceError::Domain`] for a zero position,
    /// [`KanbanServiceError::InvalidColumnReference`] for a missing or
    /// foreign column, or [`KanbanServiceError::Repository`] wrapping
    /// [`crate::kanban::domain::KanbanDomainError::TaskLocked`] for a locked
    /// task.
    #[instrument(skip(self, request), fields(
        target_column = %request.target_column,
        target_position = request.target_position,
    ))]
    pub async fn move_task(
        &self,
        task_id: TaskId,
        request: MoveTaskRequest,
    ) -> KanbanServiceResult<Relocation> {
        let target_position = TaskPosition::new(request.target_position)?;
        let relocation = self
            .repository
            .relocate(&RelocateTask {
                task_id,
                target_column: request.target_column,
                target_position,
                actor: request.actor,
                source: request.source,
                at: self.clock.utc(),
            })
            .await
            .map_err(|err| match err {
                KanbanRepositoryError::TaskNotFound(id) => {
                    KanbanServiceError::TaskNotFound(id)
                }
                other => column_reference(other),
            })?;

        if relocation.moved() {
            info!(
                task_id = %task_id,
                from_column = %relocation.from.column_id,
                from_position = %relocation.from.position,
                to_column = %relocation.task.column_id(),
                to_position = %relocation.task.position(),
                "task moved"
            );
            dispatch(
                &*self.notifier,
                KanbanEvent::TaskMoved {
                    task: relocation.task.clone(),
                    from: relocation.from,
                },
            )
            .await;
        }
        Ok(relocation)
    }

    /// Locks or unlocks a task. Locked tasks reject moves.
    ///
    /// # Errors
    ///
    /// Returns [`KanbanServiceError::TaskNotFound`] when the task does not
    /// exist.
    #[instrument(skip(self))]
    pub async fn set_locked(
        &self,
        task_id: TaskId,
        locked: bool,
        actor: UserId,
    ) -> KanbanServiceResult<Task> {
        let change = self
            .repository
            .set_locked(task_id, locked, actor, self.clock.utc())
            .await
            .map_err(|err| match err {
                KanbanRepositoryError::TaskNotFound(id) => KanbanServiceError::TaskNotFound(id),
                other => other.into(),
            })?;
        if !change.changed {
            return Ok(change.task);
        }
        debug!(task_id = %task_id, locked, "task lock changed");

        dispatch(
            &*self.notifier,
            KanbanEvent::TaskUpdated {
                task: change.task.clone(),
            },
        )
        .await;
        Ok(change.task)
    }

    /// Deletes a task with its history and time logs.
    ///
    /// Siblings keep their positions; use [`TaskService::compact_column`] to
    /// close the gap.
    ///
    /// # Errors
    ///
    /// Returns [`KanbanServiceError::TaskNotFound`] when the task does not
    /// exist.
    #[instrument(skip(self))]
    pub async fn delete_task(&self, task_id: TaskId) -> KanbanServiceResult<Task> {
        let task = self
            .repository
            .delete_task(task_id)
            .await
            .map_err(|err| match err {
                KanbanRepositoryError::TaskNotFound(id) => {
                    KanbanServiceError::TaskNotFound(id)
                }
                other => KanbanServiceError::Repository(other),
            })?;
        info!(task_id = %task_id, code = %task.code(), "task deleted");

        dispatch(
            &*self.notifier,
            KanbanEvent::TaskDeleted {
                board_id: task.board_id(),
                task_id,
                code: task.code(),
            },
        )
        .await;
        Ok(task)
    }

    /// Renumbers a column to `1..=n` and returns the tasks that moved.
    ///
    /// # Errors
    ///
    /// Returns [`KanbanServiceError::InvalidColumnReference`] when the column
    /// does not exist.
    #[instrument(skip(self))]
    pub async fn compact_column(
        &self,
        column_id: ColumnId,
        actor: UserId,
    ) -> KanbanServiceResult<Vec<Relocation>> {
        let relocations = self
            .repository
            .compact_column(column_id, actor, self.clock.utc())
            .await
            .map_err(column_reference)?;
        info!(column_id = %column_id, moved = relocations.len(), "column compacted");

        for relocation in &relocations {
            dispatch(
                &*self.notifier,
                KanbanEvent::TaskMoved {
                    task: relocation.task.clone(),
                    from: relocation.from,
                },
            )
            .await;
        }
        Ok(relocations)
    }

    /// Returns a task's history, oldest first.
    ///
    /// # Errors
    ///
    /// Returns [`KanbanServiceError::TaskNotFound`] when the task does not
    /// exist.
    pub async fn task_history(
        &self,
        task_id: TaskId,
    ) -> KanbanServiceResult<Vec<TaskHistoryEntry>> {
        self.require_task(task_id).await?;
        Ok(self.repository.history_for_task(task_id).await?)
    }

    /// Records time spent on a task.
    ///
    /// # Errors
    ///
    /// Returns [`KanbanServiceError::Domain`] for zero or oversized minutes, or
    /// [`KanbanServiceError::TaskNotFound`] when the task does not exist.
    pub async fn log_time(
        &self,
        task_id: TaskId,
        user_id: UserId,
        minutes: u32,
        note: Option<String>,
    ) -> KanbanServiceResult<TimeLogEntry> {
        let logged = LoggedMinutes::new(minutes)?;
        self.require_task(task_id).await?;
        let entry = TimeLogEntry::new(task_id, user_id, logged, note, &*self.clock);
        self.repository.record_time(&entry).await?;
        debug!(task_id = %task_id, minutes, "time logged");
        Ok(entry)
    }

    /// Lists the time logged against a task, oldest first.
    ///
    /// # Errors
    ///
    /// Returns [`KanbanServiceError::TaskNotFound`] when the task does not
    /// exist.
    pub async fn time_logs(&self, task_id: TaskId) -> KanbanServiceResult<Vec<TimeLogEntry>> {
        self.require_task(task_id).await?;
        Ok(self.repository.time_logs_for_task(task_id).await?)
    }

    /// Returns the total minutes logged against a task.
    ///
    /// # Errors
    ///
    /// Returns [`KanbanServiceError::TaskNotFound`] when the task does not
    /// exist.
    pub async fn total_logged_minutes(&self, task_id: TaskId) -> KanbanServiceResult<u64> {
        let entries = self.time_logs(task_id).await?;
        Ok(total_minutes(&entries))
    }

    async fn require_task(&self, task_id: TaskId) -> KanbanServiceResult<Task> {
        self.repository
            .find_task(task_id)
            .await?
            .ok_or(KanbanServiceError::TaskNotFound(task_id))
    }
}
