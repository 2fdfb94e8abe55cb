//! In-memory Kanban store for tests and single-process deployments.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::kanban::{
    domain::{
        Board, BoardId, BoardMember, Column, ColumnId, HistorySource, KanbanDomainError, MovePlan,
        Task, TaskCode, TaskDraft, TaskHistoryEntry, TaskId, TaskPosition, TimeLogEntry, UserId,
        ledger, plan_column_order,
    },
    ports::{
        BoardRepository, KanbanRepositoryError, KanbanRepositoryResult, LockChange, RelocateTask,
        Relocation, TaskRepository, TimeLogRepository,
    },
};

/// Thread-safe in-memory implementation of every Kanban repository port.
///
/// All state sits behind a single lock; each write method holds the write
/// guard for its whole duration, which makes it atomic and serialises moves.
#[derive(Debug, Clone, Default)]
pub struct InMemoryKanbanStore {
    state: Arc<RwLock<KanbanState>>,
}

#[derive(Debug, Default)]
struct KanbanState {
    boards: HashMap<BoardId, Board>,
    columns: HashMap<ColumnId, Column>,
    members: Vec<BoardMember>,
    tasks: HashMap<TaskId, Task>,
    history: Vec<TaskHistoryEntry>,
    time_logs: Vec<TimeLogEntry>,
    last_task_code: u64,
}

impl InMemoryKanbanStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> KanbanRepositoryResult<RwLockReadGuard<'_, KanbanState>> {
        self.state.read().map_err(|err| {
            KanbanRepositoryError::persistence(std::io::Error::other(err.to_string()))
        })
    }

    fn write(&self) -> KanbanRepositoryResult<RwLockWriteGuard<'_, KanbanState>> {
        self.state.write().map_err(|err| {
            KanbanRepositoryError::persistence(std::io::Error::other(err.to_string()))
        })
    }
}

impl KanbanState {
    fn column(&self, id: ColumnId) -> KanbanRepositoryResult<&Column> {
        self.columns
            .get(&id)
            .ok_or(KanbanRepositoryError::ColumnNotFound(id))
    }

    fn board_columns(&self, board_id: BoardId) -> Vec<Column> {
        let mut columns: Vec<Column> = self
            .columns
            .values()
            .filter(|column| column.board_id() == board_id)
            .cloned()
            .collect();
        columns.sort_by_key(Column::position);
        columns
    }

    fn column_tasks(&self, column_id: ColumnId) -> Vec<Task> {
        let mut tasks: Vec<Task> = self
            .tasks
            .values()
            .filter(|task| task.column_id() == column_id)
            .cloned()
            .collect();
        tasks.sort_by_key(Task::position);
        tasks
    }

    fn max_position(&self, column_id: ColumnId) -> Option<TaskPosition> {
        self.tasks
            .values()
            .filter(|task| task.column_id() == column_id)
            .map(Task::position)
            .max()
    }

    fn next_task_code(&mut self) -> KanbanRepositoryResult<TaskCode> {
        let sequence = self.last_task_code.saturating_add(1);
        let code = TaskCode::from_sequence(sequence)?;
        self.last_task_code = sequence;
        Ok(code)
    }
}

#[async_trait]
impl BoardRepository for InMemoryKanbanStore {
    async fn create_board(
        &self,
        board: &Board,
        columns: &[Column],
        creator: &BoardMember,
    ) -> KanbanRepositoryResult<()> {
        let mut state = self.write()?;
        if state.boards.contains_key(&board.id()) {
            return Err(KanbanRepositoryError::DuplicateBoard(board.id()));
        }
        state.boards.insert(board.id(), board.clone());
        for column in columns {
            state.columns.insert(column.id(), column.clone());
        }
        state.members.push(creator.clone());
        Ok(())
    }

    async fn find_board(&self, id: BoardId) -> KanbanRepositoryResult<Option<Board>> {
        Ok(self.read()?.boards.get(&id).cloned())
    }

    async fn list_boards(&self, include_inactive: bool) -> KanbanRepositoryResult<Vec<Board>> {
        let state = self.read()?;
        let mut boards: Vec<Board> = state
            .boards
            .values()
            .filter(|board| include_inactive || board.is_active())
            .cloned()
            .collect();
        boards.sort_by_key(Board::created_at);
        Ok(boards)
    }

    async fn update_board(&self, board: &Board) -> KanbanRepositoryResult<()> {
        let mut state = self.write()?;
        let stored = state
            .boards
            .get_mut(&board.id())
            .ok_or(KanbanRepositoryError::BoardNotFound(board.id()))?;
        *stored = board.clone();
        Ok(())
    }

    async fn columns(&self, board_id: BoardId) -> KanbanRepositoryResult<Vec<Column>> {
        Ok(self.read()?.board_columns(board_id))
    }

    async fn find_column(&self, id: ColumnId) -> KanbanRepositoryResult<Option<Column>> {
        Ok(self.read()?.columns.get(&id).cloned())
    }

    async fn reorder_columns(
        &self,
        board_id: BoardId,
        order: &[ColumnId],
    ) -> KanbanRepositoryResult<Vec<Column>> {
        let mut state = self.write()?;
        if !state.boards.contains_key(&board_id) {
            return Err(KanbanRepositoryError::BoardNotFound(board_id));
        }
        let current = state.board_columns(board_id);
        for (column_id, position) in plan_column_order(board_id, &current, order)? {
            if let Some(column) = state.columns.get_mut(&column_id) {
                column.set_position(position);
            }
        }
        Ok(state.board_columns(board_id))
    }

    async fn add_member(&self, member: &BoardMember) -> KanbanRepositoryResult<()> {
        let mut state = self.write()?;
        if !state.boards.contains_key(&member.board_id()) {
            return Err(KanbanRepositoryError::BoardNotFound(member.board_id()));
        }
        let exists = state.members.iter().any(|existing| {
            existing.board_id() == member.board_id() && existing.user_id() == member.user_id()
        });
        if exists {
            return Err(KanbanRepositoryError::DuplicateMember {
                board_id: member.board_id(),
                user_id: member.user_id(),
            });
        }
        state.members.push(member.clone());
        Ok(())
    }

    async fn update_member(&self, member: &BoardMember) -> KanbanRepositoryResult<()> {
        let mut state = self.write()?;
        let stored = state
            .members
            .iter_mut()
            .find(|existing| {
                existing.board_id() == member.board_id() && existing.user_id() == member.user_id()
            })
            .ok_or(KanbanRepositoryError::MemberNotFound {
                board_id: member.board_id(),
                user_id: member.user_id(),
            })?;
        *stored = member.clone();
        Ok(())
    }

    async fn remove_member(
        &self,
        board_id: BoardId,
        user_id: UserId,
    ) -> KanbanRepositoryResult<()> {
        let mut state = self.write()?;
        let before = state.members.len();
        state
            .members
            .retain(|member| !(member.board_id() == board_id && member.user_id() == user_id));
        if state.members.len() == before {
            return Err(KanbanRepositoryError::MemberNotFound { board_id, user_id });
        }
        Ok(())
    }

    async fn members(&self, board_id: BoardId) -> KanbanRepositoryResult<Vec<BoardMember>> {
        let state = self.read()?;
        let mut members: Vec<BoardMember> = state
            .members
            .iter()
            .filter(|member| member.board_id() == board_id)
            .cloned()
            .collect();
        members.sort_by_key(BoardMember::joined_at);
        Ok(members)
    }

    async fn find_member(
        &self,
        board_id: BoardId,
        user_id: UserId,
    ) -> KanbanRepositoryResult<Option<BoardMember>> {
        let state = self.read()?;
        Ok(state
            .members
            .iter()
            .find(|member| member.board_id() == board_id && member.user_id() == user_id)
            .cloned())
    }
}

#[async_trait]
impl TaskRepository for InMemoryKanbanStore {
    async fn insert(
        &self,
        draft: &TaskDraft,
        source: HistorySource,
    ) -> KanbanRepositoryResult<Task> {
        let mut state = self.write()?;
        if state.tasks.contains_key(&draft.id()) {
            return Err(KanbanRepositoryError::DuplicateTask(draft.id()));
        }
        let column = state.column(draft.column_id())?.clone();
        if column.board_id() != draft.board_id() {
            return Err(KanbanDomainError::ColumnNotOnBoard {
                column_id: column.id(),
                board_id: draft.board_id(),
            }
            .into());
        }

        let position = ledger::tail_position(state.max_position(column.id()));
        let code = state.next_task_code()?;
        let task = Task::from_draft(draft.clone(), &column, code, position)?;
        state
            .history
            .push(TaskHistoryEntry::created(&task, source));
        state.tasks.insert(task.id(), task.clone());
        Ok(task)
    }

    async fn find_task(&self, id: TaskId) -> KanbanRepositoryResult<Option<Task>> {
        Ok(self.read()?.tasks.get(&id).cloned())
    }

    async fn tasks_for_board(&self, board_id: BoardId) -> KanbanRepositoryResult<Vec<Task>> {
        let state = self.read()?;
        Ok(state
            .board_columns(board_id)
            .iter()
            .flat_map(|column| state.column_tasks(column.id()))
            .collect())
    }

    async fn tasks_for_column(&self, column_id: ColumnId) -> KanbanRepositoryResult<Vec<Task>> {
        Ok(self.read()?.column_tasks(column_id))
    }

    async fn update_task(&self, task: &Task) -> KanbanRepositoryResult<()> {
        let mut state = self.write()?;
        let stored = state
            .tasks
            .get_mut(&task.id())
            .ok_or(KanbanRepositoryError::TaskNotFound(task.id()))?;
        // Ordering fields and the lock flag have their own writers.
        let mut updated = task.clone();
        updated.adopt_slot(stored);
        *stored = updated;
        Ok(())
    }

    async fn set_locked(
        &self,
        id: TaskId,
        locked: bool,
        actor: UserId,
        at: DateTime<Utc>,
    ) -> KanbanRepositoryResult<LockChange> {
        let mut state = self.write()?;
        let stored = state
            .tasks
            .get_mut(&id)
            .ok_or(KanbanRepositoryError::TaskNotFound(id))?;
        let changed = stored.set_lock(locked, actor, at);
        Ok(LockChange {
            task: stored.clone(),
            changed,
        })
    }

    async fn relocate(&self, request: &RelocateTask) -> KanbanRepositoryResult<Relocation> {
        let mut state = self.write()?;
        let before = state
            .tasks
            .get(&request.task_id)
            .cloned()
            .ok_or(KanbanRepositoryError::TaskNotFound(request.task_id))?;
        before.ensure_movable()?;
        let target = state.column(request.target_column)?.clone();

        let plan = MovePlan::new(
            before.slot(),
            target.id(),
            request.target_position,
            state.max_position(target.id()),
        );
        if plan.is_noop() {
            return Ok(Relocation {
                from: before.slot(),
                task: before,
                history: None,
            });
        }

        let mut after = before.clone();
        after.place(
            &target,
            plan.destination().position,
            request.actor,
            request.at,
        )?;
        for task in state.tasks.values_mut() {
            if task.id() == before.id() {
                continue;
            }
            let shifted = plan.shifted_position(task.column_id(), task.position());
            if shifted != task.position() {
                task.shift_to(shifted);
            }
        }

        let entry = TaskHistoryEntry::transition(
            &before,
            &after,
            request.source,
            request.actor,
            request.at,
        );
        state.history.push(entry.clone());
        state.tasks.insert(after.id(), after.clone());
        Ok(Relocation {
            task: after,
            from: before.slot(),
            history: Some(entry),
        })
    }

    async fn delete_task(&self, id: TaskId) -> KanbanRepositoryResult<Task> {
        let mut state = self.write()?;
        let removed = state
            .tasks
            .remove(&id)
            .ok_or(KanbanRepositoryError::TaskNotFound(id))?;
        state.history.retain(|entry| entry.task_id != id);
        state.time_logs.retain(|entry| entry.task_id != id);
        Ok(removed)
    }

    async fn compact_column(
        &self,
        column_id: ColumnId,
        actor: UserId,
        at: DateTime<Utc>,
    ) -> KanbanRepositoryResult<Vec<Relocation>> {
        let mut state = self.write()?;
        let column = state.column(column_id)?.clone();
        let changes = ledger::compaction(
            state
                .column_tasks(column_id)
                .iter()
                .map(|task| (task.id(), task.position())),
        );

        let mut relocations = Vec::with_capacity(changes.len());
        for (task_id, position) in changes {
            let Some(before) = state.tasks.get(&task_id).cloned() else {
                continue;
            };
            let mut after = before.clone();
            after.place(&column, position, actor, at)?;
            let entry =
                TaskHistoryEntry::transition(&before, &after, HistorySource::System, actor, at);
            state.history.push(entry.clone());
            state.tasks.insert(task_id, after.clone());
            relocations.push(Relocation {
                task: after,
                from: before.slot(),
                history: Some(entry),
            });
        }
        Ok(relocations)
    }

    async fn history_for_task(
        &self,
        id: TaskId,
    ) -> KanbanRepositoryResult<Vec<TaskHistoryEntry>> {
        let state = self.read()?;
        Ok(state
            .history
            .iter()
            .filter(|entry| entry.task_id == id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl TimeLogRepository for InMemoryKanbanStore {
    async fn record_time(&self, entry: &TimeLogEntry) -> KanbanRepositoryResult<()> {
        let mut state = self.write()?;
        if !state.tasks.contains_key(&entry.task_id) {
            return Err(KanbanRepositoryError::TaskNotFound(entry.task_id));
        }
        state.time_logs.push(entry.clone());
        Ok(())
    }

    async fn time_logs_for_task(&self, id: TaskId) -> KanbanRepositoryResult<Vec<TimeLogEntry>> {
        let state = self.read()?;
        Ok(state
            .time_logs
            .iter()
            .filter(|entry| entry.task_id == id)
            .cloned()
            .collect())
    }
}
