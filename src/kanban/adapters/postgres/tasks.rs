//! `PostgreSQL` task, ledger and time log persistence.

use super::{
    models::{
        HistoryRow, SequenceValue, TaskRow, TimeLogRow, history_to_row, position_from_sql,
        position_to_sql, row_to_history, row_to_task, row_to_time_log, task_to_row,
        time_log_to_row,
    },
    repository::{PostgresKanbanStore, is_foreign_key_violation, is_unique_violation, lock_columns},
    schema::{kanban_columns, kanban_task_history, kanban_tasks, kanban_time_logs},
};
use crate::kanban::{
    domain::{
        BoardId, ColumnId, HistorySource, KanbanDomainError, MovePlan, PositionShift, Task,
        TaskCode, TaskDraft, TaskHistoryEntry, TaskId, TaskPosition, TimeLogEntry, UserId, ledger,
    },
    ports::{
        KanbanRepositoryError, KanbanRepositoryResult, LockChange, RelocateTask, Relocation,
        TaskRepository, TimeLogRepository,
    },
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::pg::PgConnection;
use diesel::prelude::*;
use tracing::debug;

/// Attempts made when a task changes column while a move waits for locks.
const RELOCATE_ATTEMPTS: u32 = 4;

fn next_task_code(connection: &mut PgConnection) -> KanbanRepositoryResult<TaskCode> {
    let row = diesel::sql_query("SELECT nextval('kanban_task_code_seq') AS value")
        .get_result::<SequenceValue>(connection)?;
    let sequence = u64::try_from(row.value).map_err(KanbanRepositoryError::persistence)?;
    Ok(TaskCode::from_sequence(sequence)?)
}

fn max_position(
    connection: &mut PgConnection,
    column_id: ColumnId,
) -> KanbanRepositoryResult<Option<TaskPosition>> {
    let max = kanban_tasks::table
        .filter(kanban_tasks::column_id.eq(column_id.into_inner()))
        .select(diesel::dsl::max(kanban_tasks::position))
        .first::<Option<i32>>(connection)?;
    max.map(position_from_sql).transpose()
}

fn load_task(
    connection: &mut PgConnection,
    id: TaskId,
    lock: bool,
) -> KanbanRepositoryResult<Option<Task>> {
    let query = kanban_tasks::table
        .find(id.into_inner())
        .select(TaskRow::as_select());
    let row = if lock {
        query.for_update().first::<TaskRow>(connection).optional()?
    } else {
        query.first::<TaskRow>(connection).optional()?
    };
    row.map(row_to_task).transpose()
}

fn load_column_tasks(
    connection: &mut PgConnection,
    column_id: ColumnId,
) -> KanbanRepositoryResult<Vec<Task>> {
    let rows = kanban_tasks::table
        .filter(kanban_tasks::column_id.eq(column_id.into_inner()))
        .order(kanban_tasks::position.asc())
        .select(TaskRow::as_select())
        .load::<TaskRow>(connection)?;
    rows.into_iter().map(row_to_task).collect()
}

/// Executes one range shift, leaving the moving task alone.
fn apply_shift(
    connection: &mut PgConnection,
    shift: &PositionShift,
    moving: TaskId,
) -> KanbanRepositoryResult<usize> {
    let lower = position_to_sql(shift.lower())?;
    let upper = shift.upper().map_or(Ok(i32::MAX), position_to_sql)?;
    let shifted = diesel::update(
        kanban_tasks::table
            .filter(kanban_tasks::column_id.eq(shift.column_id().into_inner()))
            .filter(kanban_tasks::position.between(lower, upper))
            .filter(kanban_tasks::id.ne(moving.into_inner())),
    )
    .set(kanban_tasks::position.eq(kanban_tasks::position + shift.direction().delta()))
    .execute(connection)?;
    Ok(shifted)
}

/// Writes the ordering fields of `task` and the matching history row.
fn write_slot(
    connection: &mut PgConnection,
    task: &Task,
    entry: &TaskHistoryEntry,
) -> KanbanRepositoryResult<()> {
    diesel::update(kanban_tasks::table.find(task.id().into_inner()))
        .set((
            kanban_tasks::column_id.eq(task.column_id().into_inner()),
            kanban_tasks::status.eq(task.status()),
            kanban_tasks::position.eq(position_to_sql(task.position())?),
            kanban_tasks::updated_by.eq(task.updated_by().into_inner()),
            kanban_tasks::updated_at.eq(task.updated_at()),
        ))
        .execute(connection)?;
    diesel::insert_into(kanban_task_history::table)
        .values(&history_to_row(entry)?)
        .execute(connection)?;
    Ok(())
}

fn relocate_in(
    connection: &mut PgConnection,
    request: &RelocateTask,
) -> KanbanRepositoryResult<Relocation> {
    let seen = load_task(connection, request.task_id, false)?
        .ok_or(KanbanRepositoryError::TaskNotFound(request.task_id))?;
    let columns = lock_columns(connection, &[seen.column_id(), request.target_column])?;
    let target = columns
        .into_iter()
        .find(|column| column.id() == request.target_column)
        .ok_or(KanbanRepositoryError::ColumnNotFound(request.target_column))?;

    let before = load_task(connection, request.task_id, true)?
        .ok_or(KanbanRepositoryError::TaskNotFound(request.task_id))?;
    if before.column_id() != seen.column_id() {
        return Err(KanbanRepositoryError::ConcurrentMove(request.task_id));
    }
    before.ensure_movable()?;
    if target.board_id() != before.board_id() {
        return Err(KanbanDomainError::ColumnNotOnBoard {
            column_id: target.id(),
            board_id: before.board_id(),
        }
        .into());
    }

    let plan = MovePlan::new(
        before.slot(),
        target.id(),
        request.target_position,
        max_position(connection, target.id())?,
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
    for shift in plan.shifts() {
        apply_shift(connection, shift, before.id())?;
    }
    let entry = TaskHistoryEntry::transition(
        &before,
        &after,
        request.source,
        request.actor,
        request.at,
    );
    write_slot(connection, &after, &entry)?;
    Ok(Relocation {
        from: before.slot(),
        task: after,
        history: Some(entry),
    })
}

#[async_trait]
impl TaskRepository for PostgresKanbanStore {
    async fn insert(
        &self,
        draft: &TaskDraft,
        source: HistorySource,
    ) -> KanbanRepositoryResult<Task> {
        let draft = draft.clone();
        self.run_blocking(move |connection| {
            connection.transaction::<_, KanbanRepositoryError, _>(|tx| {
                let column = lock_columns(tx, &[draft.column_id()])?
                    .into_iter()
                    .next()
                    .ok_or(KanbanRepositoryError::ColumnNotFound(draft.column_id()))?;
                let task_id = draft.id();
                let position = ledger::tail_position(max_position(tx, column.id())?);
                let code = next_task_code(tx)?;
                let task = Task::from_draft(draft, &column, code, position)?;

                diesel::insert_into(kanban_tasks::table)
                    .values(&task_to_row(&task)?)
                    .execute(tx)
                    .map_err(|err| {
                        if is_unique_violation(&err) {
                            KanbanRepositoryError::DuplicateTask(task_id)
                        } else {
                            KanbanRepositoryError::persistence(err)
                        }
                    })?;
                diesel::insert_into(kanban_task_history::table)
                    .values(&history_to_row(&TaskHistoryEntry::created(&task, source))?)
                    .execute(tx)?;
                Ok(task)
            })
        })
        .await
    }

    async fn find_task(&self, id: TaskId) -> KanbanRepositoryResult<Option<Task>> {
        self.run_blocking(move |connection| load_task(connection, id, false))
            .await
    }

    async fn tasks_for_board(&self, board_id: BoardId) -> KanbanRepositoryResult<Vec<Task>> {
        self.run_blocking(move |connection| {
            let rows = kanban_tasks::table
                .inner_join(kanban_columns::table)
                .filter(kanban_tasks::board_id.eq(board_id.into_inner()))
                .order((kanban_columns::position.asc(), kanban_tasks::position.asc()))
                .select(TaskRow::as_select())
                .load::<TaskRow>(connection)?;
            rows.into_iter().map(row_to_task).collect()
        })
        .await
    }

    async fn tasks_for_column(&self, column_id: ColumnId) -> KanbanRepositoryResult<Vec<Task>> {
        self.run_blocking(move |connection| load_column_tasks(connection, column_id))
            .await
    }

    async fn update_task(&self, task: &Task) -> KanbanRepositoryResult<()> {
        let task_id = task.id();
        let row = task_to_row(task)?;
        self.run_blocking(move |connection| {
            // Ordering fields and the lock flag have their own writers.
            let updated = diesel::update(kanban_tasks::table.find(row.id))
                .set((
                    kanban_tasks::title.eq(&row.title),
                    kanban_tasks::description.eq(&row.description),
                    kanban_tasks::priority.eq(&row.priority),
                    kanban_tasks::assignee.eq(row.assignee),
                    kanban_tasks::due_date.eq(row.due_date),
                    kanban_tasks::updated_by.eq(row.updated_by),
                    kanban_tasks::updated_at.eq(row.updated_at),
                ))
                .execute(connection)?;
            if updated == 0 {
                return Err(KanbanRepositoryError::TaskNotFound(task_id));
            }
            Ok(())
        })
        .await
    }

    async fn set_locked(
        &self,
        id: TaskId,
        locked: bool,
        actor: UserId,
        at: DateTime<Utc>,
    ) -> KanbanRepositoryResult<LockChange> {
        self.run_blocking(move |connection| {
            connection.transaction::<_, KanbanRepositoryError, _>(|tx| {
                let mut task =
                    load_task(tx, id, true)?.ok_or(KanbanRepositoryError::TaskNotFound(id))?;
                let changed = task.set_lock(locked, actor, at);
                if changed {
                    diesel::update(kanban_tasks::table.find(id.into_inner()))
                        .set((
                            kanban_tasks::is_locked.eq(locked),
                            kanban_tasks::updated_by.eq(actor.into_inner()),
                            kanban_tasks::updated_at.eq(at),
                        ))
                        .execute(tx)?;
                }
                Ok(LockChange { task, changed })
            })
        })
        .await
    }

    async fn relocate(&self, request: &RelocateTask) -> KanbanRepositoryResult<Relocation> {
        let mut attempt = 1;
        loop {
            let pending = request.clone();
            let result = self
                .run_blocking(move |connection| {
                    connection
                        .transaction::<_, KanbanRepositoryError, _>(|tx| relocate_in(tx, &pending))
                })
                .await;
            match result {
                Err(KanbanRepositoryError::ConcurrentMove(task_id))
                    if attempt < RELOCATE_ATTEMPTS =>
                {
                    debug!(task_id = %task_id, attempt, "task moved under us; retrying");
                    attempt += 1;
                }
                other => return other,
            }
        }
    }

    async fn delete_task(&self, id: TaskId) -> KanbanRepositoryResult<Task> {
        self.run_blocking(move |connection| {
            connection.transaction::<_, KanbanRepositoryError, _>(|tx| {
                let task = load_task(tx, id, true)?.ok_or(KanbanRepositoryError::TaskNotFound(id))?;
                // History and time logs go with the task through ON DELETE CASCADE.
                diesel::delete(kanban_tasks::table.find(id.into_inner())).execute(tx)?;
                Ok(task)
            })
        })
        .await
    }

    async fn compact_column(
        &self,
        column_id: ColumnId,
        actor: UserId,
        at: DateTime<Utc>,
    ) -> KanbanRepositoryResult<Vec<Relocation>> {
        self.run_blocking(move |connection| {
            connection.transaction::<_, KanbanRepositoryError, _>(|tx| {
                let column = lock_columns(tx, &[column_id])?
                    .into_iter()
                    .next()
                    .ok_or(KanbanRepositoryError::ColumnNotFound(column_id))?;
                let tasks = load_column_tasks(tx, column_id)?;
                let changes =
                    ledger::compaction(tasks.iter().map(|task| (task.id(), task.position())));

                let mut relocations = Vec::with_capacity(changes.len());
                for (task_id, position) in changes {
                    let Some(before) = tasks.iter().find(|task| task.id() == task_id) else {
                        continue;
                    };
                    let mut after = before.clone();
                    after.place(&column, position, actor, at)?;
                    let entry = TaskHistoryEntry::transition(
                        before,
                        &after,
                        HistorySource::System,
                        actor,
                        at,
                    );
                    write_slot(tx, &after, &entry)?;
                    relocations.push(Relocation {
                        task: after,
                        from: before.slot(),
                        history: Some(entry),
                    });
                }
                Ok(relocations)
            })
        })
        .await
    }

    async fn history_for_task(
        &self,
        id: TaskId,
    ) -> KanbanRepositoryResult<Vec<TaskHistoryEntry>> {
        self.run_blocking(move |connection| {
            let rows = kanban_task_history::table
                .filter(kanban_task_history::task_id.eq(id.into_inner()))
                .order(kanban_task_history::seq.asc())
                .select(HistoryRow::as_select())
                .load::<HistoryRow>(connection)?;
            rows.into_iter().map(row_to_history).collect()
        })
        .await
    }
}

#[async_trait]
impl TimeLogRepository for PostgresKanbanStore {
    async fn record_time(&self, entry: &TimeLogEntry) -> KanbanRepositoryResult<()> {
        let task_id = entry.task_id;
        let row = time_log_to_row(entry)?;
        self.run_blocking(move |connection| {
            diesel::insert_into(kanban_time_logs::table)
                .values(&row)
                .execute(connection)
                .map_err(|err| {
                    if is_foreign_key_violation(&err) {
                        KanbanRepositoryError::TaskNotFound(task_id)
                    } else {
                        KanbanRepositoryError::persistence(err)
                    }
                })?;
            Ok(())
        })
        .await
    }

    async fn time_logs_for_task(&self, id: TaskId) -> KanbanRepositoryResult<Vec<TimeLogEntry>> {
        self.run_blocking(move |connection| {
            let rows = kanban_time_logs::table
                .filter(kanban_time_logs::task_id.eq(id.into_inner()))
                .order(kanban_time_logs::seq.asc())
                .select(TimeLogRow::as_select())
                .load::<TimeLogRow>(connection)?;
            rows.into_iter().map(row_to_time_log).collect()
        })
        .await
    }
}
