//! Diesel row models for Kanban persistence and their domain mappings.

use super::schema::{
    kanban_board_members, kanban_boards, kanban_columns, kanban_task_history, kanban_tasks,
    kanban_time_logs,
};
use crate::kanban::{
    domain::{
        Board, BoardId, BoardMember, BoardName, BoardRole, Column, ColumnId, ColumnPosition,
        HistoryId, HistorySource, LoggedMinutes, PersistedBoardData, PersistedColumnData,
        PersistedTaskData, Task, TaskCode, TaskHistoryEntry, TaskId, TaskPosition, TaskPriority,
        TaskTitle, TimeLogEntry, TimeLogId, UserId,
    },
    ports::{KanbanRepositoryError, KanbanRepositoryResult},
};
use chrono::{DateTime, NaiveDate, Utc};
use diesel::prelude::*;
use uuid::Uuid;

/// Board row.
#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = kanban_boards)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct BoardRow {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub project_id: Option<Uuid>,
    pub is_active: bool,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Column row.
#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = kanban_columns)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ColumnRow {
    pub id: Uuid,
    pub board_id: Uuid,
    pub name: String,
    pub status_label: String,
    pub position: i32,
    pub color: String,
    pub created_at: DateTime<Utc>,
}

/// Task row.
#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = kanban_tasks)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct TaskRow {
    pub id: Uuid,
    pub board_id: Uuid,
    pub column_id: Uuid,
    pub task_code: String,
    pub title: String,
    pub description: Option<String>,
    pub status: String,
    pub priority: String,
    pub position: i32,
    pub assignee: Option<Uuid>,
    pub due_date: Option<NaiveDate>,
    pub is_locked: bool,
    pub created_by: Uuid,
    pub updated_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// History row. Ordering uses the table's insertion sequence.
#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = kanban_task_history)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct HistoryRow {
    pub id: Uuid,
    pub task_id: Uuid,
    pub board_id: Uuid,
    pub source: String,
    pub old_status: Option<String>,
    pub new_status: String,
    pub old_column_id: Option<Uuid>,
    pub new_column_id: Uuid,
    pub old_position: Option<i32>,
    pub new_position: i32,
    pub changed_by: Uuid,
    pub changed_at: DateTime<Utc>,
}

/// Membership row.
#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = kanban_board_members)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct MemberRow {
    pub board_id: Uuid,
    pub user_id: Uuid,
    pub role: String,
    pub joined_at: DateTime<Utc>,
}

/// Time log row. Ordering uses the table's insertion sequence.
#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = kanban_time_logs)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct TimeLogRow {
    pub id: Uuid,
    pub task_id: Uuid,
    pub user_id: Uuid,
    pub minutes: i32,
    pub note: Option<String>,
    pub logged_at: DateTime<Utc>,
}

/// Result row of `SELECT nextval(...) AS value`.
#[derive(Debug, QueryableByName)]
pub struct SequenceValue {
    #[diesel(sql_type = diesel::sql_types::BigInt)]
    pub value: i64,
}

pub fn position_to_sql(position: TaskPosition) -> KanbanRepositoryResult<i32> {
    i32::try_from(position.value()).map_err(KanbanRepositoryError::persistence)
}

pub fn position_from_sql(value: i32) -> KanbanRepositoryResult<TaskPosition> {
    let raw = u32::try_from(value).map_err(KanbanRepositoryError::persistence)?;
    TaskPosition::new(raw).map_err(KanbanRepositoryError::persistence)
}

fn column_position_to_sql(position: ColumnPosition) -> KanbanRepositoryResult<i32> {
    i32::try_from(position.value()).map_err(KanbanRepositoryError::persistence)
}

pub fn board_to_row(board: &Board) -> BoardRow {
    BoardRow {
        id: board.id().into_inner(),
        name: board.name().as_str().to_owned(),
        description: board.description().map(str::to_owned),
        project_id: board.project_id(),
        is_active: board.is_active(),
        created_by: board.created_by().into_inner(),
        created_at: board.created_at(),
        updated_at: board.updated_at(),
    }
}

pub fn row_to_board(row: BoardRow) -> KanbanRepositoryResult<Board> {
    let name = BoardName::new(row.name).map_err(KanbanRepositoryError::persistence)?;
    Ok(Board::from_persisted(PersistedBoardData {
        id: BoardId::from_uuid(row.id),
        name,
        description: row.description,
        project_id: row.project_id,
        is_active: row.is_active,
        created_by: UserId::from_uuid(row.created_by),
        created_at: row.created_at,
        updated_at: row.updated_at,
    }))
}

pub fn column_to_row(column: &Column) -> KanbanRepositoryResult<ColumnRow> {
    Ok(ColumnRow {
        id: column.id().into_inner(),
        board_id: column.board_id().into_inner(),
        name: column.name().to_owned(),
        status_label: column.status_label().to_owned(),
        position: column_position_to_sql(column.position())?,
        color: column.color().to_owned(),
        created_at: column.created_at(),
    })
}

pub fn row_to_column(row: ColumnRow) -> KanbanRepositoryResult<Column> {
    let position = u32::try_from(row.position).map_err(KanbanRepositoryError::persistence)?;
    Ok(Column::from_persisted(PersistedColumnData {
        id: ColumnId::from_uuid(row.id),
        board_id: BoardId::from_uuid(row.board_id),
        name: row.name,
        status_label: row.status_label,
        position: ColumnPosition::new(position),
        color: row.color,
        created_at: row.created_at,
    }))
}

pub fn task_to_row(task: &Task) -> KanbanRepositoryResult<TaskRow> {
    Ok(TaskRow {
        id: task.id().into_inner(),
        board_id: task.board_id().into_inner(),
        column_id: task.column_id().into_inner(),
        task_code: task.code().to_string(),
        title: task.title().as_str().to_owned(),
        description: task.description().map(str::to_owned),
        status: task.status().to_owned(),
        priority: task.priority().as_str().to_owned(),
        position: position_to_sql(task.position())?,
        assignee: task.assignee().map(UserId::into_inner),
        due_date: task.due_date(),
        is_locked: task.is_locked(),
        created_by: task.created_by().into_inner(),
        updated_by: task.updated_by().into_inner(),
        created_at: task.created_at(),
        updated_at: task.updated_at(),
    })
}

pub fn row_to_task(row: TaskRow) -> KanbanRepositoryResult<Task> {
    let TaskRow {
        id,
        board_id,
        column_id,
        task_code,
        title,
        description,
        status,
        priority,
        position,
        assignee,
        due_date,
        is_locked,
        created_by,
        updated_by,
        created_at,
        updated_at,
    } = row;

    Ok(Task::from_persisted(PersistedTaskData {
        id: TaskId::from_uuid(id),
        board_id: BoardId::from_uuid(board_id),
        column_id: ColumnId::from_uuid(column_id),
        code: TaskCode::parse(&task_code).map_err(KanbanRepositoryError::persistence)?,
        title: TaskTitle::new(title).map_err(KanbanRepositoryError::persistence)?,
        description,
        status,
        priority: TaskPriority::try_from(priority.as_str())
            .map_err(KanbanRepositoryError::persistence)?,
        position: position_from_sql(position)?,
        assignee: assignee.map(UserId::from_uuid),
        due_date,
        is_locked,
        created_by: UserId::from_uuid(created_by),
        updated_by: UserId::from_uuid(updated_by),
        created_at,
        updated_at,
    }))
}

pub fn history_to_row(entry: &TaskHistoryEntry) -> KanbanRepositoryResult<HistoryRow> {
    Ok(HistoryRow {
        id: entry.id.into_inner(),
        task_id: entry.task_id.into_inner(),
        board_id: entry.board_id.into_inner(),
        source: entry.source.as_str().to_owned(),
        old_status: entry.old_status.clone(),
        new_status: entry.new_status.clone(),
        old_column_id: entry.old_column_id.map(ColumnId::into_inner),
        new_column_id: entry.new_column_id.into_inner(),
        old_position: entry.old_position.map(position_to_sql).transpose()?,
        new_position: position_to_sql(entry.new_position)?,
        changed_by: entry.changed_by.into_inner(),
        changed_at: entry.changed_at,
    })
}

pub fn row_to_history(row: HistoryRow) -> KanbanRepositoryResult<TaskHistoryEntry> {
    Ok(TaskHistoryEntry {
        id: HistoryId::from_uuid(row.id),
        task_id: TaskId::from_uuid(row.task_id),
        board_id: BoardId::from_uuid(row.board_id),
        source: HistorySource::try_from(row.source.as_str())
            .map_err(KanbanRepositoryError::persistence)?,
        old_status: row.old_status,
        new_status: row.new_status,
        old_column_id: row.old_column_id.map(ColumnId::from_uuid),
        new_column_id: ColumnId::from_uuid(row.new_column_id),
        old_position: row.old_position.map(position_from_sql).transpose()?,
        new_position: position_from_sql(row.new_position)?,
        changed_by: UserId::from_uuid(row.changed_by),
        changed_at: row.changed_at,
    })
}

pub fn member_to_row(member: &BoardMember) -> MemberRow {
    MemberRow {
        board_id: member.board_id().into_inner(),
        user_id: member.user_id().into_inner(),
        role: member.role().as_str().to_owned(),
        joined_at: member.joined_at(),
    }
}

pub fn row_to_member(row: MemberRow) -> KanbanRepositoryResult<BoardMember> {
    let role = BoardRole::try_from(row.role.as_str()).map_err(KanbanRepositoryError::persistence)?;
    Ok(BoardMember::new(
        BoardId::from_uuid(row.board_id),
        UserId::from_uuid(row.user_id),
        role,
        row.joined_at,
    ))
}

pub fn time_log_to_row(entry: &TimeLogEntry) -> KanbanRepositoryResult<TimeLogRow> {
    Ok(TimeLogRow {
        id: entry.id.into_inner(),
        task_id: entry.task_id.into_inner(),
        user_id: entry.user_id.into_inner(),
        minutes: i32::try_from(entry.minutes.value()).map_err(KanbanRepositoryError::persistence)?,
        note: entry.note.clone(),
        logged_at: entry.logged_at,
    })
}

pub fn row_to_time_log(row: TimeLogRow) -> KanbanRepositoryResult<TimeLogEntry> {
    let raw = u32::try_from(row.minutes).map_err(KanbanRepositoryError::persistence)?;
    Ok(TimeLogEntry {
        id: TimeLogId::from_uuid(row.id),
        task_id: TaskId::from_uuid(row.task_id),
        user_id: UserId::from_uuid(row.user_id),
        minutes: LoggedMinutes::new(raw).map_err(KanbanRepositoryError::persistence)?,
        note: row.note,
        logged_at: row.logged_at,
    })
}
