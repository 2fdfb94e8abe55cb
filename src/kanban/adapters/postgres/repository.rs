//! `PostgreSQL` store: connection handling and board persistence.

use super::{
    models::{
        BoardRow, ColumnRow, MemberRow, board_to_row, column_to_row, member_to_row, row_to_board,
        row_to_column, row_to_member,
    },
    schema::{kanban_board_members, kanban_boards, kanban_columns},
};
use crate::kanban::{
    domain::{Board, BoardId, BoardMember, Column, ColumnId, UserId, plan_column_order},
    ports::{BoardRepository, KanbanRepositoryError, KanbanRepositoryResult},
};
use async_trait::async_trait;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::result::{DatabaseErrorKind, Error as DieselError};

/// `PostgreSQL` connection pool type used by Kanban adapters.
pub type KanbanPgPool = Pool<ConnectionManager<PgConnection>>;

/// `PostgreSQL`-backed implementation of every Kanban repository port.
///
/// Multi-row writes run in a single transaction. Moves and inserts lock the
/// affected `kanban_columns` rows with `SELECT ... FOR UPDATE`, in ascending
/// id order, which serialises writers per column.
#[derive(Debug, Clone)]
pub struct PostgresKanbanStore {
    pool: KanbanPgPool,
}

impl PostgresKanbanStore {
    /// Creates a new store from a `PostgreSQL` connection pool.
    #[must_use]
    pub const fn new(pool: KanbanPgPool) -> Self {
        Self { pool }
    }

    pub(super) async fn run_blocking<F, T>(&self, f: F) -> KanbanRepositoryResult<T>
    where
        F: FnOnce(&mut PgConnection) -> KanbanRepositoryResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut connection = pool.get().map_err(KanbanRepositoryError::persistence)?;
            f(&mut connection)
        })
        .await
        .map_err(KanbanRepositoryError::persistence)?
    }
}

impl From<DieselError> for KanbanRepositoryError {
    fn from(err: DieselError) -> Self {
        Self::persistence(err)
    }
}

pub(super) const fn is_unique_violation(err: &DieselError) -> bool {
    matches!(
        err,
        DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _)
    )
}

pub(super) const fn is_foreign_key_violation(err: &DieselError) -> bool {
    matches!(
        err,
        DieselError::DatabaseError(DatabaseErrorKind::ForeignKeyViolation, _)
    )
}

/// Locks the given columns in ascending id order and returns them.
pub(super) fn lock_columns(
    connection: &mut PgConnection,
    ids: &[ColumnId],
) -> KanbanRepositoryResult<Vec<Column>> {
    let mut uuids: Vec<uuid::Uuid> = ids.iter().map(|id| id.into_inner()).collect();
    uuids.sort_unstable();
    uuids.dedup();
    let rows = kanban_columns::table
        .filter(kanban_columns::id.eq_any(uuids))
        .order(kanban_columns::id.asc())
        .select(ColumnRow::as_select())
        .for_update()
        .load::<ColumnRow>(connection)?;
    rows.into_iter().map(row_to_column).collect()
}

fn load_columns(
    connection: &mut PgConnection,
    board_id: BoardId,
) -> KanbanRepositoryResult<Vec<Column>> {
    let rows = kanban_columns::table
        .filter(kanban_columns::board_id.eq(board_id.into_inner()))
        .order(kanban_columns::position.asc())
        .select(ColumnRow::as_select())
        .load::<ColumnRow>(connection)?;
    rows.into_iter().map(row_to_column).collect()
}

fn board_exists(connection: &mut PgConnection, board_id: BoardId) -> KanbanRepositoryResult<bool> {
    let found = kanban_boards::table
        .filter(kanban_boards::id.eq(board_id.into_inner()))
        .select(kanban_boards::id)
        .first::<uuid::Uuid>(connection)
        .optional()?;
    Ok(found.is_some())
}

#[async_trait]
impl BoardRepository for PostgresKanbanStore {
    async fn create_board(
        &self,
        board: &Board,
        columns: &[Column],
        creator: &BoardMember,
    ) -> KanbanRepositoryResult<()> {
        let board_id = board.id();
        let board_row = board_to_row(board);
        let column_rows = columns
            .iter()
            .map(column_to_row)
            .collect::<KanbanRepositoryResult<Vec<_>>>()?;
        let member_row = member_to_row(creator);

        self.run_blocking(move |connection| {
            connection.transaction::<_, KanbanRepositoryError, _>(|tx| {
                diesel::insert_into(kanban_boards::table)
                    .values(&board_row)
                    .execute(tx)
                    .map_err(|err| {
                        if is_unique_violation(&err) {
                            KanbanRepositoryError::DuplicateBoard(board_id)
                        } else {
                            KanbanRepositoryError::persistence(err)
                        }
                    })?;
                diesel::insert_into(kanban_columns::table)
                    .values(&column_rows)
                    .execute(tx)?;
                diesel::insert_into(kanban_board_members::table)
                    .values(&member_row)
                    .execute(tx)?;
                Ok(())
            })
        })
        .await
    }

    async fn find_board(&self, id: BoardId) -> KanbanRepositoryResult<Option<Board>> {
        self.run_blocking(move |connection| {
            let row = kanban_boards::table
                .filter(kanban_boards::id.eq(id.into_inner()))
                .select(BoardRow::as_select())
                .first::<BoardRow>(connection)
                .optional()?;
            row.map(row_to_board).transpose()
        })
        .await
    }

    async fn list_boards(&self, include_inactive: bool) -> KanbanRepositoryResult<Vec<Board>> {
        self.run_blocking(move |connection| {
            let mut query = kanban_boards::table
                .select(BoardRow::as_select())
                .order(kanban_boards::created_at.asc())
                .into_boxed();
            if !include_inactive {
                query = query.filter(kanban_boards::is_active.eq(true));
            }
            let rows = query.load::<BoardRow>(connection)?;
            rows.into_iter().map(row_to_board).collect()
        })
        .await
    }

    async fn update_board(&self, board: &Board) -> KanbanRepositoryResult<()> {
        let board_id = board.id();
        let row = board_to_row(board);
        self.run_blocking(move |connection| {
            let updated = diesel::update(kanban_boards::table.find(row.id))
                .set((
                    kanban_boards::name.eq(&row.name),
                    kanban_boards::description.eq(&row.description),
                    kanban_boards::project_id.eq(row.project_id),
                    kanban_boards::is_active.eq(row.is_active),
                    kanban_boards::updated_at.eq(row.updated_at),
                ))
                .execute(connection)?;
            if updated == 0 {
                return Err(KanbanRepositoryError::BoardNotFound(board_id));
            }
            Ok(())
        })
        .await
    }

    async fn columns(&self, board_id: BoardId) -> KanbanRepositoryResult<Vec<Column>> {
        self.run_blocking(move |connection| load_columns(connection, board_id))
            .await
    }

    async fn find_column(&self, id: ColumnId) -> KanbanRepositoryResult<Option<Column>> {
        self.run_blocking(move |connection| {
            let row = kanban_columns::table
                .find(id.into_inner())
                .select(ColumnRow::as_select())
                .first::<ColumnRow>(connection)
                .optional()?;
            row.map(row_to_column).transpose()
        })
        .await
    }

    async fn reorder_columns(
        &self,
        board_id: BoardId,
        order: &[ColumnId],
    ) -> KanbanRepositoryResult<Vec<Column>> {
        let requested = order.to_vec();
        self.run_blocking(move |connection| {
            connection.transaction::<_, KanbanRepositoryError, _>(|tx| {
                if !board_exists(tx, board_id)? {
                    return Err(KanbanRepositoryError::BoardNotFound(board_id));
                }
                let current_ids: Vec<ColumnId> =
                    load_columns(tx, board_id)?.iter().map(Column::id).collect();
                let current = lock_columns(tx, &current_ids)?;
                for (column_id, position) in plan_column_order(board_id, &current, &requested)? {
                    let sql_position = i32::try_from(position.value())
                        .map_err(KanbanRepositoryError::persistence)?;
                    diesel::update(kanban_columns::table.find(column_id.into_inner()))
                        .set(kanban_columns::position.eq(sql_position))
                        .execute(tx)?;
                }
                load_columns(tx, board_id)
            })
        })
        .await
    }

    async fn add_member(&self, member: &BoardMember) -> KanbanRepositoryResult<()> {
        let board_id = member.board_id();
        let user_id = member.user_id();
        let row = member_to_row(member);
        self.run_blocking(move |connection| {
            diesel::insert_into(kanban_board_members::table)
                .values(&row)
                .execute(connection)
                .map_err(|err| {
                    if is_unique_violation(&err) {
                        KanbanRepositoryError::DuplicateMember { board_id, user_id }
                    } else if is_foreign_key_violation(&err) {
                        KanbanRepositoryError::BoardNotFound(board_id)
                    } else {
                        KanbanRepositoryError::persistence(err)
                    }
                })?;
            Ok(())
        })
        .await
    }

    async fn update_member(&self, member: &BoardMember) -> KanbanRepositoryResult<()> {
        let board_id = member.board_id();
        let user_id = member.user_id();
        let role = member.role().as_str();
        self.run_blocking(move |connection| {
            let updated = diesel::update(
                kanban_board_members::table.find((board_id.into_inner(), user_id.into_inner())),
            )
            .set(kanban_board_members::role.eq(role))
            .execute(connection)?;
            if updated == 0 {
                return Err(KanbanRepositoryError::MemberNotFound { board_id, user_id });
            }
            Ok(())
        })
        .await
    }

    async fn remove_member(
        &self,
        board_id: BoardId,
        user_id: UserId,
    ) -> KanbanRepositoryResult<()> {
        self.run_blocking(move |connection| {
            let removed = diesel::delete(
                kanban_board_members::table.find((board_id.into_inner(), user_id.into_inner())),
            )
            .execute(connection)?;
            if removed == 0 {
                return Err(KanbanRepositoryError::MemberNotFound { board_id, user_id });
            }
            Ok(())
        })
        .await
    }

    async fn members(&self, board_id: BoardId) -> KanbanRepositoryResult<Vec<BoardMember>> {
        self.run_blocking(move |connection| {
            let rows = kanban_board_members::table
                .filter(kanban_board_members::board_id.eq(board_id.into_inner()))
                .order(kanban_board_members::joined_at.asc())
                .select(MemberRow::as_select())
                .load::<MemberRow>(connection)?;
            rows.into_iter().map(row_to_member).collect()
        })
        .await
    }

    async fn find_member(
        &self,
        board_id: BoardId,
        user_id: UserId,
    ) -> KanbanRepositoryResult<Option<BoardMember>> {
        self.run_blocking(move |connection| {
            let row = kanban_board_members::table
                .find((board_id.into_inner(), user_id.into_inner()))
                .select(MemberRow::as_select())
                .first::<MemberRow>(connection)
                .optional()?;
            row.map(row_to_member).transpose()
        })
        .await
    }
}
