//! Board, column and membership orchestration.

use super::{
    error::{KanbanServiceError, KanbanServiceResult},
    notify::dispatch,
};
use crate::kanban::{
    domain::{
        Board, BoardId, BoardLayout, BoardMember, BoardName, BoardRole, Column, ColumnId,
        KanbanEvent, UserId,
    },
    ports::{BoardRepository, KanbanNotifier, KanbanRepositoryError},
};
use mockable::Clock;
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

/// Request payload for creating a board.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateBoardRequest {
    name: String,
    created_by: UserId,
    description: Option<String>,
    project_id: Option<Uuid>,
}

impl CreateBoardRequest {
    /// Creates a request with the required fields.
    #[must_use]
    pub fn new(name: impl Into<String>, created_by: UserId) -> Self {
        Self {
            name: name.into(),
            created_by,
            description: None,
            project_id: None,
        }
    }

    /// Sets the board description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Links the board to a project.
    #[must_use]
    pub const fn with_project(mut self, project_id: Uuid) -> Self {
        self.project_id = Some(project_id);
        self
    }
}

/// Changes to board details. Absent fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateBoardRequest {
    /// Replacement name.
    pub name: Option<String>,
    /// Replacement description; `Some(None)` clears it.
    pub description: Option<Option<String>>,
}

/// Board orchestration service.
#[derive(Clone)]
pub struct BoardService<R, N, C>
where
    R: BoardRepository,
    N: KanbanNotifier,
    C: Clock + Send + Sync,
{
    repository: Arc<R>,
    notifier: Arc<N>,
    clock: Arc<C>,
}

impl<R, N, C> BoardService<R, N, C>
where
    R: BoardRepository,
    N: KanbanNotifier,
    C: Clock + Send + Sync,
{
    /// Creates a new board service.
    #[must_use]
    pub const fn new(repository: Arc<R>, notifier: Arc<N>, clock: Arc<C>) -> Self {
        Self {
            repository,
            notifier,
            clock,
        }
    }

    /// Creates a board with the five default columns and makes the creator
    /// its admin.
    ///
    /// # Errors
    ///
    /// Returns [`KanbanServiceError::Domain`] when the name is blank or
    /// [`KanbanServiceError::Repository`] when persistence fails.
    #[instrument(skip(self, request), fields(created_by = %request.created_by))]
    pub async fn create_board(
        &self,
        request: CreateBoardRequest,
    ) -> KanbanServiceResult<BoardLayout> {
        let name = BoardName::new(request.name)?;
        let mut board = Board::new(name, request.created_by, &*self.clock);
        if let Some(description) = request.description {
            board = board.with_description(description);
        }
        if let Some(project_id) = request.project_id {
            board = board.with_project(project_id);
        }
        let columns = Column::default_layout(board.id(), board.created_at());
        let creator = BoardMember::new(
            board.id(),
            request.created_by,
            BoardRole::Admin,
            board.created_at(),
        );

        self.repository
            .create_board(&board, &columns, &creator)
            .await?;
        info!(board_id = %board.id(), "board created");

        dispatch(
            &*self.notifier,
            KanbanEvent::BoardCreated {
                board: board.clone(),
                columns: columns.clone(),
            },
        )
        .await;
        Ok(BoardLayout { board, columns })
    }

    /// Returns a board with its columns in display order.
    ///
    /// # Errors
    ///
    /// Returns [`KanbanServiceError::BoardNotFound`] when the board does not
    /// exist.
    pub async fn get_board(&self, board_id: BoardId) -> KanbanServiceResult<BoardLayout> {
        let board = self.require_board(board_id).await?;
        let columns = self.repository.columns(board_id).await?;
        Ok(BoardLayout { board, columns })
    }

    /// Lists boards ordered by creation time.
    ///
    /// # Errors
    ///
    /// Returns [`KanbanServiceError::Repository`] when persistence fails.
    pub async fn list_boards(&self, include_inactive: bool) -> KanbanServiceResult<Vec<Board>> {
        Ok(self.repository.list_boards(include_inactive).await?)
    }

    /// Changes board details.
    ///
    /// # Errors
    ///
    /// Returns [`KanbanServiceError::BoardNotFound`] when the board does not
    /// exist or [`KanbanServiceError::Domain`] when the new name is blank.
    #[instrument(skip(self, request))]
    pub async fn update_board(
        &self,
        board_id: BoardId,
        request: UpdateBoardRequest,
    ) -> KanbanServiceResult<Board> {
        let mut board = self.require_board(board_id).await?;
        if let Some(name) = request.name {
            board.rename(BoardName::new(name)?, &*self.clock);
        }
        if let Some(description) = request.description {
            board.set_description(description, &*self.clock);
        }
        self.repository.update_board(&board).await?;
        self.publish_board_updated(board.clone()).await;
        Ok(board)
    }

    /// Marks a board inactive. Tasks and history are kept.
    ///
    /// # Errors
    ///
    /// Returns [`KanbanServiceError::BoardNotFound`] when the board does not
    /// exist.
    #[instrument(skip(self))]
    pub async fn deactivate_board(&self, board_id: BoardId) -> KanbanServiceResult<Board> {
        let mut board = self.require_board(board_id).await?;
        if !board.is_active() {
            return Ok(board);
        }
        board.deactivate(&*self.clock);
        self.repository.update_board(&board).await?;
        info!(board_id = %board_id, "board deactivated");
        self.publish_board_updated(board.clone()).await;
        Ok(board)
    }

    /// Lists the columns of a board in display order.
    ///
    /// # Errors
    ///
    /// Returns [`KanbanServiceError::BoardNotFound`] when the board does not
    /// exist.
    pub async fn list_columns(&self, board_id: BoardId) -> KanbanServiceResult<Vec<Column>> {
        self.require_board(board_id).await?;
        Ok(self.repository.columns(board_id).await?)
    }

    /// Rewrites the display order of a board's columns.
    ///
    /// `order` must name every column of the board exactly once.
    ///
    /// # Errors
    ///
    /// Returns [`KanbanServiceError::BoardNotFound`] when the board does not
    /// exist or [`KanbanServiceError::Repository`] wrapping a domain error
    /// when `order` is incomplete, repeats a column or names a foreign one.
    #[instrument(skip(self, order), fields(columns = order.len()))]
    pub async fn reorder_columns(
        &self,
        board_id: BoardId,
        order: &[ColumnId],
    ) -> KanbanServiceResult<Vec<Column>> {
        let board = self.require_board(board_id).await?;
        let columns = self.repository.reorder_columns(board_id, order).await?;
        dispatch(
            &*self.notifier,
            KanbanEvent::BoardUpdated {
                board,
                columns: columns.clone(),
            },
        )
        .await;
        Ok(columns)
    }

    /// Adds a user to a board.
    ///
    /// # Errors
    ///
    /// Returns [`KanbanServiceError::BoardNotFound`] when the board does not
    /// exist or [`KanbanServiceError::Repository`] when the user is already a
    /// member.
    pub async fn add_member(
        &self,
        board_id: BoardId,
        user_id: UserId,
        role: BoardRole,
    ) -> KanbanServiceResult<BoardMember> {
        self.require_board(board_id).await?;
        let member = BoardMember::new(board_id, user_id, role, self.clock.utc());
        self.repository.add_member(&member).await?;
        info!(board_id = %board_id, user_id = %user_id, role = %role, "board member added");
        Ok(member)
    }

    /// Changes the role of an existing member.
    ///
    /// # Errors
    ///
    /// Returns [`KanbanServiceError::Repository`] when the user is not a
    /// member.
    pub async fn change_member_role(
        &self,
        board_id: BoardId,
        user_id: UserId,
        role: BoardRole,
    ) -> KanbanServiceResult<BoardMember> {
        let mut member = self
            .repository
            .find_member(board_id, user_id)
            .await?
            .ok_or(KanbanRepositoryError::MemberNotFound { board_id, user_id })?;
        member.set_role(role);
        self.repository.update_member(&member).await?;
        Ok(member)
    }

    /// Removes a user from a board.
    ///
    /// # Errors
    ///
    /// Returns [`KanbanServiceError::Repository`] when the user is not a
    /// member.
    pub async fn remove_member(
        &self,
        board_id: BoardId,
        user_id: UserId,
    ) -> KanbanServiceResult<()> {
        self.repository.remove_member(board_id, user_id).await?;
        info!(board_id = %board_id, user_id = %user_id, "board member removed");
        Ok(())
    }

    /// Lists the members of a board.
    ///
    /// # Errors
    ///
    /// Returns [`KanbanServiceError::BoardNotFound`] when the board does not
    /// exist.
    pub async fn list_members(&self, board_id: BoardId) -> KanbanServiceResult<Vec<BoardMember>> {
        self.require_board(board_id).await?;
        Ok(self.repository.members(board_id).await?)
    }

    /// Returns the user's role on the board, or `None` for non-members.
    ///
    /// # Errors
    ///
    /// Returns [`KanbanServiceError::Repository`] when persistence fails.
    pub async fn member_role(
        &self,
        board_id: BoardId,
        user_id: UserId,
    ) -> KanbanServiceResult<Option<BoardRole>> {
        let member = self.repository.find_member(board_id, user_id).await?;
        Ok(member.map(|found| found.role()))
    }

    async fn require_board(&self, board_id: BoardId) -> KanbanServiceResult<Board> {
        self.repository
            .find_board(board_id)
            .await?
            .ok_or(KanbanServiceError::BoardNotFound(board_id))
    }

    async fn publish_board_updated(&self, board: Board) {
        match self.repository.columns(board.id()).await {
            Ok(columns) => {
                dispatch(&*self.notifier, KanbanEvent::BoardUpdated { board, columns }).await;
            }
            Err(err) => {
                warn!(board_id = %board.id(), error = %err, "board update not published");
            }
        }
    }
}
