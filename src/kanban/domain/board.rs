//! Board aggregate, board naming and board membership.

use super::{BoardId, Column, KanbanDomainError, ParseBoardRoleError, UserId};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Validated, trimmed board name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BoardName(String);

impl BoardName {
    /// Creates a validated board name.
    ///
    /// # Errors
    ///
    /// Returns [`KanbanDomainError::EmptyBoardName`] when the value is blank.
    pub fn new(value: impl Into<String>) -> Result<Self, KanbanDomainError> {
        let raw = value.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(KanbanDomainError::EmptyBoardName);
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the name as `str`.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BoardName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Kanban board aggregate root.
///
/// Boards are deactivated rather than deleted so that task history keeps a
/// valid board reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Board {
    id: BoardId,
    name: BoardName,
    description: Option<String>,
    project_id: Option<Uuid>,
    is_active: bool,
    created_by: UserId,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Parameter object for reconstructing a persisted board.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedBoardData {
    /// Persisted board identifier.
    pub id: BoardId,
    /// Persisted board name.
    pub name: BoardName,
    /// Persisted description, if any.
    pub description: Option<String>,
    /// Persisted project reference, if any.
    pub project_id: Option<Uuid>,
    /// Persisted active flag.
    pub is_active: bool,
    /// User that created the board.
    pub created_by: UserId,
    /// Persisted creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Persisted last update timestamp.
    pub updated_at: DateTime<Utc>,
}

impl Board {
    /// Creates a new active board.
    #[must_use]
    pub fn new(name: BoardName, created_by: UserId, clock: &impl Clock) -> Self {
        let timestamp = clock.utc();
        Self {
            id: BoardId::new(),
            name,
            description: None,
            project_id: None,
            is_active: true,
            created_by,
            created_at: timestamp,
            updated_at: timestamp,
        }
    }

    /// Sets the board description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = normalize_description(Some(description.into()));
        self
    }

    /// Links the board to an external project.
    #[must_use]
    pub const fn with_project(mut self, project_id: Uuid) -> Self {
        self.project_id = Some(project_id);
        self
    }

    /// Reconstructs a board from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedBoardData) -> Self {
        Self {
            id: data.id,
            name: data.name,
            description: data.description,
            project_id: data.project_id,
            is_active: data.is_active,
            created_by: data.created_by,
            created_at: data.created_at,
            updated_at: data.updated_at,
        }
    }

    /// Returns the board identifier.
    #[must_use]
    pub const fn id(&self) -> BoardId {
        self.id
    }

    /// Returns the board name.
    #[must_use]
    pub const fn name(&self) -> &BoardName {
        &self.name
    }

    /// Returns the board description, if any.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Returns the linked project, if any.
    #[must_use]
    pub const fn project_id(&self) -> Option<Uuid> {
        self.project_id
    }

    /// Returns whether the board is active.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.is_active
    }

    /// Returns the creating user.
    #[must_use]
    pub const fn created_by(&self) -> UserId {
        self.created_by
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

    /// Renames the board.
    pub fn rename(&mut self, name: BoardName, clock: &impl Clock) {
        self.name = name;
        self.touch(clock);
    }

    /// Replaces the board description. Blank descriptions are cleared.
    pub fn set_description(&mut self, description: Option<String>, clock: &impl Clock) {
        self.description = normalize_description(description);
        self.touch(clock);
    }

    /// Marks the board inactive.
    pub fn deactivate(&mut self, clock: &impl Clock) {
        self.is_active = false;
        self.touch(clock);
    }

    fn touch(&mut self, clock: &impl Clock) {
        self.updated_at = clock.utc();
    }
}

fn normalize_description(description: Option<String>) -> Option<String> {
    description
        .map(|text| text.trim().to_owned())
        .filter(|text| !text.is_empty())
}

/// Board together with its columns in display order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardLayout {
    /// The board.
    pub board: Board,
    /// Columns sorted by ascending position.
    pub columns: Vec<Column>,
}

/// Role held by a board member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoardRole {
    /// Manages the board, its columns and members.
    Admin,
    /// Works on tasks.
    Member,
}

impl BoardRole {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Member => "member",
        }
    }
}

impl TryFrom<&str> for BoardRole {
    type Error = ParseBoardRoleError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "admin" => Ok(Self::Admin),
            "member" => Ok(Self::Member),
            _ => Err(ParseBoardRoleError(value.to_owned())),
        }
    }
}

impl fmt::Display for BoardRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Membership of a user on a board. Used for access control only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardMember {
    board_id: BoardId,
    user_id: UserId,
    role: BoardRole,
    joined_at: DateTime<Utc>,
}

impl BoardMember {
    /// Creates a membership record.
    #[must_use]
    pub const fn new(
        board_id: BoardId,
        user_id: UserId,
        role: BoardRole,
        joined_at: DateTime<Utc>,
    ) -> Self {
        Self {
            board_id,
            user_id,
            role,
            joined_at,
        }
    }

    /// Returns the board identifier.
    #[must_use]
    pub const fn board_id(&self) -> BoardId {
        self.board_id
    }

    /// Returns the member's user identifier.
    #[must_use]
    pub const fn user_id(&self) -> UserId {
        self.user_id
    }

    /// Returns the member's role.
    #[must_use]
    pub const fn role(&self) -> BoardRole {
        self.role
    }

    /// Returns when the user joined the board.
    #[must_use]
    pub const fn joined_at(&self) -> DateTime<Utc> {
        self.joined_at
    }

    /// Changes the member's role.
    pub const fn set_role(&mut self, role: BoardRole) {
        self.role = role;
    }
}
