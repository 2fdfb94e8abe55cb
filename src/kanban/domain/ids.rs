//! Identifier and validated scalar types for the Kanban domain.

use super::KanbanDomainError;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

macro_rules! uuid_identifier {
    ($(#[$meta:meta])* $name:ident, $what:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            #[doc = concat!("Creates a new random ", $what, " identifier.")]
            #[must_use]
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            #[doc = concat!("Creates a ", $what, " identifier from an existing UUID.")]
            #[must_use]
            pub const fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Returns the wrapped UUID.
            #[must_use]
            pub const fn into_inner(self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl AsRef<Uuid> for $name {
            fn as_ref(&self) -> &Uuid {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

uuid_identifier!(
    /// Unique identifier for a Kanban board.
    BoardId,
    "board"
);
uuid_identifier!(
    /// Unique identifier for a board column.
    ColumnId,
    "column"
);
uuid_identifier!(
    /// Unique identifier for a task card.
    TaskId,
    "task"
);
uuid_identifier!(
    /// Identifier of a user supplied by the identity collaborator.
    UserId,
    "user"
);
uuid_identifier!(
    /// Unique identifier for a task history row.
    HistoryId,
    "history entry"
);
uuid_identifier!(
    /// Unique identifier for a time log row.
    TimeLogId,
    "time log"
);

/// Human-readable task code such as `KAN-0042`.
///
/// Codes are derived from an atomic per-store sequence and are unique.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TaskCode(u64);

impl TaskCode {
    /// Prefix shared by every task code.
    pub const PREFIX: &'static str = "KAN-";

    /// Builds a code from a sequence value.
    ///
    /// # Errors
    ///
    /// Returns [`KanbanDomainError::InvalidTaskCode`] when the sequence is
    /// zero.
    pub fn from_sequence(sequence: u64) -> Result<Self, KanbanDomainError> {
        if sequence == 0 {
            return Err(KanbanDomainError::InvalidTaskCode(format!(
                "{}{sequence}",
                Self::PREFIX
            )));
        }
        Ok(Self(sequence))
    }

    /// Parses a stored code.
    ///
    /// # Errors
    ///
    /// Returns [`KanbanDomainError::InvalidTaskCode`] when the value lacks the
    /// `KAN-` prefix or the numeric part is not a positive integer.
    pub fn parse(value: &str) -> Result<Self, KanbanDomainError> {
        let invalid = || KanbanDomainError::InvalidTaskCode(value.to_owned());
        let digits = value.trim().strip_prefix(Self::PREFIX).ok_or_else(invalid)?;
        if digits.is_empty() || !digits.chars().all(|ch| ch.is_ascii_digit()) {
            return Err(invalid());
        }
        let sequence = digits.parse::<u64>().map_err(|_| invalid())?;
        Self::from_sequence(sequence).map_err(|_| invalid())
    }

    /// Returns the sequence number behind the code.
    #[must_use]
    pub const fn sequence(self) -> u64 {
        self.0
    }
}

impl fmt::Display for TaskCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{:04}", Self::PREFIX, self.0)
    }
}

impl From<TaskCode> for String {
    fn from(code: TaskCode) -> Self {
        code.to_string()
    }
}

impl TryFrom<String> for TaskCode {
    type Error = KanbanDomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

/// One-based position of a task inside its column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct TaskPosition(u32);

impl TaskPosition {
    /// Head of a column.
    pub const FIRST: Self = Self(1);

    /// Creates a validated task position.
    ///
    /// # Errors
    ///
    /// Returns [`KanbanDomainError::InvalidTaskPosition`] when the value is
    /// zero.
    pub const fn new(value: u32) -> Result<Self, KanbanDomainError> {
        if value == 0 {
            return Err(KanbanDomainError::InvalidTaskPosition(value));
        }
        Ok(Self(value))
    }

    /// Returns the numeric position.
    #[must_use]
    pub const fn value(self) -> u32 {
        self.0
    }

    /// Returns the position directly after this one.
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0.saturating_add(1))
    }

    /// Returns the position directly before this one, if any.
    #[must_use]
    pub const fn previous(self) -> Option<Self> {
        if self.0 > 1 { Some(Self(self.0 - 1)) } else { None }
    }
}

impl From<TaskPosition> for u32 {
    fn from(position: TaskPosition) -> Self {
        position.0
    }
}

impl TryFrom<u32> for TaskPosition {
    type Error = KanbanDomainError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl fmt::Display for TaskPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Zero-based display position of a column on its board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ColumnPosition(u32);

impl ColumnPosition {
    /// Creates a column position.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Returns the numeric position.
    #[must_use]
    pub const fn value(self) -> u32 {
        self.0
    }
}

impl fmt::Display for ColumnPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
