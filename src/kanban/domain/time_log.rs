//! Time tracked against tasks.

use super::{KanbanDomainError, TaskId, TimeLogId, UserId};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};

/// Positive number of minutes spent on a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LoggedMinutes(u32);

impl LoggedMinutes {
    /// Largest duration a single entry may hold.
    pub const MAX: u32 = i32::MAX.unsigned_abs();

    /// Creates a validated duration.
    ///
    /// # Errors
    ///
    /// Returns [`KanbanDomainError::EmptyTimeLog`] for zero minutes or
    /// [`KanbanDomainError::TimeLogTooLong`] above [`LoggedMinutes::MAX`].
    pub const fn new(minutes: u32) -> Result<Self, KanbanDomainError> {
        if minutes == 0 {
            return Err(KanbanDomainError::EmptyTimeLog);
        }
        if minutes > Self::MAX {
            return Err(KanbanDomainError::TimeLogTooLong(minutes));
        }
        Ok(Self(minutes))
    }

    /// Returns the number of minutes.
    #[must_use]
    pub const fn value(self) -> u32 {
        self.0
    }
}

/// One block of time a user spent on a task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeLogEntry {
    /// Entry identifier.
    pub id: TimeLogId,
    /// Task the time was spent on.
    pub task_id: TaskId,
    /// User who spent the time.
    pub user_id: UserId,
    /// Duration.
    pub minutes: LoggedMinutes,
    /// Optional free-text note.
    pub note: Option<String>,
    /// When the entry was recorded.
    pub logged_at: DateTime<Utc>,
}

impl TimeLogEntry {
    /// Creates an entry stamped with the current time.
    #[must_use]
    pub fn new(
        task_id: TaskId,
        user_id: UserId,
        minutes: LoggedMinutes,
        note: Option<String>,
        clock: &impl Clock,
    ) -> Self {
        Self {
            id: TimeLogId::new(),
            task_id,
            user_id,
            minutes,
            note: note
                .map(|text| text.trim().to_owned())
                .filter(|text| !text.is_empty()),
            logged_at: clock.utc(),
        }
    }
}

/// Sums the minutes of a set of entries.
#[must_use]
pub fn total_minutes<'a>(entries: impl IntoIterator<Item = &'a TimeLogEntry>) -> u64 {
    entries
        .into_iter()
        .map(|entry| u64::from(entry.minutes.value()))
        .sum()
}
