//! Identity collaborator port used to enrich task reads.

use crate::kanban::domain::UserId;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

/// Result type for user directory lookups.
pub type UserDirectoryResult<T> = Result<T, UserDirectoryError>;

/// Display details of a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    /// User identifier.
    pub user_id: UserId,
    /// Display name.
    pub name: String,
    /// Contact email.
    pub email: String,
}

/// Resolves user identifiers to profiles.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Looks up a user. Returns `None` for unknown users.
    async fn profile(&self, user_id: UserId) -> UserDirectoryResult<Option<UserProfile>>;
}

/// Errors returned by user directory adapters.
#[derive(Debug, Clone, Error)]
#[error("user directory error: {0}")]
pub struct UserDirectoryError(pub Arc<dyn std::error::Error + Send + Sync>);

impl UserDirectoryError {
    /// Wraps a lookup failure.
    pub fn lookup(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self(Arc::new(err))
    }
}
