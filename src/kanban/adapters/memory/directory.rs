//! In-memory user directory.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::kanban::{
    domain::UserId,
    ports::{UserDirectory, UserDirectoryError, UserDirectoryResult, UserProfile},
};

/// User directory backed by a map of known profiles.
#[derive(Debug, Clone, Default)]
pub struct InMemoryUserDirectory {
    profiles: Arc<RwLock<HashMap<UserId, UserProfile>>>,
}

impl InMemoryUserDirectory {
    /// Creates an empty directory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers or replaces a profile.
    ///
    /// # Errors
    ///
    /// Returns [`UserDirectoryError`] when the lock is poisoned.
    pub fn insert(&self, profile: UserProfile) -> UserDirectoryResult<()> {
        let mut profiles = self
            .profiles
            .write()
            .map_err(|err| UserDirectoryError::lookup(std::io::Error::other(err.to_string())))?;
        profiles.insert(profile.user_id, profile);
        Ok(())
    }
}

#[async_trait]
impl UserDirectory for InMemoryUserDirectory {
    async fn profile(&self, user_id: UserId) -> UserDirectoryResult<Option<UserProfile>> {
        let profiles = self
            .profiles
            .read()
            .map_err(|err| UserDirectoryError::lookup(std::io::Error::other(err.to_string())))?;
        Ok(profiles.get(&user_id).cloned())
    }
}
