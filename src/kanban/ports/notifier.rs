//! Publish-only notification port.

use crate::kanban::domain::KanbanEvent;
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for notifier operations.
pub type NotifierResult<T> = Result<T, NotifierError>;

/// Fan-out of committed changes to the observers of a board.
///
/// Implementations must not block for long; there is no acknowledgement and
/// no retry.
#[async_trait]
pub trait KanbanNotifier: Send + Sync {
    /// Publishes an event to every observer of its board.
    async fn publish(&self, event: &KanbanEvent) -> NotifierResult<()>;
}

/// Errors returned by notifier adapters.
#[derive(Debug, Clone, Error)]
pub enum NotifierError {
    /// The event could not be encoded.
    #[error("failed to encode {event_name}: {reason}")]
    Encoding {
        /// Event channel name.
        event_name: &'static str,
        /// Encoder message.
        reason: String,
    },

    /// The transport is shut down.
    #[error("notification transport is closed")]
    Closed,

    /// Generic transport failure.
    #[error("notification transport error: {0}")]
    Transport(Arc<dyn std::error::Error + Send + Sync>),
}

impl NotifierError {
    /// Wraps a transport error.
    pub fn transport(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Transport(Arc::new(err))
    }
}
