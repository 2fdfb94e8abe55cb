//! Notifier adapters.
//!
//! [`BroadcastNotifier`] fans events out to per-board subscribers over a
//! tokio broadcast channel. Publishing while nobody listens is not an error.

use async_trait::async_trait;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::broadcast;
use tracing::{debug, warn};

use crate::kanban::{
    domain::{BoardId, KanbanEvent},
    ports::{KanbanNotifier, NotifierError, NotifierResult},
};

/// Encoded event as delivered to observers.
#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    /// Board whose observers receive the notification.
    pub board_id: BoardId,
    /// Channel event name, for example `kanban:task_moved`.
    pub event_name: &'static str,
    /// JSON body.
    pub payload: serde_json::Value,
}

/// In-process publisher backed by a bounded broadcast channel.
#[derive(Debug, Clone)]
pub struct BroadcastNotifier {
    sender: broadcast::Sender<Notification>,
}

impl BroadcastNotifier {
    /// Creates a notifier buffering up to `capacity` undelivered events per
    /// subscriber. A zero capacity is raised to one.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Subscribes to the events of one board.
    #[must_use]
    pub fn subscribe(&self, board_id: BoardId) -> BoardSubscription {
        BoardSubscription {
            board_id,
            receiver: self.sender.subscribe(),
        }
    }

    /// Returns the number of live subscriptions across all boards.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

#[async_trait]
impl KanbanNotifier for BroadcastNotifier {
    async fn publish(&self, event: &KanbanEvent) -> NotifierResult<()> {
        let payload = event.payload().map_err(|err| NotifierError::Encoding {
            event_name: event.event_name(),
            reason: err.to_string(),
        })?;
        let notification = Notification {
            board_id: event.board_id(),
            event_name: event.event_name(),
            payload,
        };
        if self.sender.send(notification).is_err() {
            debug!(event = event.event_name(), "no board subscribers");
        }
        Ok(())
    }
}

/// Receiving end for one board's notifications.
#[derive(Debug)]
pub struct BoardSubscription {
    board_id: BoardId,
    receiver: broadcast::Receiver<Notification>,
}

impl BoardSubscription {
    /// Returns the observed board.
    #[must_use]
    pub const fn board_id(&self) -> BoardId {
        self.board_id
    }

    /// Waits for the next notification of the observed board.
    ///
    /// Returns `None` once the notifier is dropped. Notifications lost to a
    /// slow consumer are skipped with a warning.
    pub async fn recv(&mut self) -> Option<Notification> {
        loop {
            match self.receiver.recv().await {
                Ok(notification) if notification.board_id == self.board_id => {
                    return Some(notification);
                }
                Ok(_) => {}
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(board_id = %self.board_id, skipped, "board subscriber lagged");
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    /// Returns the next already-buffered notification of the observed board.
    pub fn try_recv(&mut self) -> Option<Notification> {
        loop {
            match self.receiver.try_recv() {
                Ok(notification) if notification.board_id == self.board_id => {
                    return Some(notification);
                }
                Ok(_) => {}
                Err(broadcast::error::TryRecvError::Lagged(skipped)) => {
                    warn!(board_id = %self.board_id, skipped, "board subscriber lagged");
                }
                Err(
                    broadcast::error::TryRecvError::Empty | broadcast::error::TryRecvError::Closed,
                ) => return None,
            }
        }
    }
}

/// Notifier that keeps every published event, for assertions in tests.
#[derive(Debug, Clone, Default)]
pub struct RecordingNotifier {
    events: Arc<Mutex<Vec<KanbanEvent>>>,
}

impl RecordingNotifier {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the recorded events in publish order.
    #[must_use]
    pub fn events(&self) -> Vec<KanbanEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Returns the recorded event names in publish order.
    #[must_use]
    pub fn event_names(&self) -> Vec<&'static str> {
        self.events().iter().map(KanbanEvent::event_name).collect()
    }
}

#[async_trait]
impl KanbanNotifier for RecordingNotifier {
    async fn publish(&self, event: &KanbanEvent) -> NotifierResult<()> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event.clone());
        Ok(())
    }
}

/// Notifier that drops every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopNotifier;

#[async_trait]
impl KanbanNotifier for NoopNotifier {
    async fn publish(&self, _event: &KanbanEvent) -> NotifierResult<()> {
        Ok(())
    }
}
