//! Post-commit event dispatch.

use crate::kanban::{domain::KanbanEvent, ports::KanbanNotifier};
use tracing::{debug, warn};

/// Publishes `event`, logging and dropping any notifier failure.
pub(super) async fn dispatch<N>(notifier: &N, event: KanbanEvent)
where
    N: KanbanNotifier + ?Sized,
{
    match notifier.publish(&event).await {
        Ok(()) => debug!(
            event = event.event_name(),
            board_id = %event.board_id(),
            "kanban event published"
        ),
        Err(err) => warn!(
            event = event.event_name(),
            board_id = %event.board_id(),
            error = %err,
            "kanban event dropped"
        ),
    }
}
