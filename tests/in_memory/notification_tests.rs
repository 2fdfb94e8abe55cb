//! Board observers receive committed changes in order.

use crate::in_memory::helpers::{Kanban, kanban};
use eyre::{ensure, eyre};
use rstest::rstest;
use swimlane::kanban::services::{MoveTaskRequest, UpdateTaskRequest};

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn observers_see_create_update_move_and_delete(kanban: Kanban) -> eyre::Result<()> {
    let layout = kanban.board("Observed").await?;
    let mut subscription = kanban.notifier.subscribe(layout.board.id());
    let to_do = layout.columns.first().ok_or_else(|| eyre!("missing"))?.id();
    let doing = layout.columns.get(1).ok_or_else(|| eyre!("missing"))?.id();

    let created = kanban.seed(&layout, to_do, &["Observe me"]).await?;
    let task = created.first().ok_or_else(|| eyre!("task not created"))?;
    kanban
        .tasks
        .update_task(
            task.id(),
            UpdateTaskRequest {
                priority: Some("high".to_owned()),
                ..UpdateTaskRequest::default()
            },
            kanban.actor,
        )
        .await?;
    kanban
        .tasks
        .move_task(task.id(), MoveTaskRequest::new(doing, 1, kanban.actor))
        .await?;
    kanban.tasks.delete_task(task.id()).await?;

    let mut names = Vec::new();
    while let Some(notification) = subscription.try_recv() {
        if notification.event_name == "kanban:task_moved" {
            ensure!(
                notification.payload["data"]["from"]["position"] == 1,
                "move payload should carry the vacated slot"
            );
            ensure!(
                notification.payload["data"]["task"]["status"] == "In Progress",
                "move payload should carry the new status"
            );
        }
        names.push(notification.event_name);
    }

    ensure!(
        names
            == [
                "kanban:task_created",
                "kanban:task_updated",
                "kanban:task_moved",
                "kanban:task_deleted",
            ],
        "unexpected notifications {names:?}"
    );
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn observers_of_other_boards_hear_nothing(kanban: Kanban) -> eyre::Result<()> {
    let watched = kanban.board("Watched").await?;
    let busy = kanban.board("Busy").await?;
    let mut subscription = kanban.notifier.subscribe(watched.board.id());
    let column_id = busy.columns.first().ok_or_else(|| eyre!("missing"))?.id();

    kanban.seed(&busy, column_id, &["Noise", "More noise"]).await?;

    ensure!(subscription.try_recv().is_none(), "no cross-board leakage");
    Ok(())
}
