//! End-to-end task lifecycle through the board and task services.

use crate::in_memory::helpers::{Kanban, kanban};
use eyre::{ensure, eyre};
use rstest::rstest;
use swimlane::kanban::{
    domain::{Column, HistorySource},
    services::{ErrorKind, MoveTaskRequest},
};

/// Walks a task across every column and checks the audit trail.
#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn task_walks_the_board_and_leaves_an_audit_trail(kanban: Kanban) -> eyre::Result<()> {
    let layout = kanban.board("Release").await?;
    let column_ids: Vec<_> = layout.columns.iter().map(Column::id).collect();
    let (first, rest) = column_ids
        .split_first()
        .ok_or_else(|| eyre!("board has no columns"))?;
    let created = kanban.seed(&layout, *first, &["Cut release branch"]).await?;
    let task = created.first().ok_or_else(|| eyre!("task not created"))?;

    for column_id in rest {
        kanban
            .tasks
            .move_task(task.id(), MoveTaskRequest::new(*column_id, 1, kanban.actor))
            .await?;
    }

    let history = kanban.tasks.task_history(task.id()).await?;
    let statuses: Vec<&str> = history
        .iter()
        .map(|entry| entry.new_status.as_str())
        .collect();
    ensure!(
        statuses == ["Open", "In Progress", "Review", "Testing", "Done"],
        "unexpected status trail {statuses:?}"
    );
    ensure!(
        history
            .iter()
            .skip(1)
            .all(|entry| entry.changed_column() && entry.source == HistorySource::Manual),
        "every move should change column"
    );
    let done = kanban.tasks.get_task(task.id()).await?;
    ensure!(done.status() == "Done", "task should end in Done");
    Ok(())
}

/// Board listings follow column order, then position.
#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn board_listing_is_ordered_by_column_then_position(kanban: Kanban) -> eyre::Result<()> {
    let layout = kanban.board("Ops").await?;
    let to_do = layout.columns.first().ok_or_else(|| eyre!("missing column"))?.id();
    let review = layout.columns.get(2).ok_or_else(|| eyre!("missing column"))?.id();
    kanban.seed(&layout, review, &["R1", "R2"]).await?;
    kanban.seed(&layout, to_do, &["T1", "T2"]).await?;

    let titles: Vec<String> = kanban
        .tasks
        .list_tasks(layout.board.id())
        .await?
        .iter()
        .map(|task| task.title().to_string())
        .collect();

    ensure!(titles == ["T1", "T2", "R1", "R2"], "unexpected order {titles:?}");
    Ok(())
}

/// Boards are isolated: codes are global but positions are per column.
#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn boards_share_codes_but_not_positions(kanban: Kanban) -> eyre::Result<()> {
    let first = kanban.board("First").await?;
    let second = kanban.board("Second").await?;
    let first_column = first.columns.first().ok_or_else(|| eyre!("missing"))?.id();
    let second_column = second.columns.first().ok_or_else(|| eyre!("missing"))?.id();

    let a = kanban.seed(&first, first_column, &["A"]).await?;
    let b = kanban.seed(&second, second_column, &["B"]).await?;

    let codes: Vec<String> = a
        .iter()
        .chain(b.iter())
        .map(|task| task.code().to_string())
        .collect();
    ensure!(codes == ["KAN-0001", "KAN-0002"], "codes {codes:?}");
    ensure!(kanban.positions(first_column).await? == [1], "first board");
    ensure!(kanban.positions(second_column).await? == [1], "second board");
    Ok(())
}

/// Time tracking totals survive moves and disappear with the task.
#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn time_logs_follow_the_task(kanban: Kanban) -> eyre::Result<()> {
    let layout = kanban.board("Tracking").await?;
    let to_do = layout.columns.first().ok_or_else(|| eyre!("missing"))?.id();
    let done = layout.columns.last().ok_or_else(|| eyre!("missing"))?.id();
    let created = kanban.seed(&layout, to_do, &["Audit"]).await?;
    let task = created.first().ok_or_else(|| eyre!("task not created"))?;

    kanban
        .tasks
        .log_time(task.id(), kanban.actor, 90, Some("investigation".to_owned()))
        .await?;
    kanban
        .tasks
        .move_task(task.id(), MoveTaskRequest::new(done, 1, kanban.actor))
        .await?;
    kanban
        .tasks
        .log_time(task.id(), kanban.actor, 15, None)
        .await?;

    ensure!(
        kanban.tasks.total_logged_minutes(task.id()).await? == 105,
        "minutes should accumulate"
    );

    kanban.tasks.delete_task(task.id()).await?;
    let after_delete = kanban.tasks.time_logs(task.id()).await;
    ensure!(
        matches!(after_delete, Err(ref err) if err.kind() == ErrorKind::NotFound),
        "logs should go with the task"
    );
    Ok(())
}
