//! Parallel writers must never break column density or code uniqueness.

use std::collections::HashSet;
use std::sync::Arc;

use crate::in_memory::helpers::{Kanban, kanban};
use eyre::{ensure, eyre};
use rstest::rstest;
use swimlane::kanban::{
    domain::{Column, ColumnId},
    services::{CreateTaskRequest, MoveTaskRequest},
};
use tokio::task::JoinSet;

fn is_dense(positions: &[u32]) -> bool {
    u32::try_from(positions.len()).is_ok_and(|len| positions.iter().copied().eq(1..=len))
}

#[rstest]
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn parallel_creates_fill_the_column_tail(kanban: Kanban) -> eyre::Result<()> {
    let layout = kanban.board("Parallel").await?;
    let column_id = layout.columns.first().ok_or_else(|| eyre!("missing"))?.id();
    let tasks = Arc::clone(&kanban.tasks);

    let mut writers = JoinSet::new();
    for index in 0..24 {
        let service = Arc::clone(&tasks);
        let request = CreateTaskRequest::new(
            layout.board.id(),
            column_id,
            format!("task {index}"),
            kanban.actor,
        );
        writers.spawn(async move { service.create_task(request).await });
    }

    let mut codes = HashSet::new();
    while let Some(joined) = writers.join_next().await {
        let task = joined??;
        codes.insert(task.code());
    }

    ensure!(codes.len() == 24, "codes must be unique");
    let positions = kanban.positions(column_id).await?;
    ensure!(is_dense(&positions), "positions {positions:?} are not dense");
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn parallel_moves_keep_every_column_dense(kanban: Kanban) -> eyre::Result<()> {
    let layout = kanban.board("Shuffle").await?;
    let column_ids: Vec<ColumnId> = layout.columns.iter().take(3).map(Column::id).collect();
    let mut seeded = Vec::new();
    for column_id in &column_ids {
        seeded.extend(
            kanban
                .seed(&layout, *column_id, &["a", "b", "c", "d"])
                .await?,
        );
    }
    let tasks = Arc::clone(&kanban.tasks);

    let mut movers = JoinSet::new();
    let targets = column_ids.iter().cycle().step_by(7);
    let positions = (1..=6_u32).cycle();
    for ((task, target), position) in seeded.iter().cycle().zip(targets).zip(positions).take(60) {
        let service = Arc::clone(&tasks);
        let task_id = task.id();
        let request = MoveTaskRequest::new(*target, position, kanban.actor);
        movers.spawn(async move { service.move_task(task_id, request).await });
    }
    while let Some(joined) = movers.join_next().await {
        joined??;
    }

    let mut total = 0;
    for column_id in &column_ids {
        let positions = kanban.positions(*column_id).await?;
        ensure!(is_dense(&positions), "positions {positions:?} are not dense");
        total += positions.len();
    }
    ensure!(total == seeded.len(), "tasks were lost or duplicated");
    Ok(())
}
