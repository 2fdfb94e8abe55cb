//! Parallel writers against the row-locked `PostgreSQL` store.

use std::collections::HashSet;
use std::sync::Arc;

use crate::postgres::helpers::{BoxError, PgKanban, column_at, pg_kanban};
use rstest::rstest;
use swimlane::kanban::services::{CreateTaskRequest, MoveTaskRequest};
use tokio::task::JoinSet;

fn is_dense(column: &[(String, u32)]) -> bool {
    u32::try_from(column.len())
        .is_ok_and(|len| column.iter().map(|(_, position)| *position).eq(1..=len))
}

#[rstest]
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn parallel_creates_get_unique_codes_and_tail_slots(
    #[future] pg_kanban: Result<PgKanban, BoxError>,
) -> Result<(), BoxError> {
    let kanban = pg_kanban.await?;
    let layout = kanban.board("Parallel").await?;
    let column_id = column_at(&layout, 0)?;

    let mut writers = JoinSet::new();
    for index in 0..12 {
        let service = Arc::clone(&kanban.tasks);
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
        codes.insert(joined??.code());
    }

    assert_eq!(codes.len(), 12);
    let column = kanban.column(column_id).await?;
    assert!(is_dense(&column), "column is not dense: {column:?}");
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn parallel_moves_keep_columns_dense(
    #[future] pg_kanban: Result<PgKanban, BoxError>,
) -> Result<(), BoxError> {
    let kanban = pg_kanban.await?;
    let layout = kanban.board("Shuffle").await?;
    let column_ids = [
        column_at(&layout, 0)?,
        column_at(&layout, 1)?,
        column_at(&layout, 2)?,
    ];
    let mut seeded = Vec::new();
    for column_id in column_ids {
        seeded.extend(kanban.seed(&layout, column_id, &["a", "b", "c"]).await?);
    }

    let mut movers = JoinSet::new();
    let targets = column_ids.iter().cycle().skip(1);
    let positions = [1_u32, 3, 2, 5].into_iter().cycle();
    for ((task, target), position) in seeded.iter().zip(targets).zip(positions) {
        let service = Arc::clone(&kanban.tasks);
        let task_id = task.id();
        let request = MoveTaskRequest::new(*target, position, kanban.actor);
        movers.spawn(async move { service.move_task(task_id, request).await });
    }
    while let Some(joined) = movers.join_next().await {
        joined??;
    }

    let mut total = 0;
    for column_id in column_ids {
        let column = kanban.column(column_id).await?;
        assert!(is_dense(&column), "column is not dense: {column:?}");
        total += column.len();
    }
    assert_eq!(total, seeded.len());
    Ok(())
}
