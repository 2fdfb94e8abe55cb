//! Given steps for Kanban board BDD scenarios.

use super::world::{KanbanWorld, list_items, run_async};
use eyre::WrapErr;
use rstest_bdd_macros::given;
use swimlane::kanban::services::{CreateBoardRequest, CreateTaskRequest};

#[given(r#"a board named "{name}""#)]
fn board_named(world: &mut KanbanWorld, name: String) -> Result<(), eyre::Report> {
    let layout = run_async(
        world
            .boards
            .create_board(CreateBoardRequest::new(name, world.actor)),
    )
    .wrap_err("create board for scenario")?;
    world.layout = Some(layout);
    Ok(())
}

#[given(r#"column "{column}" holds tasks "{titles}""#)]
fn column_holds_tasks(
    world: &mut KanbanWorld,
    column: String,
    titles: String,
) -> Result<(), eyre::Report> {
    let board_id = world.layout()?.board.id();
    let column_id = world.column(&column)?;
    for title in list_items(&titles) {
        let request = CreateTaskRequest::new(board_id, column_id, title.clone(), world.actor);
        let task = run_async(world.tasks.create_task(request))
            .wrap_err_with(|| format!("seed task {title}"))?;
        world.tasks_by_title.insert(title, task.id());
    }
    Ok(())
}

#[given(r#"task "{title}" is locked"#)]
fn task_is_locked(world: &mut KanbanWorld, title: String) -> Result<(), eyre::Report> {
    let task_id = world.task(&title)?;
    run_async(world.tasks.set_locked(task_id, true, world.actor)).wrap_err("lock task")?;
    Ok(())
}
