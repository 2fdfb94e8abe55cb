//! When steps for Kanban board BDD scenarios.

use super::world::{KanbanWorld, run_async};
use rstest_bdd_macros::when;
use swimlane::kanban::services::{CreateTaskRequest, MoveTaskRequest};

#[when(r#"task "{title}" is moved to column "{column}" at position {position:u32}"#)]
fn move_task(
    world: &mut KanbanWorld,
    title: String,
    column: String,
    position: u32,
) -> Result<(), eyre::Report> {
    let task_id = world.task(&title)?;
    let request = MoveTaskRequest::new(world.column(&column)?, position, world.actor);
    world.last_error = run_async(world.tasks.move_task(task_id, request)).err();
    Ok(())
}

#[when(r#"task "{title}" is deleted"#)]
fn delete_task(world: &mut KanbanWorld, title: String) -> Result<(), eyre::Report> {
    let task_id = world.task(&title)?;
    world.last_error = run_async(world.tasks.delete_task(task_id)).err();
    Ok(())
}

#[when(r#"column "{column}" is compacted"#)]
fn compact_column(world: &mut KanbanWorld, column: String) -> Result<(), eyre::Report> {
    let column_id = world.column(&column)?;
    world.last_error = run_async(world.tasks.compact_column(column_id, world.actor)).err();
    Ok(())
}

#[when(r#"a task with a blank title is added to column "{column}""#)]
fn add_blank_task(world: &mut KanbanWorld, column: String) -> Result<(), eyre::Report> {
    let request = CreateTaskRequest::new(
        world.layout()?.board.id(),
        world.column(&column)?,
        "   ",
        world.actor,
    );
    world.last_error = run_async(world.tasks.create_task(request)).err();
    Ok(())
}
