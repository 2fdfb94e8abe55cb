//! Then steps for Kanban board BDD scenarios.

use super::world::{KanbanWorld, list_items, run_async};
use rstest_bdd_macros::then;
use swimlane::kanban::services::ErrorKind;

#[then(r#"column "{column}" lists "{titles}""#)]
fn column_lists(world: &KanbanWorld, column: String, titles: String) -> Result<(), eyre::Report> {
    let tasks = world.column_tasks(&column)?;
    let actual: Vec<String> = tasks
        .iter()
        .map(|task| task.title().as_str().to_owned())
        .collect();
    let expected = list_items(&titles);
    if actual != expected {
        return Err(eyre::eyre!(
            "column {column}: expected {expected:?}, found {actual:?}"
        ));
    }
    let positions: Vec<u32> = tasks
        .iter()
        .map(|task| task.position().value())
        .collect();
    if !positions.iter().copied().eq(1..=u32::try_from(positions.len())?) {
        return Err(eyre::eyre!("column {column} is not dense: {positions:?}"));
    }
    Ok(())
}

#[then(r#"column "{column}" is empty"#)]
fn column_is_empty(world: &KanbanWorld, column: String) -> Result<(), eyre::Report> {
    let tasks = world.column_tasks(&column)?;
    if !tasks.is_empty() {
        return Err(eyre::eyre!("column {column} holds {} tasks", tasks.len()));
    }
    Ok(())
}

#[then(r#"column "{column}" has positions "{positions}""#)]
fn column_has_positions(
    world: &KanbanWorld,
    column: String,
    positions: String,
) -> Result<(), eyre::Report> {
    let actual: Vec<String> = world
        .column_tasks(&column)?
        .iter()
        .map(|task| task.position().to_string())
        .collect();
    let expected = list_items(&positions);
    if actual != expected {
        return Err(eyre::eyre!(
            "column {column}: expected positions {expected:?}, found {actual:?}"
        ));
    }
    Ok(())
}

#[then(r#"task "{title}" has status "{status}""#)]
fn task_has_status(world: &KanbanWorld, title: String, status: String) -> Result<(), eyre::Report> {
    let task = run_async(world.tasks.get_task(world.task(&title)?))?;
    if task.status() != status {
        return Err(eyre::eyre!(
            "task {title}: expected status {status}, found {}",
            task.status()
        ));
    }
    Ok(())
}

#[then(r#"task "{title}" has {count:usize} history entries"#)]
fn task_has_history(world: &KanbanWorld, title: String, count: usize) -> Result<(), eyre::Report> {
    let history = run_async(world.tasks.task_history(world.task(&title)?))?;
    if history.len() != count {
        return Err(eyre::eyre!(
            "task {title}: expected {count} history entries, found {}",
            history.len()
        ));
    }
    Ok(())
}

#[then(r#"the last operation is rejected as "{kind}""#)]
fn last_operation_rejected(world: &KanbanWorld, kind: String) -> Result<(), eyre::Report> {
    let expected = match kind.as_str() {
        "not found" => ErrorKind::NotFound,
        "invalid input" => ErrorKind::InvalidInput,
        "forbidden" => ErrorKind::Forbidden,
        "internal" => ErrorKind::Internal,
        other => return Err(eyre::eyre!("unknown error kind in scenario: {other}")),
    };
    let error = world
        .last_error
        .as_ref()
        .ok_or_else(|| eyre::eyre!("expected the last operation to fail"))?;
    if error.kind() != expected {
        return Err(eyre::eyre!("expected {expected:?}, got {error:?}"));
    }
    Ok(())
}
