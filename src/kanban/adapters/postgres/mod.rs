//! `PostgreSQL` adapters for Kanban persistence.

mod models;
mod repository;
mod schema;
mod tasks;

pub use repository::{KanbanPgPool, PostgresKanbanStore};
