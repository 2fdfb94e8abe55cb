//! In-memory adapters for tests and embedded use.

mod directory;
mod store;

pub use directory::InMemoryUserDirectory;
pub use store::InMemoryKanbanStore;
