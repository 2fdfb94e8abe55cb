//! Port contracts for the Kanban core.
//!
//! Ports define infrastructure-agnostic interfaces used by Kanban services.

pub mod directory;
pub mod notifier;
pub mod repository;

pub use directory::{UserDirectory, UserDirectoryError, UserDirectoryResult, UserProfile};
pub use notifier::{KanbanNotifier, NotifierError, NotifierResult};
pub use repository::{
    BoardRepository, KanbanRepositoryError, KanbanRepositoryResult, LockChange, Relocation,
    RelocateTask, TaskRepository, TimeLogRepository,
};
