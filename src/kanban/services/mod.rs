//! Orchestration services for boards and tasks.
//!
//! Services validate input, call a repository and, once the repository
//! call has succeeded, publish a [`crate::kanban::domain::KanbanEvent`].
//! Notifier failures are logged and never undo the mutation.

mod board;
mod error;
mod notify;
mod task;

pub use board::{BoardService, CreateBoardRequest, UpdateBoardRequest};
pub use error::{ErrorKind, KanbanServiceError, KanbanServiceResult};
pub use task::{
    CreateTaskRequest, MoveTaskRequest, TaskDetails, TaskService, UpdateTaskRequest,
};
