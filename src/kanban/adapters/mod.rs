//! Adapter implementations for the Kanban ports.
//!
//! - [`memory::InMemoryKanbanStore`]: single-lock store for tests
//! - [`postgres::PostgresKanbanStore`]: Diesel-backed production store that
//!   serialises moves with row locks on the affected columns
//! - [`notifier::BroadcastNotifier`]: in-process fan-out to board observers

pub mod memory;
pub mod notifier;
pub mod postgres;
