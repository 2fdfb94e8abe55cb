//! Swimlane: the core of a Kanban board.
//!
//! Boards own an ordered set of columns and columns own a dense, ordered set
//! of tasks. The crate keeps that ordering consistent under concurrent moves,
//! records an audit row for every task transition and fans committed changes
//! out to board observers.
//!
//! # Architecture
//!
//! Swimlane follows hexagonal architecture principles:
//!
//! - **Domain**: Pure business logic with no infrastructure dependencies
//! - **Ports**: Abstract trait interfaces for storage, identity and
//!   notification
//! - **Adapters**: In-memory and `PostgreSQL` stores, broadcast notifier
//! - **Services**: Orchestration of boards and tasks
//!
//! # Modules
//!
//! - [`kanban`]: Boards, columns, tasks, the position ledger and history
//! - [`config`]: Runtime configuration and resource construction

pub mod config;
pub mod kanban;
