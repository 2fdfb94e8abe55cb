//! Kanban boards, columns and tasks.
//!
//! The module follows hexagonal architecture:
//!
//! - Domain types and the position ledger in [`domain`]
//! - Port contracts in [`ports`]
//! - Adapter implementations in [`adapters`]
//! - Orchestration services in [`services`]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;

#[cfg(test)]
mod tests;
