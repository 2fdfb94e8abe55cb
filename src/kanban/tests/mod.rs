//! Unit tests for the Kanban module.
//!
//! Ledger planning is tested in isolation; service tests run against the
//! in-memory store so ordering rules are checked end to end.
