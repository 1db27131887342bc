//! Adapter implementations
//!
//! Adapters implement the port traits with concrete technologies:
//! - DuckDB for the durable ledger store
//! - An in-process store used by tests and embedders
//! - The per-account lock manager both stores share

pub mod duckdb;
pub mod locks;
pub mod memory;
