//! VeriStamp Store - embedded SQLite ledger
//!
//! Provides:
//! - SQLite schema with a checksummed migrations framework
//! - Claimant registry (authorization token -> claimant)
//! - `SqliteLedger`, a single-node `LedgerChannel` for local use and
//!   integration tests

pub mod claimants;
pub mod db;
pub mod errors;
pub mod ledger;
pub mod migrations;

// Re-export key types
pub use errors::Result;
pub use ledger::SqliteLedger;
