//! Ledger channel implementations backed by the store

mod sqlite_ledger;

pub use sqlite_ledger::SqliteLedger;
