//! Ledger boundary
//!
//! `LedgerChannel` is the only way the client reaches a ledger.
//! `InMemoryLedger` is the reference implementation used in tests and
//! demos; the SQLite-backed ledger lives in `veristamp-store`.

pub mod channel;
pub mod clock;
pub mod memory;

pub use channel::{FinalityReceipt, FinalityStatus, LedgerChannel, WriteRequest};
pub use clock::next_certified_at;
pub use memory::{AuthorizationPolicy, InMemoryLedger};
