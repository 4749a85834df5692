//! VeriStamp Engine - Orchestration layer
//!
//! Coordinates the fingerprint engine and a ledger channel on behalf of the
//! presentation layer:
//! - `LedgerClient`: submit / await / query against any `LedgerChannel`
//! - `CertificationMachine`: per-transaction lifecycle with the busy guard
//!   and late-outcome discard
//!
//! ## Logging Ownership
//!
//! The engine owns lifecycle logging for ledger operations (`log_op_start!`,
//! `log_op_end!`, `log_op_error!`) and for state transitions
//! (`log_transition!`). Ledger implementations log only at debug level.

pub mod client;
pub mod machine;

pub use client::{LedgerClient, PendingSubmission};
pub use machine::{
    CertificationMachine, Severity, StatusReport, TxAction, TxOutcome, TxSnapshot, TxState,
};
