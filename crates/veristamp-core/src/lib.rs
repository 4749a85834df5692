//! VeriStamp Core - proof-of-existence domain kernel
//!
//! This crate provides everything the certification protocol needs that does
//! not orchestrate I/O against a particular ledger:
//! - The fingerprint engine (Keccak-256 content digests)
//! - The certificate / submission / outcome data model
//! - The `LedgerChannel` boundary trait and an in-memory reference ledger
//! - The error facility (`ExError`, `ExErrorKind`, `VeriStampError`)
//! - The structured logging facility
//! - Client configuration

pub mod config;
pub mod errors;
pub mod fingerprint;
pub mod ledger;
pub mod logging_facility;
pub mod model;

/// Re-exported so the logging macros resolve schema constants from any crate
pub use veristamp_core_types as types;

pub use errors::{ExError, ExErrorKind, Result, VeriStampError};
pub use fingerprint::{digest, ByteSource, Fingerprinter};
pub use ledger::{InMemoryLedger, LedgerChannel};
pub use model::{
    Authorization, Certificate, Claimant, Digest, QueryOutcome, Rejection, SubmitOutcome,
    TransportError, TxHandle,
};
