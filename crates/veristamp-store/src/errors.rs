//! Error handling for veristamp-store
//!
//! Store operations return `ExError`; at the ledger boundary they are folded
//! into `TransportError` because, seen from the client, a broken database is
//! an unavailable ledger.

use veristamp_core::errors::{ExError, ExErrorKind};
use veristamp_core::TransportError;

/// Result type alias using ExError
pub type Result<T> = std::result::Result<T, ExError>;

/// Create a migration error
pub fn migration_error(migration_id: &str, reason: &str) -> ExError {
    ExError::new(ExErrorKind::Persistence)
        .with_op("migration")
        .with_message(format!("Migration {} failed: {}", migration_id, reason))
}

/// Create a checksum mismatch error
pub fn checksum_mismatch(migration_id: &str, expected: &str, actual: &str) -> ExError {
    ExError::new(ExErrorKind::Persistence)
        .with_op("migration_checksum")
        .with_message(format!(
            "Checksum mismatch for migration {}: recorded {}, embedded {}",
            migration_id, expected, actual
        ))
}

/// Create a duplicate registration error
pub fn already_exists(op: &str, reason: impl Into<String>) -> ExError {
    ExError::new(ExErrorKind::AlreadyExists)
        .with_op(op.to_string())
        .with_message(reason)
}

/// Create an input validation error
pub fn invalid_input(op: &str, reason: impl Into<String>) -> ExError {
    ExError::new(ExErrorKind::InvalidInput)
        .with_op(op.to_string())
        .with_message(reason)
}

/// Stored data that cannot be decoded back into the model
pub fn corrupt_row(what: &str, detail: impl std::fmt::Display) -> ExError {
    ExError::new(ExErrorKind::Persistence)
        .with_op("decode_row")
        .with_message(format!("Corrupt {}: {}", what, detail))
}

/// Create a database error from rusqlite::Error
pub fn from_rusqlite(err: rusqlite::Error) -> ExError {
    ExError::new(ExErrorKind::Persistence)
        .with_op("sqlite")
        .with_message(err.to_string())
}

/// Create an IO error
pub fn io_error(operation: &str, err: std::io::Error) -> ExError {
    ExError::new(ExErrorKind::Io)
        .with_op(operation.to_string())
        .with_message(err.to_string())
}

/// Fold a store failure into the boundary's transport error
pub fn unavailable(err: ExError) -> TransportError {
    TransportError::unavailable(err.to_string())
}
