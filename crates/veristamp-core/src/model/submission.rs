//! Submission-side types: claimant authorization and ledger handles

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;
use veristamp_core_types::Sensitive;

/// Claimant authorization produced by an external identity provider.
///
/// The client never looks inside; it is forwarded to the ledger as-is. The
/// bytes are redacted from every `Debug`/`Display` rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Authorization(Sensitive<Vec<u8>>);

impl Authorization {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(Sensitive::new(bytes.into()))
    }

    /// Convenience for text tokens (CLI flags, test fixtures)
    pub fn from_token(token: &str) -> Self {
        Self::new(token.as_bytes().to_vec())
    }

    pub fn expose(&self) -> &[u8] {
        self.0.expose()
    }
}

/// Ledger-issued identifier for one dispatched submission
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TxHandle(String);

impl TxHandle {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Fresh time-ordered handle, for ledgers that mint their own
    pub fn generate() -> Self {
        Self(Uuid::now_v7().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TxHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
