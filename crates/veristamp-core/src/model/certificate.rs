//! Ledger-resident certificate record

use crate::model::Digest;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identity a certificate is attributed to.
///
/// Opaque to the client: whatever reference the ledger derives from the
/// authorization (an account address, a registered name).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Claimant(String);

impl Claimant {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Claimant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Binding of a digest to its first claimant and the time the ledger accepted it.
///
/// Only the ledger creates these. Client code receives copies from `read` or
/// from a finality receipt and must not treat a held copy as authoritative.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Certificate {
    pub digest: Digest,
    pub claimant: Claimant,
    pub certified_at: DateTime<Utc>,
}

impl Certificate {
    pub fn new(digest: Digest, claimant: Claimant, certified_at: DateTime<Utc>) -> Self {
        Self {
            digest,
            claimant,
            certified_at,
        }
    }
}
