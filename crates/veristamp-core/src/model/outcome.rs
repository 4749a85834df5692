//! Outcomes of ledger operations as seen by the client
//!
//! These are values, not errors: a duplicate digest or a missing certificate
//! is an expected answer from the ledger. Only misuse of the client API is
//! reported through `Err`.

use crate::errors::{ExError, ExErrorKind};
use crate::model::{Certificate, Claimant};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Category of channel failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransportFault {
    /// Request could not be delivered (partition, refused connection)
    Unreachable,
    /// Ledger reachable but not serving requests
    Unavailable,
    /// A response arrived but cannot be trusted or decoded
    MalformedResponse,
}

/// The channel to the ledger failed. Retryable by re-issuing the operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransportError {
    pub fault: TransportFault,
    pub reason: String,
}

impl TransportError {
    pub fn unreachable(reason: impl Into<String>) -> Self {
        Self {
            fault: TransportFault::Unreachable,
            reason: reason.into(),
        }
    }

    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self {
            fault: TransportFault::Unavailable,
            reason: reason.into(),
        }
    }

    pub fn malformed(reason: impl Into<String>) -> Self {
        Self {
            fault: TransportFault::MalformedResponse,
            reason: reason.into(),
        }
    }
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let fault = match self.fault {
            TransportFault::Unreachable => "ledger unreachable",
            TransportFault::Unavailable => "ledger unavailable",
            TransportFault::MalformedResponse => "malformed ledger response",
        };
        write!(f, "{}: {}", fault, self.reason)
    }
}

impl std::error::Error for TransportError {}

impl From<TransportError> for ExError {
    fn from(err: TransportError) -> Self {
        ExError::new(ExErrorKind::Transport).with_message(err.to_string())
    }
}

/// Why the ledger refused to create a certificate
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Rejection {
    /// A certificate for this digest existed before this submission
    DuplicateDigest,
    /// The claimant authorization was not accepted
    AuthorizationDenied { reason: String },
}

impl Rejection {
    pub fn kind(&self) -> ExErrorKind {
        match self {
            Rejection::DuplicateDigest => ExErrorKind::DuplicateDigest,
            Rejection::AuthorizationDenied { .. } => ExErrorKind::AuthorizationDenied,
        }
    }
}

/// Final answer for one certify submission
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SubmitOutcome {
    /// This submission created the certificate
    Accepted {
        claimant: Claimant,
        certified_at: DateTime<Utc>,
    },
    Rejected(Rejection),
    Failed(TransportError),
}

impl SubmitOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, SubmitOutcome::Accepted { .. })
    }

    /// Short label for logs
    pub fn label(&self) -> &'static str {
        match self {
            SubmitOutcome::Accepted { .. } => "accepted",
            SubmitOutcome::Rejected(Rejection::DuplicateDigest) => "duplicate_digest",
            SubmitOutcome::Rejected(Rejection::AuthorizationDenied { .. }) => {
                "authorization_denied"
            }
            SubmitOutcome::Failed(_) => "transport_error",
        }
    }
}

/// Answer to a read-only certificate lookup
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum QueryOutcome {
    Found {
        claimant: Claimant,
        certified_at: DateTime<Utc>,
    },
    NotFound,
}

impl QueryOutcome {
    pub fn is_found(&self) -> bool {
        matches!(self, QueryOutcome::Found { .. })
    }

    pub fn label(&self) -> &'static str {
        match self {
            QueryOutcome::Found { .. } => "found",
            QueryOutcome::NotFound => "not_found",
        }
    }
}

impl From<Option<Certificate>> for QueryOutcome {
    fn from(cert: Option<Certificate>) -> Self {
        match cert {
            Some(c) => QueryOutcome::Found {
                claimant: c.claimant,
                certified_at: c.certified_at,
            },
            None => QueryOutcome::NotFound,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Digest;

    #[test]
    fn test_rejection_kinds_are_distinct_from_transport() {
        assert_eq!(Rejection::DuplicateDigest.kind(), ExErrorKind::DuplicateDigest);
        assert_ne!(Rejection::DuplicateDigest.kind(), ExErrorKind::Transport);
    }

    #[test]
    fn test_query_outcome_from_certificate() {
        let cert = Certificate::new(
            Digest::from_bytes([2; 32]),
            Claimant::new("0xA11CE"),
            Utc::now(),
        );
        let outcome = QueryOutcome::from(Some(cert.clone()));
        assert_eq!(
            outcome,
            QueryOutcome::Found {
                claimant: cert.claimant,
                certified_at: cert.certified_at
            }
        );
        assert_eq!(QueryOutcome::from(None), QueryOutcome::NotFound);
    }

    #[test]
    fn test_transport_error_display_names_fault() {
        let err = TransportError::unreachable("connection refused");
        assert_eq!(err.to_string(), "ledger unreachable: connection refused");
    }
}
