//! Transaction states, outcomes and snapshots

use veristamp_core::{
    Certificate, Digest, ExErrorKind, QueryOutcome, Rejection, SubmitOutcome, TransportError,
    TxHandle,
};

/// Which user action a transaction is carrying out
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TxAction {
    Certify,
    Verify,
}

impl TxAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            TxAction::Certify => "certify",
            TxAction::Verify => "verify",
        }
    }
}

/// Lifecycle state of the current transaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TxState {
    Idle,
    /// Reading and fingerprinting the selected source
    Hashing {
        source: String,
    },
    /// Digest held, waiting for certify or verify
    Ready {
        digest: Digest,
    },
    /// Request handed to the ledger channel
    Submitting {
        digest: Digest,
        action: TxAction,
    },
    /// Certify request taken by the ledger, waiting for finality
    AwaitingConfirmation {
        digest: Digest,
        handle: TxHandle,
    },
    Confirmed {
        digest: Digest,
        action: TxAction,
    },
    Rejected {
        digest: Digest,
        action: TxAction,
    },
    /// `digest` is `None` when hashing itself failed
    Failed {
        digest: Option<Digest>,
    },
}

impl TxState {
    /// Stable lowercase name, used in transition logs
    pub fn name(&self) -> &'static str {
        match self {
            TxState::Idle => "idle",
            TxState::Hashing { .. } => "hashing",
            TxState::Ready { .. } => "ready",
            TxState::Submitting { .. } => "submitting",
            TxState::AwaitingConfirmation { .. } => "awaiting_confirmation",
            TxState::Confirmed { .. } => "confirmed",
            TxState::Rejected { .. } => "rejected",
            TxState::Failed { .. } => "failed",
        }
    }

    /// Hashing, Submitting or AwaitingConfirmation
    pub fn is_in_flight(&self) -> bool {
        matches!(
            self,
            TxState::Hashing { .. }
                | TxState::Submitting { .. }
                | TxState::AwaitingConfirmation { .. }
        )
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TxState::Confirmed { .. } | TxState::Rejected { .. } | TxState::Failed { .. }
        )
    }

    /// The digest this transaction is working on, once known
    pub fn digest(&self) -> Option<Digest> {
        match self {
            TxState::Idle | TxState::Hashing { .. } => None,
            TxState::Ready { digest }
            | TxState::Submitting { digest, .. }
            | TxState::AwaitingConfirmation { digest, .. }
            | TxState::Confirmed { digest, .. }
            | TxState::Rejected { digest, .. } => Some(*digest),
            TxState::Failed { digest } => *digest,
        }
    }
}

/// Terminal result of a transaction, one variant per user-visible message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TxOutcome {
    /// Certify created this certificate
    Certified(Certificate),
    /// Verify found this certificate
    Verified(Certificate),
    /// Certify lost to an earlier certificate for the same digest
    Duplicate { digest: Digest },
    AuthorizationDenied { digest: Digest, reason: String },
    /// Verify found no certificate
    NotFound { digest: Digest },
    Transport {
        digest: Digest,
        action: TxAction,
        error: TransportError,
    },
    /// The selected source could not be read
    Io { source: String, message: String },
}

impl TxOutcome {
    pub(crate) fn from_submit(digest: Digest, outcome: SubmitOutcome) -> Self {
        match outcome {
            SubmitOutcome::Accepted {
                claimant,
                certified_at,
            } => TxOutcome::Certified(Certificate::new(digest, claimant, certified_at)),
            SubmitOutcome::Rejected(Rejection::DuplicateDigest) => TxOutcome::Duplicate { digest },
            SubmitOutcome::Rejected(Rejection::AuthorizationDenied { reason }) => {
                TxOutcome::AuthorizationDenied { digest, reason }
            }
            SubmitOutcome::Failed(error) => TxOutcome::Transport {
                digest,
                action: TxAction::Certify,
                error,
            },
        }
    }

    /// Outcome of a lookup for `digest`, also used for direct queries that
    /// bypass file selection
    pub fn from_query(digest: Digest, result: Result<QueryOutcome, TransportError>) -> Self {
        match result {
            Ok(QueryOutcome::Found {
                claimant,
                certified_at,
            }) => TxOutcome::Verified(Certificate::new(digest, claimant, certified_at)),
            Ok(QueryOutcome::NotFound) => TxOutcome::NotFound { digest },
            Err(error) => TxOutcome::Transport {
                digest,
                action: TxAction::Verify,
                error,
            },
        }
    }

    /// The terminal state this outcome puts the transaction in
    pub fn terminal_state(&self) -> TxState {
        match self {
            TxOutcome::Certified(cert) => TxState::Confirmed {
                digest: cert.digest,
                action: TxAction::Certify,
            },
            TxOutcome::Verified(cert) => TxState::Confirmed {
                digest: cert.digest,
                action: TxAction::Verify,
            },
            TxOutcome::Duplicate { digest } | TxOutcome::AuthorizationDenied { digest, .. } => {
                TxState::Rejected {
                    digest: *digest,
                    action: TxAction::Certify,
                }
            }
            TxOutcome::NotFound { digest } => TxState::Rejected {
                digest: *digest,
                action: TxAction::Verify,
            },
            TxOutcome::Transport { digest, .. } => TxState::Failed {
                digest: Some(*digest),
            },
            TxOutcome::Io { .. } => TxState::Failed { digest: None },
        }
    }

    /// Error kind for anything other than a confirmation
    pub fn error_kind(&self) -> Option<ExErrorKind> {
        match self {
            TxOutcome::Certified(_) | TxOutcome::Verified(_) => None,
            TxOutcome::Duplicate { .. } => Some(ExErrorKind::DuplicateDigest),
            TxOutcome::AuthorizationDenied { .. } => Some(ExErrorKind::AuthorizationDenied),
            TxOutcome::NotFound { .. } => Some(ExErrorKind::NotFound),
            TxOutcome::Transport { .. } => Some(ExErrorKind::Transport),
            TxOutcome::Io { .. } => Some(ExErrorKind::Io),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            TxOutcome::Certified(_) => "certified",
            TxOutcome::Verified(_) => "verified",
            TxOutcome::Duplicate { .. } => "duplicate_digest",
            TxOutcome::AuthorizationDenied { .. } => "authorization_denied",
            TxOutcome::NotFound { .. } => "not_found",
            TxOutcome::Transport { .. } => "transport_error",
            TxOutcome::Io { .. } => "io_error",
        }
    }
}

/// Value copy of the machine, published on every transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxSnapshot {
    pub generation: u64,
    pub state: TxState,
    /// Set when the transaction reached a terminal state; cleared on reset
    pub last_outcome: Option<TxOutcome>,
}

impl TxSnapshot {
    pub(crate) fn initial() -> Self {
        Self {
            generation: 0,
            state: TxState::Idle,
            last_outcome: None,
        }
    }
}
