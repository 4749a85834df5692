//! User-facing rendering of transaction outcomes

use crate::machine::state::{TxAction, TxOutcome, TxSnapshot};
use std::fmt;
use veristamp_core::model::TransportFault;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Success,
    /// An expected negative answer (not found, already certified)
    Notice,
    Error,
}

/// Title and message for one terminal outcome
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusReport {
    pub severity: Severity,
    pub title: String,
    pub message: String,
}

impl StatusReport {
    pub fn from_outcome(outcome: &TxOutcome) -> Self {
        match outcome {
            TxOutcome::Certified(cert) => Self::new(
                Severity::Success,
                "Certified",
                format!(
                    "Digest {} is now certified to {} at {}.",
                    cert.digest,
                    cert.claimant,
                    format_timestamp(cert)
                ),
            ),
            TxOutcome::Verified(cert) => Self::new(
                Severity::Success,
                "Certificate found",
                format!(
                    "Digest {} was certified by {} at {}.",
                    cert.digest,
                    cert.claimant,
                    format_timestamp(cert)
                ),
            ),
            TxOutcome::Duplicate { digest } => Self::new(
                Severity::Notice,
                "Already certified",
                format!(
                    "Digest {} already has a certificate; nothing was written. Verify it to see who holds it.",
                    digest
                ),
            ),
            TxOutcome::AuthorizationDenied { reason, .. } => Self::new(
                Severity::Error,
                "Authorization denied",
                format!("The ledger did not accept the authorization: {}.", reason),
            ),
            TxOutcome::NotFound { digest } => Self::new(
                Severity::Notice,
                "No certificate",
                format!("Digest {} has never been certified.", digest),
            ),
            TxOutcome::Transport { action, error, .. } => {
                let verb = match action {
                    TxAction::Certify => "certification",
                    TxAction::Verify => "lookup",
                };
                let hint = match error.fault {
                    TransportFault::Unreachable | TransportFault::Unavailable => {
                        " Check the connection and try again."
                    }
                    TransportFault::MalformedResponse => "",
                };
                Self::new(
                    Severity::Error,
                    "Ledger unavailable",
                    format!("The {} did not complete: {}.{}", verb, error, hint),
                )
            }
            TxOutcome::Io { source, message } => Self::new(
                Severity::Error,
                "Could not read file",
                format!("{} could not be read: {}. Select the file again.", source, message),
            ),
        }
    }

    /// Report for a snapshot's outcome; `None` until a terminal state
    pub fn for_snapshot(snapshot: &TxSnapshot) -> Option<Self> {
        snapshot.last_outcome.as_ref().map(Self::from_outcome)
    }

    fn new(severity: Severity, title: &str, message: String) -> Self {
        Self {
            severity,
            title: title.to_string(),
            message,
        }
    }
}

impl fmt::Display for StatusReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.title, self.message)
    }
}

fn format_timestamp(cert: &veristamp_core::Certificate) -> String {
    cert.certified_at.to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}
