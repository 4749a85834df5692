//! Ledger client
//!
//! Thin, checked wrapper over a `LedgerChannel`. Submission and query are
//! kept on separate paths: `submit`/`await_outcome` carry an authorization
//! and wait for finality, `query` is an unauthenticated read.
//!
//! The client never retries and never consults local state to decide
//! uniqueness; the ledger's answer is the answer. What it does check is that
//! each answer belongs to the request it was waiting for.

use std::sync::Arc;
use std::time::Instant;
use veristamp_core::ledger::{FinalityStatus, LedgerChannel, WriteRequest};
use veristamp_core::types::RequestId;
use veristamp_core::{log_op_end, log_op_error, log_op_start};
use veristamp_core::{
    Authorization, Digest, ExError, QueryOutcome, Rejection, SubmitOutcome, TransportError, TxHandle,
};

/// A submission the ledger has taken but not yet finalized
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingSubmission {
    pub handle: TxHandle,
    pub digest: Digest,
}

/// Client for one ledger, cheap to clone and share between transactions
#[derive(Clone)]
pub struct LedgerClient {
    channel: Arc<dyn LedgerChannel>,
}

impl LedgerClient {
    pub fn new(channel: Arc<dyn LedgerChannel>) -> Self {
        Self { channel }
    }

    /// Dispatch a certify request for `digest`.
    ///
    /// Acceptance is asynchronous: the returned submission must be passed to
    /// [`LedgerClient::await_outcome`] to learn what the ledger decided.
    ///
    /// # Errors
    ///
    /// `TransportError` if the request could not be delivered.
    pub async fn submit(
        &self,
        digest: Digest,
        authorization: Authorization,
    ) -> Result<PendingSubmission, TransportError> {
        let request_id = RequestId::new();
        log_op_start!("ledger_submit", request_id = %request_id, digest = %digest);
        let start = Instant::now();

        let handle = self
            .channel
            .write(WriteRequest {
                digest,
                authorization,
            })
            .await
            .map_err(|e| {
                log_op_error!(
                    "ledger_submit",
                    ExError::from(e.clone()).with_request_id(request_id.clone()),
                    duration_ms = start.elapsed().as_millis() as u64,
                    digest = %digest
                );
                e
            })?;

        log_op_end!(
            "ledger_submit",
            duration_ms = start.elapsed().as_millis() as u64,
            request_id = %request_id,
            digest = %digest,
            tx_handle = %handle
        );

        Ok(PendingSubmission { handle, digest })
    }

    /// Suspend until the ledger finalizes `pending`.
    ///
    /// No timeout is applied; callers that want to stop waiting drop the
    /// future (or abandon the transaction driving it).
    pub async fn await_outcome(&self, pending: &PendingSubmission) -> SubmitOutcome {
        let request_id = RequestId::new();
        log_op_start!(
            "ledger_await",
            request_id = %request_id,
            digest = %pending.digest,
            tx_handle = %pending.handle
        );
        let start = Instant::now();

        let outcome = match self.channel.finality(&pending.handle).await {
            Ok(receipt) if receipt.handle != pending.handle => {
                SubmitOutcome::Failed(TransportError::malformed(format!(
                    "receipt for {} while awaiting {}",
                    receipt.handle, pending.handle
                )))
            }
            Ok(receipt) => outcome_from_status(pending, receipt.status),
            Err(e) => SubmitOutcome::Failed(e),
        };

        match &outcome {
            SubmitOutcome::Failed(e) => log_op_error!(
                "ledger_await",
                ExError::from(e.clone())
                    .with_request_id(request_id)
                    .with_handle(pending.handle.clone()),
                duration_ms = start.elapsed().as_millis() as u64,
                digest = %pending.digest
            ),
            other => log_op_end!(
                "ledger_await",
                duration_ms = start.elapsed().as_millis() as u64,
                request_id = %request_id,
                digest = %pending.digest,
                tx_handle = %pending.handle,
                outcome = other.label()
            ),
        }

        outcome
    }

    /// Submit and await in one call. A delivery failure becomes
    /// `SubmitOutcome::Failed` like any other transport fault.
    pub async fn certify(&self, digest: Digest, authorization: Authorization) -> SubmitOutcome {
        match self.submit(digest, authorization).await {
            Ok(pending) => self.await_outcome(&pending).await,
            Err(e) => SubmitOutcome::Failed(e),
        }
    }

    /// Look up the certificate for `digest`. Needs no authorization.
    ///
    /// May be stale with respect to in-flight submissions.
    ///
    /// # Errors
    ///
    /// `TransportError` if the ledger could not be read, or answered for a
    /// different digest.
    pub async fn query(&self, digest: Digest) -> Result<QueryOutcome, TransportError> {
        let request_id = RequestId::new();
        log_op_start!("ledger_query", request_id = %request_id, digest = %digest);
        let start = Instant::now();

        let result = match self.channel.read(&digest).await {
            Ok(Some(cert)) if cert.digest != digest => Err(TransportError::malformed(format!(
                "certificate for {} returned for {}",
                cert.digest, digest
            ))),
            Ok(cert) => Ok(QueryOutcome::from(cert)),
            Err(e) => Err(e),
        };

        match &result {
            Ok(outcome) => log_op_end!(
                "ledger_query",
                duration_ms = start.elapsed().as_millis() as u64,
                request_id = %request_id,
                digest = %digest,
                outcome = outcome.label()
            ),
            Err(e) => log_op_error!(
                "ledger_query",
                ExError::from(e.clone()).with_request_id(request_id),
                duration_ms = start.elapsed().as_millis() as u64,
                digest = %digest
            ),
        }

        result
    }
}

fn outcome_from_status(pending: &PendingSubmission, status: FinalityStatus) -> SubmitOutcome {
    match status {
        FinalityStatus::Accepted(cert) if cert.digest != pending.digest => {
            SubmitOutcome::Failed(TransportError::malformed(format!(
                "certificate for {} reported for submission of {}",
                cert.digest, pending.digest
            )))
        }
        FinalityStatus::Accepted(cert) => SubmitOutcome::Accepted {
            claimant: cert.claimant,
            certified_at: cert.certified_at,
        },
        FinalityStatus::Duplicate => SubmitOutcome::Rejected(Rejection::DuplicateDigest),
        FinalityStatus::AuthorizationDenied { reason } => {
            SubmitOutcome::Rejected(Rejection::AuthorizationDenied { reason })
        }
    }
}
