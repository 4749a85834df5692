//! Boundary with the external ledger
//!
//! The ledger itself (consensus, execution, storage) is out of reach of the
//! client. All the client relies on is this contract:
//!
//! - `write` is applied atomically and the ledger, not the client, enforces
//!   at most one certificate per digest;
//! - `finality` eventually reports exactly one receipt per handle, with a
//!   structured duplicate signal rather than free text;
//! - `read` needs no authorization and never reports a certificate the ledger
//!   does not hold.

use crate::model::{Authorization, Certificate, Digest, TransportError, TxHandle};
use async_trait::async_trait;
use std::sync::Arc;

/// One certify request as dispatched to the ledger
#[derive(Debug, Clone)]
pub struct WriteRequest {
    pub digest: Digest,
    pub authorization: Authorization,
}

/// Final state of a submission as recorded by the ledger
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FinalityStatus {
    /// The submission created this certificate
    Accepted(Certificate),
    /// A certificate for the digest already existed; nothing was written
    Duplicate,
    AuthorizationDenied { reason: String },
}

impl FinalityStatus {
    pub fn label(&self) -> &'static str {
        match self {
            FinalityStatus::Accepted(_) => "accepted",
            FinalityStatus::Duplicate => "duplicate",
            FinalityStatus::AuthorizationDenied { .. } => "denied",
        }
    }
}

/// Ledger answer for one handle. Always echoes the handle it answers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinalityReceipt {
    pub handle: TxHandle,
    pub status: FinalityStatus,
}

/// Opaque asynchronous request/response channel to a ledger.
///
/// Implementations must be safe to share between independent transactions:
/// every call is answered for its own request only.
#[async_trait]
pub trait LedgerChannel: Send + Sync {
    /// Dispatch a certify request. Returning a handle only means the ledger
    /// took the request, not that a certificate exists.
    async fn write(&self, request: WriteRequest) -> Result<TxHandle, TransportError>;

    /// Suspend until the submission behind `handle` is final.
    ///
    /// No upper bound on latency is assumed.
    async fn finality(&self, handle: &TxHandle) -> Result<FinalityReceipt, TransportError>;

    /// Latest finalized certificate for `digest`, if any
    async fn read(&self, digest: &Digest) -> Result<Option<Certificate>, TransportError>;
}

#[async_trait]
impl<T: LedgerChannel + ?Sized> LedgerChannel for Arc<T> {
    async fn write(&self, request: WriteRequest) -> Result<TxHandle, TransportError> {
        (**self).write(request).await
    }

    async fn finality(&self, handle: &TxHandle) -> Result<FinalityReceipt, TransportError> {
        (**self).finality(handle).await
    }

    async fn read(&self, digest: &Digest) -> Result<Option<Certificate>, TransportError> {
        (**self).read(digest).await
    }
}
