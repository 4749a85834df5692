//! Certification state machine
//!
//! One `CertificationMachine` tracks one transaction at a time:
//!
//! ```text
//! Idle -> Hashing -> Ready -> Submitting -> AwaitingConfirmation -> Confirmed | Rejected | Failed
//!                          \-> Submitting (verify) ----------------> Confirmed | Rejected | Failed
//! ```
//!
//! ## Guards
//!
//! - While Hashing, Submitting or AwaitingConfirmation every action except
//!   `abandon` fails with `ERR_BUSY`.
//! - certify/verify need a Ready transaction, anything else is
//!   `ERR_INVALID_STATE`.
//! - Selecting a file from Ready or a terminal state starts a new
//!   transaction (implicit reset).
//!
//! ## Generations
//!
//! Every new transaction gets the next generation number. Each awaited step
//! re-checks the generation it started under before applying its result; a
//! mismatch means the transaction was abandoned meanwhile, so the result is
//! dropped and the caller gets `ERR_SUPERSEDED`. A submission already
//! dispatched to the ledger is never cancelled, only unobserved; its
//! `ERR_SUPERSEDED` carries the ledger handle so the submission can still be
//! looked up. Errors raised after a ledger action starts carry its trace id.
//!
//! The state lock is a plain mutex and is never held across an `.await`.

pub mod report;
pub mod state;

pub use report::{Severity, StatusReport};
pub use state::{TxAction, TxOutcome, TxSnapshot, TxState};

use crate::client::LedgerClient;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::watch;
use tracing::Instrument;
use veristamp_core::types::TraceId;
use veristamp_core::{
    log_transition, Authorization, ByteSource, Digest, ExError, ExErrorKind, VeriStampError,
};

/// Certification state machine over a shared ledger client.
///
/// Clones share the same transaction, so a presentation layer can keep one
/// clone for `abandon`/`snapshot` while another drives `certify`.
#[derive(Clone)]
pub struct CertificationMachine {
    client: LedgerClient,
    shared: Arc<Shared>,
}

struct Shared {
    current: Mutex<TxSnapshot>,
    updates: watch::Sender<TxSnapshot>,
}

impl CertificationMachine {
    pub fn new(client: LedgerClient) -> Self {
        let (updates, _) = watch::channel(TxSnapshot::initial());
        Self {
            client,
            shared: Arc::new(Shared {
                current: Mutex::new(TxSnapshot::initial()),
                updates,
            }),
        }
    }

    pub fn client(&self) -> &LedgerClient {
        &self.client
    }

    pub fn snapshot(&self) -> TxSnapshot {
        self.lock().clone()
    }

    /// Receiver that sees a new snapshot on every transition
    pub fn subscribe(&self) -> watch::Receiver<TxSnapshot> {
        self.shared.updates.subscribe()
    }

    /// Start a new transaction by fingerprinting `source`.
    ///
    /// Returns the snapshot after hashing: Ready, or Failed with an I/O
    /// outcome if the source could not be read.
    ///
    /// # Errors
    ///
    /// `ERR_BUSY` if a transaction is in flight, `ERR_SUPERSEDED` if the
    /// transaction was abandoned before hashing finished.
    pub async fn select_file(&self, source: ByteSource) -> Result<TxSnapshot, ExError> {
        let described = source.describe();
        let generation = {
            let mut tx = self.lock();
            if tx.state.is_in_flight() {
                return Err(busy("select_file", &tx));
            }
            self.begin_generation(
                &mut tx,
                TxState::Hashing {
                    source: described.clone(),
                },
            );
            tx.generation
        };

        let hashed = match tokio::task::spawn_blocking(move || source.digest()).await {
            Ok(Ok(digest)) => Ok(digest),
            Ok(Err(err)) => Err(io_outcome(described, err)),
            Err(join) => Err(TxOutcome::Io {
                source: described,
                message: format!("hashing worker stopped: {}", join),
            }),
        };

        match hashed {
            Ok(digest) => {
                let mut tx = self.lock();
                if tx.generation != generation {
                    return Err(superseded("select_file", generation, &tx));
                }
                self.transition(&mut tx, TxState::Ready { digest });
                Ok(tx.clone())
            }
            Err(outcome) => self.finish("select_file", generation, outcome),
        }
    }

    /// Certify the held digest under `authorization`.
    ///
    /// Returns the terminal snapshot: Confirmed, Rejected (duplicate or
    /// authorization denied) or Failed (transport).
    ///
    /// # Errors
    ///
    /// `ERR_INVALID_STATE` unless Ready, `ERR_BUSY` while in flight,
    /// `ERR_SUPERSEDED` if abandoned before the ledger answered.
    pub async fn certify(&self, authorization: Authorization) -> Result<TxSnapshot, ExError> {
        let (generation, digest) = self.start_ledger_action("certify", TxAction::Certify)?;
        let trace_id = TraceId::new();
        self.run_certify(generation, digest, authorization)
            .instrument(action_span(generation, TxAction::Certify, &trace_id))
            .await
            .map_err(|e| e.with_trace_id(trace_id))
    }

    async fn run_certify(
        &self,
        generation: u64,
        digest: Digest,
        authorization: Authorization,
    ) -> Result<TxSnapshot, ExError> {
        let pending = match self.client.submit(digest, authorization).await {
            Ok(pending) => pending,
            Err(error) => {
                let outcome = TxOutcome::Transport {
                    digest,
                    action: TxAction::Certify,
                    error,
                };
                return self.finish("certify", generation, outcome);
            }
        };

        {
            let mut tx = self.lock();
            if tx.generation != generation {
                tracing::debug!(
                    generation,
                    tx_handle = %pending.handle,
                    "transaction abandoned after dispatch; not awaiting finality"
                );
                return Err(superseded("certify", generation, &tx).with_handle(pending.handle));
            }
            self.transition(
                &mut tx,
                TxState::AwaitingConfirmation {
                    digest,
                    handle: pending.handle.clone(),
                },
            );
        }

        let outcome = self.client.await_outcome(&pending).await;
        self.finish("certify", generation, TxOutcome::from_submit(digest, outcome))
            .map_err(|e| e.with_handle(pending.handle))
    }

    /// Look the held digest up on the ledger.
    ///
    /// Found ends Confirmed, NotFound ends Rejected, a transport failure ends
    /// Failed.
    ///
    /// # Errors
    ///
    /// Same guards as [`CertificationMachine::certify`].
    pub async fn verify(&self) -> Result<TxSnapshot, ExError> {
        let (generation, digest) = self.start_ledger_action("verify", TxAction::Verify)?;
        let trace_id = TraceId::new();
        let result = self
            .client
            .query(digest)
            .instrument(action_span(generation, TxAction::Verify, &trace_id))
            .await;
        self.finish("verify", generation, TxOutcome::from_query(digest, result))
            .map_err(|e| e.with_trace_id(trace_id))
    }

    /// Discard the digest and outcome and return to Idle.
    ///
    /// # Errors
    ///
    /// `ERR_BUSY` while in flight; use `abandon` to detach instead.
    pub fn reset(&self) -> Result<TxSnapshot, ExError> {
        let mut tx = self.lock();
        if tx.state.is_in_flight() {
            return Err(busy("reset", &tx));
        }
        if tx.state != TxState::Idle {
            self.begin_generation(&mut tx, TxState::Idle);
        }
        Ok(tx.clone())
    }

    /// Return to Idle from any state, detaching from whatever is in flight.
    pub fn abandon(&self) -> TxSnapshot {
        let mut tx = self.lock();
        if tx.state.is_in_flight() {
            tracing::info!(
                generation = tx.generation,
                state = tx.state.name(),
                "abandoning in-flight transaction"
            );
        }
        if tx.state != TxState::Idle {
            self.begin_generation(&mut tx, TxState::Idle);
        }
        tx.clone()
    }

    fn start_ledger_action(
        &self,
        op: &'static str,
        action: TxAction,
    ) -> Result<(u64, Digest), ExError> {
        let mut tx = self.lock();
        let digest = match tx.state {
            TxState::Ready { digest } => digest,
            ref state if state.is_in_flight() => return Err(busy(op, &tx)),
            _ => return Err(invalid_state(op, &tx)),
        };
        self.transition(&mut tx, TxState::Submitting { digest, action });
        Ok((tx.generation, digest))
    }

    fn finish(
        &self,
        op: &'static str,
        generation: u64,
        outcome: TxOutcome,
    ) -> Result<TxSnapshot, ExError> {
        let mut tx = self.lock();
        if tx.generation != generation {
            tracing::debug!(
                generation,
                current_generation = tx.generation,
                outcome = outcome.label(),
                "discarding late outcome"
            );
            return Err(superseded(op, generation, &tx));
        }
        let terminal = outcome.terminal_state();
        tx.last_outcome = Some(outcome);
        self.transition(&mut tx, terminal);
        Ok(tx.clone())
    }

    fn begin_generation(&self, tx: &mut TxSnapshot, to: TxState) {
        tx.generation += 1;
        tx.last_outcome = None;
        self.transition(tx, to);
    }

    fn transition(&self, tx: &mut TxSnapshot, to: TxState) {
        log_transition!(tx.generation, tx.state.name(), to.name());
        tx.state = to;
        self.shared.updates.send_replace(tx.clone());
    }

    fn lock(&self) -> MutexGuard<'_, TxSnapshot> {
        // a panic mid-transition leaves a consistent snapshot behind
        self.shared
            .current
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

/// Span joining every ledger log line of one certify or verify
fn action_span(generation: u64, action: TxAction, trace_id: &TraceId) -> tracing::Span {
    tracing::info_span!(
        "tx",
        generation,
        action = action.as_str(),
        trace_id = %trace_id
    )
}

fn io_outcome(source: String, err: VeriStampError) -> TxOutcome {
    let message = match err {
        VeriStampError::Io { message, .. } => message,
        other => other.to_string(),
    };
    TxOutcome::Io { source, message }
}

fn guard_error(kind: ExErrorKind, op: &str, tx: &TxSnapshot) -> ExError {
    let err = ExError::new(kind).with_op(op).with_message(format!(
        "transaction {} is {}",
        tx.generation,
        tx.state.name()
    ));
    match tx.state.digest() {
        Some(digest) => err.with_digest(digest),
        None => err,
    }
}

fn busy(op: &str, tx: &TxSnapshot) -> ExError {
    guard_error(ExErrorKind::Busy, op, tx)
}

fn invalid_state(op: &str, tx: &TxSnapshot) -> ExError {
    guard_error(ExErrorKind::InvalidState, op, tx)
}

fn superseded(op: &str, generation: u64, tx: &TxSnapshot) -> ExError {
    ExError::new(ExErrorKind::Superseded)
        .with_op(op)
        .with_message(format!(
            "transaction {} was replaced by transaction {}",
            generation, tx.generation
        ))
}
