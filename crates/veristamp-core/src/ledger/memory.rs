//! In-process reference ledger
//!
//! Serializes every write behind one async mutex, which is all the atomicity
//! the boundary contract asks for. Submissions stay pending until a "block"
//! is produced; blocks apply pending submissions in arrival order, so two
//! racing certify requests for one digest resolve by ledger order, never by
//! which client happens to await first.
//!
//! Besides backing tests, it carries the fault knobs the state machine needs
//! exercising against: an unreachable channel, held requests, held
//! finality, a fixed finality delay.

use crate::ledger::channel::{
    FinalityReceipt, FinalityStatus, LedgerChannel, WriteRequest,
};
use crate::ledger::clock::next_certified_at;
use crate::model::{Certificate, Claimant, Digest, TransportError, TxHandle};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::{watch, Mutex};

/// How the ledger turns an authorization into a claimant
#[derive(Debug, Clone)]
pub enum AuthorizationPolicy {
    /// Any non-empty token is accepted; the claimant is the token text
    AcceptAll,
    /// Only listed tokens are accepted, each bound to its claimant
    AllowList(HashMap<Vec<u8>, Claimant>),
}

impl AuthorizationPolicy {
    fn resolve(&self, token: &[u8]) -> Result<Claimant, String> {
        match self {
            AuthorizationPolicy::AcceptAll if token.is_empty() => {
                Err("empty authorization".to_string())
            }
            AuthorizationPolicy::AcceptAll => {
                Ok(Claimant::new(String::from_utf8_lossy(token).into_owned()))
            }
            AuthorizationPolicy::AllowList(tokens) => tokens
                .get(token)
                .cloned()
                .ok_or_else(|| "authorization not recognised".to_string()),
        }
    }
}

struct PendingWrite {
    handle: TxHandle,
    digest: Digest,
    claimant: Result<Claimant, String>,
}

#[derive(Default)]
struct LedgerState {
    certificates: HashMap<Digest, Certificate>,
    pending: BTreeMap<u64, PendingWrite>,
    finalized: HashMap<TxHandle, FinalityStatus>,
    next_seq: u64,
    last_certified_at: Option<DateTime<Utc>>,
}

impl LedgerState {
    /// Apply every pending submission in sequence order
    fn produce_block(&mut self) {
        let pending = std::mem::take(&mut self.pending);
        for (_, write) in pending {
            let status = match write.claimant {
                Err(reason) => FinalityStatus::AuthorizationDenied { reason },
                Ok(_) if self.certificates.contains_key(&write.digest) => {
                    FinalityStatus::Duplicate
                }
                Ok(claimant) => {
                    let certified_at = next_certified_at(self.last_certified_at, Utc::now());
                    self.last_certified_at = Some(certified_at);
                    let cert = Certificate::new(write.digest, claimant, certified_at);
                    self.certificates.insert(write.digest, cert.clone());
                    FinalityStatus::Accepted(cert)
                }
            };
            tracing::debug!(
                handle = %write.handle,
                digest = %write.digest,
                status = status.label(),
                "in-memory ledger finalized submission"
            );
            self.finalized.insert(write.handle, status);
        }
    }
}

/// Reference `LedgerChannel` held entirely in memory
pub struct InMemoryLedger {
    state: Mutex<LedgerState>,
    policy: AuthorizationPolicy,
    reachable: AtomicBool,
    request_gate: watch::Sender<bool>,
    finality_gate: watch::Sender<bool>,
    finality_delay: Option<Duration>,
    writes: AtomicU64,
}

impl InMemoryLedger {
    /// Ledger accepting any non-empty authorization
    pub fn new() -> Self {
        Self::with_policy(AuthorizationPolicy::AcceptAll)
    }

    pub fn with_policy(policy: AuthorizationPolicy) -> Self {
        let (request_gate, _) = watch::channel(true);
        let (finality_gate, _) = watch::channel(true);
        Self {
            state: Mutex::new(LedgerState::default()),
            policy,
            reachable: AtomicBool::new(true),
            request_gate,
            finality_gate,
            finality_delay: None,
            writes: AtomicU64::new(0),
        }
    }

    /// Ledger accepting only the given `(token, claimant)` pairs
    pub fn with_allow_list<I, T>(entries: I) -> Self
    where
        I: IntoIterator<Item = (T, Claimant)>,
        T: Into<Vec<u8>>,
    {
        let tokens = entries
            .into_iter()
            .map(|(token, claimant)| (token.into(), claimant))
            .collect();
        Self::with_policy(AuthorizationPolicy::AllowList(tokens))
    }

    /// Every `finality` call sleeps this long before answering
    pub fn with_finality_delay(mut self, delay: Duration) -> Self {
        self.finality_delay = Some(delay);
        self
    }

    /// Simulate a network partition (`false`) or its recovery (`true`)
    pub fn set_reachable(&self, reachable: bool) {
        self.reachable.store(reachable, Ordering::SeqCst);
    }

    /// Stop answering: `write` and `read` calls suspend until released
    pub fn hold_requests(&self) {
        self.request_gate.send_replace(false);
    }

    pub fn release_requests(&self) {
        self.request_gate.send_replace(true);
    }

    /// Stop producing blocks: `finality` calls suspend until released
    pub fn hold_finality(&self) {
        self.finality_gate.send_replace(false);
    }

    pub fn release_finality(&self) {
        self.finality_gate.send_replace(true);
    }

    /// Number of `write` requests the ledger has taken
    pub fn write_count(&self) -> u64 {
        self.writes.load(Ordering::SeqCst)
    }

    pub async fn certificate_count(&self) -> usize {
        self.state.lock().await.certificates.len()
    }

    fn ensure_reachable(&self) -> Result<(), TransportError> {
        if self.reachable.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(TransportError::unreachable("in-memory ledger partitioned"))
        }
    }

    async fn pass_gate(gate: &watch::Sender<bool>) -> Result<(), TransportError> {
        let mut gate = gate.subscribe();
        gate.wait_for(|open| *open)
            .await
            .map_err(|_| TransportError::unavailable("in-memory ledger shut down"))?;
        Ok(())
    }

    fn blocks_enabled(&self) -> bool {
        *self.finality_gate.borrow()
    }
}

impl Default for InMemoryLedger {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LedgerChannel for InMemoryLedger {
    async fn write(&self, request: WriteRequest) -> Result<TxHandle, TransportError> {
        self.ensure_reachable()?;
        Self::pass_gate(&self.request_gate).await?;

        let claimant = self.policy.resolve(request.authorization.expose());
        let handle = TxHandle::generate();

        let mut state = self.state.lock().await;
        let seq = state.next_seq;
        state.next_seq += 1;
        state.pending.insert(
            seq,
            PendingWrite {
                handle: handle.clone(),
                digest: request.digest,
                claimant,
            },
        );
        self.writes.fetch_add(1, Ordering::SeqCst);

        Ok(handle)
    }

    async fn finality(&self, handle: &TxHandle) -> Result<FinalityReceipt, TransportError> {
        self.ensure_reachable()?;

        if let Some(delay) = self.finality_delay {
            tokio::time::sleep(delay).await;
        }

        Self::pass_gate(&self.finality_gate).await?;

        // the partition may have started while we were suspended
        self.ensure_reachable()?;

        let mut state = self.state.lock().await;
        state.produce_block();
        let status = state
            .finalized
            .get(handle)
            .cloned()
            .ok_or_else(|| TransportError::malformed(format!("unknown handle {}", handle)))?;

        Ok(FinalityReceipt {
            handle: handle.clone(),
            status,
        })
    }

    async fn read(&self, digest: &Digest) -> Result<Option<Certificate>, TransportError> {
        self.ensure_reachable()?;
        Self::pass_gate(&self.request_gate).await?;

        let mut state = self.state.lock().await;
        if self.blocks_enabled() {
            state.produce_block();
        }
        Ok(state.certificates.get(digest).cloned())
    }
}
