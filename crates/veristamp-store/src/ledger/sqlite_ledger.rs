//! Single-node ledger on SQLite
//!
//! `write` only records a pending submission. Pending submissions are
//! finalized in `seq` order by a "block": one SQLite transaction that, for
//! each submission old enough, decides denied / duplicate / accepted and
//! inserts the certificate. Blocks are produced lazily, by `finality` and
//! `read`, so several processes sharing the database file agree on one
//! order.

#![allow(clippy::result_large_err)]

use crate::claimants::{self, millis_to_utc, RegisteredClaimant};
use crate::db;
use crate::errors::{corrupt_row, from_rusqlite, unavailable, Result};
use crate::migrations::apply_migrations;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, TransactionBehavior};
use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use veristamp_core::config::ClientConfig;
use veristamp_core::ledger::{
    next_certified_at, FinalityReceipt, FinalityStatus, LedgerChannel, WriteRequest,
};
use veristamp_core::{
    Authorization, Certificate, Claimant, Digest, ExError, ExErrorKind, TransportError, TxHandle,
};

const STATUS_PENDING: &str = "pending";
const STATUS_ACCEPTED: &str = "accepted";
const STATUS_DUPLICATE: &str = "duplicate";
const STATUS_DENIED: &str = "denied";

const DENIED_REASON: &str = "authorization does not match a registered claimant";

/// Where one submission stands
enum SubmissionState {
    Pending,
    Final(FinalityStatus),
}

/// `LedgerChannel` backed by a SQLite database
#[derive(Clone)]
pub struct SqliteLedger {
    conn: Arc<Mutex<Connection>>,
    block_time: Duration,
    poll_interval: Duration,
}

impl SqliteLedger {
    /// Open (creating if needed) the ledger at `path`, timed per `config`
    pub fn open(path: &Path, config: &ClientConfig) -> Result<Self> {
        let conn = db::open(path)?;
        Self::from_connection(conn).map(|ledger| {
            ledger.with_timing(
                Duration::from_millis(config.block_time_ms),
                Duration::from_millis(config.finality_poll_ms),
            )
        })
    }

    /// Fresh private ledger that finalizes immediately
    pub fn open_in_memory() -> Result<Self> {
        Self::from_connection(db::open_in_memory()?)
    }

    fn from_connection(mut conn: Connection) -> Result<Self> {
        db::configure(&conn)?;
        apply_migrations(&mut conn)?;
        let defaults = ClientConfig::default();
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            block_time: Duration::from_millis(defaults.block_time_ms),
            poll_interval: Duration::from_millis(defaults.finality_poll_ms),
        })
    }

    /// Minimum submission age before finalization, and the sleep between
    /// finality checks while waiting for it
    pub fn with_timing(mut self, block_time: Duration, poll_interval: Duration) -> Self {
        self.block_time = block_time;
        self.poll_interval = poll_interval.max(Duration::from_millis(1));
        self
    }

    /// Add a claimant the ledger will accept submissions from
    pub async fn register_claimant(
        &self,
        claimant: Claimant,
        authorization: Authorization,
    ) -> Result<RegisteredClaimant> {
        self.with_conn(move |conn| claimants::register(conn, &claimant, &authorization))
            .await
    }

    pub async fn claimants(&self) -> Result<Vec<RegisteredClaimant>> {
        self.with_conn(|conn| claimants::list(conn)).await
    }

    /// Submissions not yet finalized
    pub async fn pending_count(&self) -> Result<u64> {
        self.with_conn(|conn| {
            conn.query_row(
                "SELECT COUNT(*) FROM submissions WHERE status = ?1",
                [STATUS_PENDING],
                |row| row.get::<_, i64>(0),
            )
            .map(|n| n.max(0) as u64)
            .map_err(from_rusqlite)
        })
        .await
    }

    /// Run blocking SQLite work off the async runtime
    async fn with_conn<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let mut guard = conn.lock().unwrap_or_else(PoisonError::into_inner);
            f(&mut guard)
        })
        .await
        .map_err(|e| {
            ExError::new(ExErrorKind::Internal)
                .with_op("sqlite_worker")
                .with_message(e.to_string())
        })?
    }

    fn block_time_ms(&self) -> i64 {
        i64::try_from(self.block_time.as_millis()).unwrap_or(i64::MAX)
    }
}

#[async_trait]
impl LedgerChannel for SqliteLedger {
    async fn write(&self, request: WriteRequest) -> std::result::Result<TxHandle, TransportError> {
        let handle = TxHandle::generate();
        let recorded = handle.clone();

        self.with_conn(move |conn| {
            let claimant = claimants::resolve(conn, &request.authorization)?;
            conn.execute(
                "INSERT INTO submissions (handle, digest, claimant, status, submitted_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                rusqlite::params![
                    recorded.as_str(),
                    request.digest.to_hex(),
                    claimant.as_ref().map(Claimant::as_str),
                    STATUS_PENDING,
                    Utc::now().timestamp_millis(),
                ],
            )
            .map_err(from_rusqlite)?;
            Ok(())
        })
        .await
        .map_err(unavailable)?;

        tracing::debug!(tx_handle = %handle, "sqlite ledger recorded submission");
        Ok(handle)
    }

    async fn finality(
        &self,
        handle: &TxHandle,
    ) -> std::result::Result<FinalityReceipt, TransportError> {
        let block_time_ms = self.block_time_ms();
        loop {
            let awaited = handle.clone();
            let state = self
                .with_conn(move |conn| {
                    produce_block(conn, Utc::now(), block_time_ms)?;
                    submission_state(conn, &awaited)
                })
                .await
                .map_err(unavailable)?;

            match state {
                Some(SubmissionState::Final(status)) => {
                    return Ok(FinalityReceipt {
                        handle: handle.clone(),
                        status,
                    })
                }
                Some(SubmissionState::Pending) => tokio::time::sleep(self.poll_interval).await,
                None => {
                    return Err(TransportError::malformed(format!(
                        "ledger has no submission {}",
                        handle
                    )))
                }
            }
        }
    }

    async fn read(
        &self,
        digest: &Digest,
    ) -> std::result::Result<Option<Certificate>, TransportError> {
        let block_time_ms = self.block_time_ms();
        let digest = *digest;
        self.with_conn(move |conn| {
            produce_block(conn, Utc::now(), block_time_ms)?;
            certificate_for(conn, &digest)
        })
        .await
        .map_err(unavailable)
    }
}

/// Finalize every pending submission at least `block_time_ms` old, in
/// submission order, inside one immediate transaction. Returns how many were
/// finalized.
fn produce_block(conn: &mut Connection, now: DateTime<Utc>, block_time_ms: i64) -> Result<usize> {
    let now_ms = now.timestamp_millis();
    let cutoff = now_ms.saturating_sub(block_time_ms);
    // take the write lock up front: a deferred transaction that read first
    // fails with SQLITE_BUSY on upgrade instead of waiting out busy_timeout
    let tx = conn
        .transaction_with_behavior(TransactionBehavior::Immediate)
        .map_err(from_rusqlite)?;

    let pending: Vec<(i64, String, String, Option<String>)> = {
        let mut stmt = tx
            .prepare(
                "SELECT seq, handle, digest, claimant FROM submissions
                 WHERE status = ?1 AND submitted_at <= ?2
                 ORDER BY seq",
            )
            .map_err(from_rusqlite)?;
        let rows = stmt
            .query_map(rusqlite::params![STATUS_PENDING, cutoff], |row| {
                Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?))
            })
            .map_err(from_rusqlite)?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(from_rusqlite)?;
        rows
    };

    if pending.is_empty() {
        return Ok(0);
    }

    let mut last_certified_at = tx
        .query_row("SELECT MAX(certified_at) FROM certificates", [], |row| {
            row.get::<_, Option<i64>>(0)
        })
        .map_err(from_rusqlite)?
        .map(millis_to_utc)
        .transpose()?;

    for (seq, handle, digest, claimant) in &pending {
        let status = match claimant {
            None => STATUS_DENIED,
            Some(claimant) => {
                let exists = tx
                    .query_row(
                        "SELECT 1 FROM certificates WHERE digest = ?1",
                        [digest],
                        |_| Ok(()),
                    )
                    .optional()
                    .map_err(from_rusqlite)?
                    .is_some();
                if exists {
                    STATUS_DUPLICATE
                } else {
                    let certified_at = next_certified_at(last_certified_at, now);
                    last_certified_at = Some(certified_at);
                    tx.execute(
                        "INSERT INTO certificates (digest, claimant, certified_at, handle)
                         VALUES (?1, ?2, ?3, ?4)",
                        rusqlite::params![
                            digest,
                            claimant,
                            certified_at.timestamp_millis(),
                            handle
                        ],
                    )
                    .map_err(from_rusqlite)?;
                    STATUS_ACCEPTED
                }
            }
        };

        tx.execute(
            "UPDATE submissions SET status = ?1, finalized_at = ?2 WHERE seq = ?3",
            rusqlite::params![status, now_ms, seq],
        )
        .map_err(from_rusqlite)?;
        tracing::debug!(tx_handle = %handle, status, "sqlite ledger finalized submission");
    }

    tx.commit().map_err(from_rusqlite)?;
    Ok(pending.len())
}

fn submission_state(conn: &Connection, handle: &TxHandle) -> Result<Option<SubmissionState>> {
    type Row = (String, Option<String>, Option<String>, Option<i64>);
    let row: Option<Row> = conn
        .query_row(
            "SELECT s.status, c.digest, c.claimant, c.certified_at
             FROM submissions s LEFT JOIN certificates c ON c.handle = s.handle
             WHERE s.handle = ?1",
            [handle.as_str()],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
        )
        .optional()
        .map_err(from_rusqlite)?;

    let Some((status, digest, claimant, certified_at)) = row else {
        return Ok(None);
    };

    let state = match (status.as_str(), digest, claimant, certified_at) {
        (STATUS_PENDING, ..) => SubmissionState::Pending,
        (STATUS_DUPLICATE, ..) => SubmissionState::Final(FinalityStatus::Duplicate),
        (STATUS_DENIED, ..) => SubmissionState::Final(FinalityStatus::AuthorizationDenied {
            reason: DENIED_REASON.to_string(),
        }),
        (STATUS_ACCEPTED, Some(digest), Some(claimant), Some(at)) => {
            SubmissionState::Final(FinalityStatus::Accepted(Certificate::new(
                Digest::from_hex(&digest)?,
                Claimant::new(claimant),
                millis_to_utc(at)?,
            )))
        }
        (other, ..) => {
            return Err(corrupt_row(
                "submission",
                format!("{} has status '{}' without a matching certificate", handle, other),
            ))
        }
    };
    Ok(Some(state))
}

fn certificate_for(conn: &Connection, digest: &Digest) -> Result<Option<Certificate>> {
    let row: Option<(String, i64)> = conn
        .query_row(
            "SELECT claimant, certified_at FROM certificates WHERE digest = ?1",
            [digest.to_hex()],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .optional()
        .map_err(from_rusqlite)?;

    row.map(|(claimant, at)| {
        Ok(Certificate::new(
            *digest,
            Claimant::new(claimant),
            millis_to_utc(at)?,
        ))
    })
    .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use veristamp_core::fingerprint::digest;

    fn setup() -> Connection {
        let mut conn = db::open_in_memory().unwrap();
        apply_migrations(&mut conn).unwrap();
        claimants::register(
            &mut conn,
            &Claimant::new("alice"),
            &Authorization::from_token("alice-key"),
        )
        .unwrap();
        conn
    }

    fn insert_pending(
        conn: &Connection,
        handle: &str,
        d: &Digest,
        claimant: Option<&str>,
        at: i64,
    ) {
        conn.execute(
            "INSERT INTO submissions (handle, digest, claimant, status, submitted_at)
             VALUES (?1, ?2, ?3, 'pending', ?4)",
            rusqlite::params![handle, d.to_hex(), claimant, at],
        )
        .unwrap();
    }

    #[test]
    fn test_block_applies_in_seq_order() {
        let mut conn = setup();
        let d = digest(b"doc");
        let now = Utc::now();
        insert_pending(&conn, "h1", &d, Some("alice"), now.timestamp_millis());
        insert_pending(&conn, "h2", &d, Some("alice"), now.timestamp_millis());
        insert_pending(&conn, "h3", &digest(b"other"), None, now.timestamp_millis());

        assert_eq!(produce_block(&mut conn, now, 0).unwrap(), 3);

        let status = |h: &str| match submission_state(&conn, &TxHandle::new(h)).unwrap() {
            Some(SubmissionState::Final(s)) => s.label(),
            Some(SubmissionState::Pending) => "pending",
            None => "missing",
        };
        assert_eq!(status("h1"), "accepted");
        assert_eq!(status("h2"), "duplicate");
        assert_eq!(status("h3"), "denied");
        assert_eq!(status("h4"), "missing");
    }

    #[test]
    fn test_block_time_holds_young_submissions() {
        let mut conn = setup();
        let now = Utc::now();
        insert_pending(&conn, "young", &digest(b"y"), Some("alice"), now.timestamp_millis());

        assert_eq!(produce_block(&mut conn, now, 60_000).unwrap(), 0);
        let later = now + chrono::Duration::seconds(61);
        assert_eq!(produce_block(&mut conn, later, 60_000).unwrap(), 1);
    }

    #[test]
    fn test_certificate_lookup_round_trips() {
        let mut conn = setup();
        let d = digest(b"lookup");
        let now = Utc::now();
        insert_pending(&conn, "h", &d, Some("alice"), now.timestamp_millis());
        produce_block(&mut conn, now, 0).unwrap();

        let cert = certificate_for(&conn, &d).unwrap().unwrap();
        assert_eq!(cert.digest, d);
        assert_eq!(cert.claimant, Claimant::new("alice"));
        assert!(certificate_for(&conn, &digest(b"absent")).unwrap().is_none());
    }
}
