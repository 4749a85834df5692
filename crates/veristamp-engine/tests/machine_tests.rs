#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::sync::Arc;
use std::time::Duration;
use veristamp_core::fingerprint::digest;
use veristamp_core::{Authorization, ByteSource, Claimant, ExErrorKind, InMemoryLedger};
use veristamp_engine::{
    CertificationMachine, LedgerClient, StatusReport, TxAction, TxOutcome, TxState,
};

fn machine_over(ledger: Arc<InMemoryLedger>) -> CertificationMachine {
    CertificationMachine::new(LedgerClient::new(ledger))
}

async fn wait_for_state<F>(machine: &CertificationMachine, pred: F)
where
    F: Fn(&TxState) -> bool,
{
    let mut rx = machine.subscribe();
    tokio::time::timeout(Duration::from_secs(5), rx.wait_for(|s| pred(&s.state)))
        .await
        .expect("state not reached in time")
        .expect("machine dropped");
}

#[tokio::test]
async fn test_certify_happy_path() {
    let machine = machine_over(Arc::new(InMemoryLedger::new()));
    machine
        .select_file(ByteSource::bytes(b"lease agreement".to_vec()))
        .await
        .unwrap();

    let snap = machine
        .certify(Authorization::from_token("alice"))
        .await
        .unwrap();
    assert_eq!(
        snap.state,
        TxState::Confirmed {
            digest: digest(b"lease agreement"),
            action: TxAction::Certify
        }
    );
    match snap.last_outcome {
        Some(TxOutcome::Certified(cert)) => assert_eq!(cert.claimant, Claimant::new("alice")),
        other => panic!("expected Certified, got {:?}", other),
    }
}

#[tokio::test]
async fn test_subscriber_sees_transitions_in_order() {
    const ORDER: [&str; 5] = [
        "hashing",
        "ready",
        "submitting",
        "awaiting_confirmation",
        "confirmed",
    ];
    let machine = machine_over(Arc::new(InMemoryLedger::new()));
    let mut rx = machine.subscribe();

    let observer = tokio::spawn(async move {
        let mut seen = Vec::new();
        while rx.changed().await.is_ok() {
            let name = rx.borrow_and_update().state.name();
            seen.push(name);
            if name == "confirmed" {
                break;
            }
        }
        seen
    });

    machine
        .select_file(ByteSource::bytes(b"observed".to_vec()))
        .await
        .unwrap();
    tokio::task::yield_now().await;
    machine
        .certify(Authorization::from_token("alice"))
        .await
        .unwrap();

    // the watch channel may coalesce, but never reorders
    let seen = observer.await.unwrap();
    let positions: Vec<usize> = seen
        .iter()
        .map(|name| ORDER.iter().position(|o| o == name).unwrap())
        .collect();
    assert!(positions.windows(2).all(|w| w[0] < w[1]), "{:?}", seen);
    assert_eq!(seen.last(), Some(&"confirmed"));
    assert!(seen.contains(&"ready"));
}

#[tokio::test]
async fn test_awaiting_confirmation_is_observable() {
    let ledger = Arc::new(InMemoryLedger::new());
    ledger.hold_finality();
    let machine = machine_over(ledger.clone());
    machine
        .select_file(ByteSource::bytes(b"pending".to_vec()))
        .await
        .unwrap();

    let task = {
        let machine = machine.clone();
        tokio::spawn(async move { machine.certify(Authorization::from_token("alice")).await })
    };
    wait_for_state(&machine, |s| {
        matches!(s, TxState::AwaitingConfirmation { .. })
    })
    .await;

    ledger.release_finality();
    let snap = task.await.unwrap().unwrap();
    assert!(matches!(snap.state, TxState::Confirmed { .. }));
}

async fn assert_every_action_busy(machine: &CertificationMachine) {
    let busy = [
        machine
            .certify(Authorization::from_token("bob"))
            .await
            .unwrap_err(),
        machine.verify().await.unwrap_err(),
        machine.reset().unwrap_err(),
        machine
            .select_file(ByteSource::bytes(b"other".to_vec()))
            .await
            .unwrap_err(),
    ];
    for err in &busy {
        assert_eq!(err.kind(), ExErrorKind::Busy, "{}", err);
    }
}

#[tokio::test]
async fn test_every_action_busy_while_awaiting() {
    let ledger = Arc::new(InMemoryLedger::new());
    ledger.hold_finality();
    let machine = machine_over(ledger.clone());
    machine
        .select_file(ByteSource::bytes(b"busy".to_vec()))
        .await
        .unwrap();

    let task = {
        let machine = machine.clone();
        tokio::spawn(async move { machine.certify(Authorization::from_token("alice")).await })
    };
    wait_for_state(&machine, |s| {
        matches!(s, TxState::AwaitingConfirmation { .. })
    })
    .await;

    assert_every_action_busy(&machine).await;
    assert_eq!(ledger.write_count(), 1);

    ledger.release_finality();
    assert!(task.await.unwrap().is_ok());
}

#[tokio::test]
async fn test_every_action_busy_while_certify_write_in_flight() {
    let ledger = Arc::new(InMemoryLedger::new());
    let machine = machine_over(ledger.clone());
    machine
        .select_file(ByteSource::bytes(b"slow write".to_vec()))
        .await
        .unwrap();
    ledger.hold_requests();

    let task = {
        let machine = machine.clone();
        tokio::spawn(async move { machine.certify(Authorization::from_token("alice")).await })
    };
    wait_for_state(&machine, |s| {
        matches!(
            s,
            TxState::Submitting {
                action: TxAction::Certify,
                ..
            }
        )
    })
    .await;

    assert_every_action_busy(&machine).await;
    assert_eq!(ledger.write_count(), 0);

    ledger.release_requests();
    let snap = task.await.unwrap().unwrap();
    assert!(matches!(snap.state, TxState::Confirmed { .. }));
    assert_eq!(ledger.write_count(), 1);
}

#[tokio::test]
async fn test_every_action_busy_while_verify_query_in_flight() {
    let ledger = Arc::new(InMemoryLedger::new());
    let machine = machine_over(ledger.clone());
    machine
        .select_file(ByteSource::bytes(b"slow read".to_vec()))
        .await
        .unwrap();
    ledger.hold_requests();

    let task = {
        let machine = machine.clone();
        tokio::spawn(async move { machine.verify().await })
    };
    wait_for_state(&machine, |s| {
        matches!(
            s,
            TxState::Submitting {
                action: TxAction::Verify,
                ..
            }
        )
    })
    .await;

    assert_every_action_busy(&machine).await;

    ledger.release_requests();
    let snap = task.await.unwrap().unwrap();
    assert!(matches!(snap.last_outcome, Some(TxOutcome::NotFound { .. })));
    assert_eq!(ledger.write_count(), 0);
}

#[cfg(unix)]
#[tokio::test]
async fn test_every_action_busy_while_hashing() {
    // a FIFO blocks the hashing worker until a writer shows up
    let dir = tempfile::tempdir().unwrap();
    let fifo = dir.path().join("incoming");
    let made = std::process::Command::new("mkfifo")
        .arg(&fifo)
        .status()
        .unwrap();
    assert!(made.success());

    let machine = machine_over(Arc::new(InMemoryLedger::new()));
    let task = {
        let machine = machine.clone();
        let source = ByteSource::path(&fifo);
        tokio::spawn(async move { machine.select_file(source).await })
    };
    wait_for_state(&machine, |s| matches!(s, TxState::Hashing { .. })).await;

    assert_every_action_busy(&machine).await;

    tokio::task::spawn_blocking(move || std::fs::write(&fifo, b"streamed upload"))
        .await
        .unwrap()
        .unwrap();
    let snap = task.await.unwrap().unwrap();
    assert_eq!(
        snap.state,
        TxState::Ready {
            digest: digest(b"streamed upload")
        }
    );
}

#[tokio::test]
async fn test_abandoned_certify_error_names_its_submission() {
    let ledger = Arc::new(InMemoryLedger::new());
    ledger.hold_finality();
    let machine = machine_over(ledger.clone());
    machine
        .select_file(ByteSource::bytes(b"left behind".to_vec()))
        .await
        .unwrap();

    let task = {
        let machine = machine.clone();
        tokio::spawn(async move { machine.certify(Authorization::from_token("alice")).await })
    };
    wait_for_state(&machine, |s| {
        matches!(s, TxState::AwaitingConfirmation { .. })
    })
    .await;
    let handle = match machine.snapshot().state {
        TxState::AwaitingConfirmation { handle, .. } => handle,
        other => panic!("expected AwaitingConfirmation, got {:?}", other),
    };

    machine.abandon();
    ledger.release_finality();

    let err = task.await.unwrap().unwrap_err();
    assert_eq!(err.kind(), ExErrorKind::Superseded);
    assert_eq!(err.handle(), Some(&handle));
    assert!(err.trace_id().is_some());
    assert!(err.to_string().contains(handle.as_str()));
}

#[tokio::test]
async fn test_verify_not_found_then_found() {
    let ledger = Arc::new(InMemoryLedger::new());
    let machine = machine_over(ledger.clone());
    let source = ByteSource::bytes(b"minutes".to_vec());

    machine.select_file(source.clone()).await.unwrap();
    let snap = machine.verify().await.unwrap();
    assert_eq!(
        snap.state,
        TxState::Rejected {
            digest: digest(b"minutes"),
            action: TxAction::Verify
        }
    );
    assert!(matches!(snap.last_outcome, Some(TxOutcome::NotFound { .. })));

    machine.select_file(source.clone()).await.unwrap();
    machine
        .certify(Authorization::from_token("carol"))
        .await
        .unwrap();

    machine.select_file(source).await.unwrap();
    let snap = machine.verify().await.unwrap();
    match snap.last_outcome {
        Some(TxOutcome::Verified(cert)) => assert_eq!(cert.claimant, Claimant::new("carol")),
        other => panic!("expected Verified, got {:?}", other),
    }
}

#[tokio::test]
async fn test_terminal_state_requires_new_selection() {
    let machine = machine_over(Arc::new(InMemoryLedger::new()));
    machine
        .select_file(ByteSource::bytes(b"once".to_vec()))
        .await
        .unwrap();
    machine.verify().await.unwrap();

    let err = machine.verify().await.unwrap_err();
    assert_eq!(err.kind(), ExErrorKind::InvalidState);
}

#[tokio::test]
async fn test_reset_from_ready_and_terminal() {
    let machine = machine_over(Arc::new(InMemoryLedger::new()));
    let ready = machine
        .select_file(ByteSource::bytes(b"r".to_vec()))
        .await
        .unwrap();

    let idle = machine.reset().unwrap();
    assert_eq!(idle.state, TxState::Idle);
    assert_eq!(idle.generation, ready.generation + 1);

    machine
        .select_file(ByteSource::bytes(b"r".to_vec()))
        .await
        .unwrap();
    machine.verify().await.unwrap();
    let idle = machine.reset().unwrap();
    assert_eq!(idle.state, TxState::Idle);
    assert!(idle.last_outcome.is_none());
}

#[tokio::test]
async fn test_missing_file_fails_with_io_outcome() {
    let dir = tempfile::tempdir().unwrap();
    let machine = machine_over(Arc::new(InMemoryLedger::new()));

    let snap = machine
        .select_file(ByteSource::path(dir.path().join("gone.pdf")))
        .await
        .unwrap();
    assert_eq!(snap.state, TxState::Failed { digest: None });
    match &snap.last_outcome {
        Some(TxOutcome::Io { source, .. }) => assert!(source.ends_with("gone.pdf")),
        other => panic!("expected Io, got {:?}", other),
    }
    let report = StatusReport::for_snapshot(&snap).unwrap();
    assert_eq!(report.title, "Could not read file");
}

#[tokio::test]
async fn test_file_source_digest_matches_bytes() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("scan.png");
    std::fs::write(&path, b"\x89PNG fake").unwrap();
    let machine = machine_over(Arc::new(InMemoryLedger::new()));

    let snap = machine.select_file(ByteSource::path(&path)).await.unwrap();
    assert_eq!(snap.state.digest(), Some(digest(b"\x89PNG fake")));
}

#[tokio::test]
async fn test_abandon_discards_late_outcome() {
    let ledger = Arc::new(InMemoryLedger::new());
    ledger.hold_finality();
    let machine = machine_over(ledger.clone());
    machine
        .select_file(ByteSource::bytes(b"abandoned".to_vec()))
        .await
        .unwrap();

    let late = {
        let machine = machine.clone();
        tokio::spawn(async move { machine.certify(Authorization::from_token("alice")).await })
    };
    wait_for_state(&machine, |s| {
        matches!(s, TxState::AwaitingConfirmation { .. })
    })
    .await;

    let idle = machine.abandon();
    assert_eq!(idle.state, TxState::Idle);

    let fresh = machine
        .select_file(ByteSource::bytes(b"fresh".to_vec()))
        .await
        .unwrap();
    assert_eq!(
        fresh.state,
        TxState::Ready {
            digest: digest(b"fresh")
        }
    );

    ledger.release_finality();
    let err = late.await.unwrap().unwrap_err();
    assert_eq!(err.kind(), ExErrorKind::Superseded);

    // the new transaction is untouched by the late result
    assert_eq!(machine.snapshot(), fresh);

    // the abandoned submission still landed on the ledger
    assert_eq!(ledger.certificate_count().await, 1);
}

#[tokio::test]
async fn test_abandon_outside_flight_acts_like_reset() {
    let machine = machine_over(Arc::new(InMemoryLedger::new()));
    assert_eq!(machine.abandon().generation, 0);

    machine
        .select_file(ByteSource::bytes(b"a".to_vec()))
        .await
        .unwrap();
    let snap = machine.abandon();
    assert_eq!(snap.state, TxState::Idle);
    assert_eq!(snap.generation, 2);
}

#[tokio::test]
async fn test_authorization_denied_is_rejected_state() {
    let ledger = Arc::new(InMemoryLedger::with_allow_list([(
        "registered-key",
        Claimant::new("notary"),
    )]));
    let machine = machine_over(ledger);
    machine
        .select_file(ByteSource::bytes(b"deed".to_vec()))
        .await
        .unwrap();

    let snap = machine
        .certify(Authorization::from_token("forged-key"))
        .await
        .unwrap();
    assert!(matches!(snap.state, TxState::Rejected { .. }));
    assert_eq!(
        snap.last_outcome.as_ref().and_then(TxOutcome::error_kind),
        Some(ExErrorKind::AuthorizationDenied)
    );
}
