/// Scenario 2: Certify Then Duplicate
///
/// The first claimant of a digest keeps it; a later certify by another
/// claimant is rejected as a duplicate and changes nothing.
use std::sync::Arc;
use veristamp_core::fingerprint::digest;
use veristamp_core::{Authorization, ByteSource, Claimant, InMemoryLedger, QueryOutcome};
use veristamp_engine::{CertificationMachine, LedgerClient, Severity, StatusReport, TxOutcome};

#[tokio::test]
async fn test_scenario_02_second_claimant_rejected() {
    // GIVEN a ledger and a document
    let ledger = Arc::new(InMemoryLedger::new());
    let client = LedgerClient::new(ledger.clone());
    let machine = CertificationMachine::new(client.clone());
    let document = b"Board resolution 2024-03, signed".to_vec();
    let d1 = digest(&document);

    // WHEN claimant A certifies it
    let submitted_at = chrono::Utc::now();
    machine
        .select_file(ByteSource::bytes(document.clone()))
        .await
        .expect("select");
    let snap = machine
        .certify(Authorization::from_token("claimant-a"))
        .await
        .expect("certify");
    assert!(matches!(snap.last_outcome, Some(TxOutcome::Certified(_))));

    // THEN the query names A with a timestamp after submission
    match client.query(d1).await.expect("query") {
        QueryOutcome::Found {
            claimant,
            certified_at,
        } => {
            assert_eq!(claimant, Claimant::new("claimant-a"));
            assert!(
                certified_at.timestamp_millis() >= submitted_at.timestamp_millis(),
                "certified_at {} before submission {}",
                certified_at,
                submitted_at
            );
        }
        QueryOutcome::NotFound => panic!("certificate missing"),
    }

    // WHEN claimant B certifies the same bytes
    machine
        .select_file(ByteSource::bytes(document))
        .await
        .expect("select");
    let snap = machine
        .certify(Authorization::from_token("claimant-b"))
        .await
        .expect("certify");

    // THEN B is rejected as a duplicate, with its own message
    assert_eq!(snap.last_outcome, Some(TxOutcome::Duplicate { digest: d1 }));
    let report = StatusReport::for_snapshot(&snap).expect("report");
    assert_eq!(report.severity, Severity::Notice);
    assert_eq!(report.title, "Already certified");

    // AND the certificate still names A
    match client.query(d1).await.expect("query") {
        QueryOutcome::Found { claimant, .. } => assert_eq!(claimant, Claimant::new("claimant-a")),
        QueryOutcome::NotFound => panic!("certificate missing"),
    }
    assert_eq!(ledger.certificate_count().await, 1);
}

#[tokio::test]
async fn test_scenario_02_concurrent_machines_one_winner() {
    // GIVEN two independent transactions sharing one ledger
    let ledger = Arc::new(InMemoryLedger::new());
    ledger.hold_finality();
    let client = LedgerClient::new(ledger.clone());
    let a = CertificationMachine::new(client.clone());
    let b = CertificationMachine::new(client.clone());
    let bytes = b"same bytes, two claimants".to_vec();
    a.select_file(ByteSource::bytes(bytes.clone()))
        .await
        .expect("select");
    b.select_file(ByteSource::bytes(bytes.clone()))
        .await
        .expect("select");

    // WHEN both certify before any block is produced
    let ta = {
        let a = a.clone();
        tokio::spawn(async move { a.certify(Authorization::from_token("alice")).await })
    };
    let tb = {
        let b = b.clone();
        tokio::spawn(async move { b.certify(Authorization::from_token("bob")).await })
    };
    while ledger.write_count() < 2 {
        tokio::task::yield_now().await;
    }
    ledger.release_finality();

    // THEN exactly one is certified and the other is a duplicate
    let oa = ta.await.expect("join").expect("certify").last_outcome;
    let ob = tb.await.expect("join").expect("certify").last_outcome;
    let (winner, loser) = match (oa, ob) {
        (Some(TxOutcome::Certified(cert)), other) | (other, Some(TxOutcome::Certified(cert))) => {
            (cert, other)
        }
        other => panic!("no winner: {:?}", other),
    };
    assert!(matches!(loser, Some(TxOutcome::Duplicate { .. })));

    // AND the certificate's claimant is the winner's
    match client.query(digest(&bytes)).await.expect("query") {
        QueryOutcome::Found { claimant, .. } => assert_eq!(claimant, winner.claimant),
        QueryOutcome::NotFound => panic!("certificate missing"),
    }
}
