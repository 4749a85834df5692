#![allow(clippy::unwrap_used, clippy::expect_used)]

use veristamp_core::errors::{ExError, ExErrorKind};
use veristamp_core::fingerprint::digest;
use veristamp_core::logging_facility::init_test_capture;
use veristamp_core::model::TransportError;
use veristamp_core::{log_op_end, log_op_error, log_op_start, log_transition};
use veristamp_core::{Authorization, VeriStampError};
use veristamp_core_types::schema::{EVENT_END, EVENT_END_ERROR, EVENT_START, EVENT_TRANSITION};

#[test]
fn test_start_and_end_carry_op_and_duration() {
    let capture = init_test_capture();
    let op_name = "test_start_end_unique_1";

    log_op_start!(op_name, digest = %digest(b"a"));
    log_op_end!(op_name, duration_ms = 42u64, outcome = "found");

    let events = capture.events_for_op(op_name);
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].event.as_deref(), Some(EVENT_START));
    assert_eq!(events[0].field("digest"), Some(digest(b"a").to_hex().as_str()));
    assert_eq!(events[1].event.as_deref(), Some(EVENT_END));
    assert_eq!(events[1].field("duration_ms"), Some("42"));
    assert_eq!(events[1].field("outcome"), Some("found"));
}

#[test]
fn test_error_event_records_stable_code() {
    let capture = init_test_capture();
    let op_name = "test_error_code_unique_2";

    log_op_error!(
        op_name,
        TransportError::unreachable("connection refused"),
        duration_ms = 7u64
    );

    let events = capture.events_for_op(op_name);
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].event.as_deref(), Some(EVENT_END_ERROR));
    assert_eq!(events[0].field("err_code"), Some("ERR_TRANSPORT"));
    assert!(events[0]
        .field("err_message")
        .unwrap()
        .contains("connection refused"));
}

#[test]
fn test_core_error_converts_in_macro() {
    let capture = init_test_capture();
    let op_name = "test_core_error_unique_3";

    let err = VeriStampError::Io {
        source_name: "deed.pdf".to_string(),
        message: "permission denied".to_string(),
    };
    log_op_error!(op_name, err, duration_ms = 1u64, digest = "none");

    let event = capture
        .events_for_op(op_name)
        .into_iter()
        .next()
        .expect("error event");
    assert_eq!(event.field("err_code"), Some(ExErrorKind::Io.code()));
    assert_eq!(event.field("digest"), Some("none"));
}

#[test]
fn test_transition_events_are_captured() {
    let capture = init_test_capture();

    log_transition!(987_654u64, "ready", "submitting");

    let count = capture.count_events(|e| {
        e.event.as_deref() == Some(EVENT_TRANSITION) && e.field("generation") == Some("987654")
    });
    assert_eq!(count, 1);
}

#[test]
fn test_authorization_never_rendered() {
    let capture = init_test_capture();
    let op_name = "test_redaction_unique_4";
    let auth = Authorization::from_token("super-secret-signing-key");

    log_op_start!(op_name, authorization = ?auth);

    let event = capture
        .events_for_op(op_name)
        .into_iter()
        .next()
        .expect("start event");
    assert!(!event.rendered().contains("super-secret-signing-key"));
    assert!(event.rendered().contains("REDACTED"));
}

#[test]
fn test_ex_error_converts_into_itself() {
    let capture = init_test_capture();
    let op_name = "test_ex_error_unique_5";

    let err = ExError::new(ExErrorKind::Busy).with_message("hash in flight");
    log_op_error!(op_name, err, duration_ms = 0u64);

    capture.assert_event_exists(op_name, EVENT_END_ERROR);
}

#[test]
#[should_panic(expected = "Expected event")]
fn test_assert_event_exists_fails_for_missing_op() {
    let capture = init_test_capture();
    capture.assert_event_exists("never_logged_unique_999", EVENT_START);
}
