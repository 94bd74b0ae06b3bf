//! Contract Test: Session Scope & Failure Reporting
//!
//! Verifies that:
//! - Every opened session is closed, on success and on failure
//! - Store failures are reported as outcomes, never as errors
//! - A session that cannot be opened is reported the same way
//! - Nothing is retried

mod common;

use common::*;
use lease_core::{Action, Error, ErrorKind, Outcome};

#[tokio::test]
async fn session_is_opened_and_closed_around_operation() {
    let store = RecordingStore::new();

    run(&store, &["add", MAC, "10.0.0.5"], &expiry_env("1")).await.unwrap();

    let calls = store.calls();
    assert_eq!(calls.first(), Some(&StoreCall::Open));
    assert_eq!(calls.last(), Some(&StoreCall::Close));
    assert_eq!(calls.len(), 3);
}

#[tokio::test]
async fn session_is_closed_when_operation_fails() {
    let store = RecordingStore::with_failures(Failures {
        operations: true,
        ..Failures::default()
    });

    let cases: &[&[&str]] = &[
        &["add", MAC],
        &["old", MAC],
        &["del", MAC],
        &["clear"],
        &["show"],
    ];

    for args in cases {
        store.reset_calls();
        let (outcome, _) = run(&store, args, &expiry_env("1")).await.unwrap();

        assert!(!outcome.is_success(), "{:?} should report failure", args);
        assert_eq!(
            store.calls().last(),
            Some(&StoreCall::Close),
            "{:?} left the session open",
            args
        );
        assert_eq!(store.operations().len(), 1, "{:?} retried", args);
    }
}

#[tokio::test]
async fn duplicate_insert_is_reported_not_raised() {
    let store = RecordingStore::new();
    run(&store, &["add", MAC, "10.0.0.5"], &expiry_env("1")).await.unwrap();

    let (outcome, _) = run(&store, &["add", MAC, "10.0.0.6"], &expiry_env("2"))
        .await
        .unwrap();

    match outcome {
        Outcome::StoreFailed { action, error } => {
            assert_eq!(action, Action::Add);
            assert!(matches!(error, Error::Conflict(_)));
            assert_eq!(error.kind(), ErrorKind::StoreOperation);
        }
        other => panic!("unexpected outcome {:?}", other),
    }

    let stored = store.table().get(MAC).await.unwrap();
    assert_eq!(stored.ip_address.as_deref(), Some("10.0.0.5"));
}

#[tokio::test]
async fn update_of_missing_lease_is_reported() {
    let store = RecordingStore::new();

    let (outcome, _) = run(&store, &["old", MAC, "10.0.0.5"], &expiry_env("1"))
        .await
        .unwrap();

    assert!(matches!(
        outcome,
        Outcome::StoreFailed { error: Error::NotFound(_), .. }
    ));
    assert!(store.table().is_empty().await, "update must not create a row");
}

#[tokio::test]
async fn connection_failure_is_reported() {
    let store = RecordingStore::with_failures(Failures {
        open: true,
        ..Failures::default()
    });

    let (outcome, out) = run(&store, &["show"], &no_env()).await.unwrap();

    match outcome {
        Outcome::StoreFailed { error, .. } => {
            assert_eq!(error.kind(), ErrorKind::StoreConnectivity);
        }
        other => panic!("unexpected outcome {:?}", other),
    }
    assert!(out.is_empty());
    assert_eq!(store.calls(), vec![StoreCall::Open]);
}

#[tokio::test]
async fn failed_write_is_not_persisted_by_close() {
    let failing = RecordingStore::with_failures(Failures {
        operations: true,
        ..Failures::default()
    });

    let (outcome, _) = run(&failing, &["add", MAC, "10.0.0.1"], &expiry_env("1"))
        .await
        .unwrap();
    assert!(!outcome.is_success());
    assert_eq!(
        failing.calls().last(),
        Some(&StoreCall::Close),
        "close must not write anything on its own"
    );
    assert_eq!(failing.operations().len(), 1);

    let (_, out) = run(&failing.healthy(), &["show"], &no_env()).await.unwrap();
    assert!(out.is_empty(), "reported-failed insert became visible: {}", out);
}
