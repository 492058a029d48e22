//! Audit Loop Tests
//!
//! Drives the auditor against in-process logs: honest growth, forks,
//! rollbacks, malformed proofs and flaky transports.

use std::sync::Arc;
use std::time::Duration;

use log_auditor::auditor::{AuditState, Auditor, CycleOutcome, LatestRoot, MemoryLogSource};
use log_auditor::merkle::{ConsistencyProof, LogRoot};
use log_auditor::snapshot::RootSnapshot;
use log_auditor::{Advance, FetchError, Mismatch, TrustedRootStore, VerificationError};

mod common;
use common::*;

#[tokio::test]
async fn test_follows_honest_log() {
    let log = MemoryLogSource::new();
    let mut auditor = Auditor::new(log.clone(), RecordingReporter::default(), TrustedRootStore::new());

    log.append(["a", "b", "c"]).await;
    auditor.check_latest().await;
    log.append(["d", "e", "f", "g"]).await;
    auditor.check_latest().await;
    // Nothing new: a refresh must not advance or fail
    let outcome = auditor.check_latest().await;
    assert_eq!(outcome, CycleOutcome::Verified(Advance::Unchanged));

    assert_eq!(
        auditor.reporter().events(),
        vec![
            Event::Advanced { old_size: 0, new_size: 3, revision: 1 },
            Event::Advanced { old_size: 3, new_size: 7, revision: 2 },
        ]
    );
    assert!(auditor.trusted_root().same_checkpoint(&log.root().await));
}

#[tokio::test]
async fn test_empty_log_with_foreign_root_encoding() {
    let odd_empty = LogRoot::new(0, [7u8; 32], 1);
    let source = ScriptedSource::new(vec![
        Ok(LatestRoot {
            root: odd_empty.clone(),
            proof: ConsistencyProof::empty(),
        }),
        Ok(LatestRoot {
            root: odd_empty.clone(),
            proof: ConsistencyProof::empty(),
        }),
    ]);
    let mut auditor = Auditor::new(source, RecordingReporter::default(), TrustedRootStore::new());

    let outcome = auditor.check_latest().await;
    assert_eq!(
        outcome,
        CycleOutcome::Verified(Advance::Advanced { previous: LogRoot::empty() })
    );
    let outcome = auditor.check_latest().await;
    assert_eq!(outcome, CycleOutcome::Verified(Advance::Unchanged));
    assert_eq!(auditor.trusted_root(), odd_empty);
    assert!(!auditor
        .reporter()
        .events()
        .iter()
        .any(|event| matches!(event, Event::VerificationFailed(_))));
}

#[tokio::test]
async fn test_detects_forked_history() {
    let honest = build_tree(5);
    let mut forked = build_tree(3);
    forked.append(b"rewritten");
    forked.append(b"entry-4");
    forked.append(b"entry-5");

    let source = ScriptedSource::new(vec![
        Ok(LatestRoot {
            root: root_at(&honest, 5, 1),
            proof: ConsistencyProof::empty(),
        }),
        Ok(LatestRoot {
            root: root_at(&forked, 6, 2),
            proof: forked.consistency_proof(5, 6).unwrap(),
        }),
    ]);
    let mut auditor = Auditor::new(source, RecordingReporter::default(), TrustedRootStore::new());

    auditor.check_latest().await;
    let outcome = auditor.check_latest().await;

    assert_eq!(
        outcome,
        CycleOutcome::VerificationFailed(VerificationError::ConsistencyMismatch(Mismatch::OldRootHash))
    );
    assert_eq!(auditor.trusted_root(), root_at(&honest, 5, 1));
    assert!(matches!(
        auditor.reporter().events().last(),
        Some(Event::VerificationFailed(err)) if err.is_integrity_failure()
    ));
}

#[tokio::test]
async fn test_malformed_proof_is_not_an_integrity_failure() {
    let tree = build_tree(8);
    let mut short = tree.consistency_proof(3, 8).unwrap().into_hashes();
    short.pop();

    let source = ScriptedSource::new(vec![Ok(LatestRoot {
        root: root_at(&tree, 8, 2),
        proof: short.into(),
    })]);
    let mut auditor = Auditor::new(
        source,
        RecordingReporter::default(),
        TrustedRootStore::with_root(root_at(&tree, 3, 1)),
    );

    let outcome = auditor.check_latest().await;
    match outcome {
        CycleOutcome::VerificationFailed(err) => {
            assert!(matches!(err, VerificationError::MalformedProof { .. }));
            assert!(!err.is_integrity_failure());
        }
        other => panic!("unexpected outcome: {:?}", other),
    }
    assert_eq!(auditor.trusted_root(), root_at(&tree, 3, 1));
}

#[tokio::test]
async fn test_recovers_after_fetch_failures() {
    let tree = build_tree(6);
    let source = Arc::new(ScriptedSource::new(vec![
        Err(FetchError::Transport("connection reset".to_string())),
        Err(FetchError::Status(503)),
        Ok(LatestRoot {
            root: root_at(&tree, 6, 1),
            proof: ConsistencyProof::empty(),
        }),
    ]));
    let mut auditor = Auditor::new(source.clone(), RecordingReporter::default(), TrustedRootStore::new());

    for _ in 0..3 {
        auditor.check_latest().await;
        assert_eq!(auditor.state(), AuditState::Idle);
    }

    assert_eq!(
        auditor.reporter().events(),
        vec![
            Event::FetchFailed(FetchError::Transport("connection reset".to_string())),
            Event::FetchFailed(FetchError::Status(503)),
            Event::Advanced { old_size: 0, new_size: 6, revision: 1 },
        ]
    );
    // The trusted size offered to the log only changes after an advance
    assert_eq!(source.requested_sizes(), vec![0, 0, 0]);
    auditor.check_latest().await;
    assert_eq!(source.requested_sizes(), vec![0, 0, 0, 6]);
}

#[tokio::test]
async fn test_stale_revision_is_ignored() {
    let tree = build_tree(7);
    let source = ScriptedSource::new(vec![Ok(LatestRoot {
        root: root_at(&tree, 7, 1),
        proof: tree.consistency_proof(4, 7).unwrap(),
    })]);
    let mut auditor = Auditor::new(
        source,
        RecordingReporter::default(),
        TrustedRootStore::with_root(root_at(&tree, 4, 1)),
    );

    let outcome = auditor.check_latest().await;
    assert_eq!(
        outcome,
        CycleOutcome::Verified(Advance::Stale {
            trusted_revision: 1,
            candidate_revision: 1
        })
    );
    assert_eq!(auditor.trusted_root().tree_size, 4);
    assert!(auditor.reporter().events().is_empty());
}

#[tokio::test]
async fn test_advances_are_persisted() {
    let dir = tempfile::tempdir().unwrap();
    let snapshot = RootSnapshot::new(dir.path().join("trusted-root.json"));

    let log = MemoryLogSource::new();
    log.append(["one", "two"]).await;
    let mut auditor = Auditor::new(log.clone(), RecordingReporter::default(), TrustedRootStore::new())
        .with_snapshot(snapshot.clone());
    auditor.check_latest().await;

    let saved = snapshot.load().unwrap().expect("snapshot written");
    assert_eq!(saved, auditor.trusted_root());

    // A restarted auditor resumes from the snapshot and keeps verifying
    log.append(["three"]).await;
    let mut restarted = Auditor::new(
        log.clone(),
        RecordingReporter::default(),
        TrustedRootStore::with_root(saved),
    );
    restarted.check_latest().await;
    assert_eq!(
        restarted.reporter().events(),
        vec![Event::Advanced { old_size: 2, new_size: 3, revision: 2 }]
    );
}

#[tokio::test]
async fn test_run_audits_until_cancelled() {
    let log = MemoryLogSource::new();
    log.append(["genesis"]).await;
    let mut auditor = Auditor::new(log.clone(), RecordingReporter::default(), TrustedRootStore::new())
        .with_poll_interval(Duration::from_millis(5));

    let mut trusted = auditor.subscribe();
    let writer = log.clone();
    let (stop_tx, stop_rx) = tokio::sync::oneshot::channel::<()>();
    let driver = tokio::spawn(async move {
        for batch in 1..=3u64 {
            trusted.changed().await.unwrap();
            if batch < 3 {
                writer.append([format!("batch-{}", batch)]).await;
            }
        }
        stop_tx.send(()).unwrap();
    });

    auditor
        .run(async {
            let _ = stop_rx.await;
        })
        .await;
    driver.await.unwrap();

    let trusted = auditor.trusted_root();
    assert_eq!(trusted.tree_size, 3);
    assert_eq!(trusted.revision, 3);
    assert!(trusted.same_checkpoint(&log.root().await));
    assert!(trusted.timestamp.is_some());
    assert_eq!(auditor.state(), AuditState::Idle);
}

#[tokio::test]
async fn test_cancel_before_first_tick_leaves_empty_root() {
    let log = MemoryLogSource::new();
    log.append(["a"]).await;
    let mut auditor = Auditor::new(log, RecordingReporter::default(), TrustedRootStore::new());

    auditor.run(async {}).await;
    assert_eq!(auditor.trusted_root(), LogRoot::empty());
}
