//! Shared fixtures for the integration tests
#![allow(dead_code)]

use async_trait::async_trait;
use log_auditor::auditor::{LatestRoot, LogSource, Reporter};
use log_auditor::error::{FetchError, VerificationError};
use log_auditor::merkle::{LogRoot, MerkleTree};
use std::collections::VecDeque;
use std::sync::Mutex;

/// Build a reference tree holding `size` deterministic leaves
pub fn build_tree(size: u64) -> MerkleTree {
    let mut tree = MerkleTree::new();
    for i in 0..size {
        tree.append(format!("entry-{}", i).as_bytes());
    }
    tree
}

/// Root of `tree` truncated to `size` leaves
pub fn root_at(tree: &MerkleTree, size: u64, revision: u64) -> LogRoot {
    LogRoot::new(size, tree.root_at(size).expect("size within tree"), revision)
}

/// Audit events captured in order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Advanced { old_size: u64, new_size: u64, revision: u64 },
    FetchFailed(FetchError),
    VerificationFailed(VerificationError),
}

#[derive(Default)]
pub struct RecordingReporter {
    events: Mutex<Vec<Event>>,
}

impl RecordingReporter {
    pub fn events(&self) -> Vec<Event> {
        self.events.lock().unwrap().clone()
    }
}

impl Reporter for RecordingReporter {
    fn root_advanced(&self, old_size: u64, new_size: u64, revision: u64) {
        self.events.lock().unwrap().push(Event::Advanced {
            old_size,
            new_size,
            revision,
        });
    }

    fn fetch_failed(&self, err: &FetchError) {
        self.events.lock().unwrap().push(Event::FetchFailed(err.clone()));
    }

    fn verification_failed(&self, err: &VerificationError) {
        self.events
            .lock()
            .unwrap()
            .push(Event::VerificationFailed(err.clone()));
    }
}

/// Source replaying a fixed script of responses, one per fetch
pub struct ScriptedSource {
    responses: Mutex<VecDeque<Result<LatestRoot, FetchError>>>,
    requested_sizes: Mutex<Vec<u64>>,
}

impl ScriptedSource {
    pub fn new(responses: Vec<Result<LatestRoot, FetchError>>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            requested_sizes: Mutex::new(Vec::new()),
        }
    }

    pub fn requested_sizes(&self) -> Vec<u64> {
        self.requested_sizes.lock().unwrap().clone()
    }
}

#[async_trait]
impl LogSource for ScriptedSource {
    async fn fetch_latest(&self, known_tree_size: u64) -> Result<LatestRoot, FetchError> {
        self.requested_sizes.lock().unwrap().push(known_tree_size);
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(FetchError::Transport("script exhausted".to_string())))
    }
}
