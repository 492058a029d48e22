//! Log Sources
//!
//! The collaborator the auditor polls for the latest root and a consistency
//! proof from the size it already trusts.

use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

use crate::error::FetchError;
use crate::merkle::root::{ConsistencyProof, LogRoot};
use crate::merkle::tree::MerkleTree;

/// Latest root together with a proof from the caller's known size
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LatestRoot {
    pub root: LogRoot,
    #[serde(default)]
    pub proof: ConsistencyProof,
}

/// Anything that can report the head of an append-only log
#[async_trait]
pub trait LogSource: Send + Sync {
    /// Fetch the latest root and a proof sized for
    /// `(known_tree_size, root.tree_size)`
    async fn fetch_latest(&self, known_tree_size: u64) -> Result<LatestRoot, FetchError>;
}

#[async_trait]
impl<S: LogSource + ?Sized> LogSource for Arc<S> {
    async fn fetch_latest(&self, known_tree_size: u64) -> Result<LatestRoot, FetchError> {
        (**self).fetch_latest(known_tree_size).await
    }
}

struct MemoryLog {
    tree: MerkleTree,
    revision: u64,
}

/// In-process log backed by a reference Merkle tree.
///
/// Every append bumps the revision. Cloning shares the same log, so a test
/// can keep appending while an auditor polls another handle.
#[derive(Clone)]
pub struct MemoryLogSource {
    inner: Arc<Mutex<MemoryLog>>,
}

impl MemoryLogSource {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(MemoryLog {
                tree: MerkleTree::new(),
                revision: 0,
            })),
        }
    }

    /// Append entries as one new revision, returning the new tree size
    pub async fn append<I, D>(&self, entries: I) -> u64
    where
        I: IntoIterator<Item = D>,
        D: AsRef<[u8]>,
    {
        let mut log = self.inner.lock().await;
        for entry in entries {
            log.tree.append(entry.as_ref());
        }
        log.revision += 1;
        log.tree.len()
    }

    /// Root of the log as it stands now
    pub async fn root(&self) -> LogRoot {
        let log = self.inner.lock().await;
        LogRoot::new(log.tree.len(), log.tree.root(), log.revision)
    }
}

impl Default for MemoryLogSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LogSource for MemoryLogSource {
    async fn fetch_latest(&self, known_tree_size: u64) -> Result<LatestRoot, FetchError> {
        let log = self.inner.lock().await;
        let size = log.tree.len();

        let proof = log
            .tree
            .consistency_proof(known_tree_size, size)
            .map_err(|e| FetchError::Protocol(e.to_string()))?;

        debug!(
            "Memory log serving size={} revision={} for known size {}",
            size, log.revision, known_tree_size
        );
        Ok(LatestRoot {
            root: LogRoot::new(size, log.tree.root(), log.revision).with_timestamp(Utc::now()),
            proof,
        })
    }
}
