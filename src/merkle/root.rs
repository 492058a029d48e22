//! Log Roots and Proofs
//!
//! Checkpoint and proof types shared by the verifiers, the trusted root store
//! and every log source.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::ops::Deref;

use crate::merkle::hash::{empty_root, hex_digest, hex_digests, Digest};

/// Checkpoint of the log at a given size
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogRoot {
    pub tree_size: u64,
    #[serde(with = "hex_digest")]
    pub root_hash: Digest,
    pub revision: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
}

impl LogRoot {
    pub fn new(tree_size: u64, root_hash: Digest, revision: u64) -> Self {
        Self {
            tree_size,
            root_hash,
            revision,
            timestamp: None,
        }
    }

    /// The empty-log root, trusted without proof
    pub fn empty() -> Self {
        Self::new(0, empty_root(), 0)
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    /// Same size, hash and revision; the timestamp is not part of the checkpoint
    pub fn same_checkpoint(&self, other: &LogRoot) -> bool {
        self.tree_size == other.tree_size
            && self.root_hash == other.root_hash
            && self.revision == other.revision
    }

    /// Get a human-readable summary
    pub fn summary(&self) -> String {
        format!(
            "size={} revision={} root={}",
            self.tree_size,
            self.revision,
            hex::encode(self.root_hash)
        )
    }
}

impl Default for LogRoot {
    fn default() -> Self {
        Self::empty()
    }
}

/// Ordered sibling hashes proving one tree size extends another
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConsistencyProof(#[serde(with = "hex_digests")] pub Vec<Digest>);

/// Ordered sibling hashes proving a leaf is committed by a root
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InclusionProof(#[serde(with = "hex_digests")] pub Vec<Digest>);

macro_rules! proof_common {
    ($proof:ident) => {
        impl $proof {
            pub fn new(hashes: Vec<Digest>) -> Self {
                Self(hashes)
            }

            pub fn empty() -> Self {
                Self(Vec::new())
            }

            pub fn into_hashes(self) -> Vec<Digest> {
                self.0
            }
        }

        impl Deref for $proof {
            type Target = [Digest];

            fn deref(&self) -> &[Digest] {
                &self.0
            }
        }

        impl From<Vec<Digest>> for $proof {
            fn from(hashes: Vec<Digest>) -> Self {
                Self(hashes)
            }
        }
    };
}

proof_common!(ConsistencyProof);
proof_common!(InclusionProof);
