//! Reference Merkle Tree
//!
//! In-memory RFC 6962 tree over leaf hashes. Computes the root of any prefix
//! of the log together with consistency and inclusion proofs, so the
//! verifiers can be exercised against honestly generated data.

use tracing::debug;

use crate::error::TreeError;
use crate::merkle::hash::{empty_root, leaf_hash, node_hash, Digest};
use crate::merkle::root::{ConsistencyProof, InclusionProof};

/// Append-only Merkle tree holding every leaf hash
#[derive(Debug, Clone, Default)]
pub struct MerkleTree {
    leaves: Vec<Digest>,
}

impl MerkleTree {
    pub fn new() -> Self {
        Self { leaves: Vec::new() }
    }

    /// Hash `data` as a leaf and append it, returning its index
    pub fn append(&mut self, data: &[u8]) -> u64 {
        self.append_leaf_hash(leaf_hash(data))
    }

    /// Append an already computed leaf hash, returning its index
    pub fn append_leaf_hash(&mut self, hash: Digest) -> u64 {
        self.leaves.push(hash);
        self.len() - 1
    }

    pub fn len(&self) -> u64 {
        self.leaves.len() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.leaves.is_empty()
    }

    pub fn leaf(&self, index: u64) -> Option<Digest> {
        self.leaves.get(index as usize).copied()
    }

    /// Root hash over every leaf appended so far
    pub fn root(&self) -> Digest {
        mth(&self.leaves)
    }

    /// Root hash of the log as it was when it held `size` leaves
    pub fn root_at(&self, size: u64) -> Result<Digest, TreeError> {
        Ok(mth(self.prefix(size)?))
    }

    /// Hash of the subtree over leaves `start..end`
    pub fn subtree_hash(&self, start: u64, end: u64) -> Result<Digest, TreeError> {
        if start > end {
            return Err(TreeError::InvalidRange {
                old_size: start,
                new_size: end,
            });
        }
        let prefix = self.prefix(end)?;
        Ok(mth(&prefix[start as usize..]))
    }

    /// Consistency proof between two prefix sizes of this tree
    pub fn consistency_proof(&self, old_size: u64, new_size: u64) -> Result<ConsistencyProof, TreeError> {
        if old_size > new_size {
            return Err(TreeError::InvalidRange { old_size, new_size });
        }
        let leaves = self.prefix(new_size)?;

        let mut proof = Vec::new();
        if old_size > 0 && old_size < new_size {
            subproof(old_size as usize, leaves, true, &mut proof);
        }

        debug!(
            "Generated consistency proof ({}, {}) with {} hashes",
            old_size,
            new_size,
            proof.len()
        );
        Ok(ConsistencyProof::new(proof))
    }

    /// Inclusion proof for leaf `index` in the tree of `size` leaves
    pub fn inclusion_proof(&self, index: u64, size: u64) -> Result<InclusionProof, TreeError> {
        if index >= size {
            return Err(TreeError::IndexOutOfRange { index, size });
        }
        let leaves = self.prefix(size)?;

        let mut proof = Vec::new();
        path(index as usize, leaves, &mut proof);
        Ok(InclusionProof::new(proof))
    }

    fn prefix(&self, size: u64) -> Result<&[Digest], TreeError> {
        if size > self.len() {
            return Err(TreeError::SizeOutOfRange {
                requested: size,
                available: self.len(),
            });
        }
        Ok(&self.leaves[..size as usize])
    }
}

/// Largest power of two strictly less than `n` (n >= 2)
fn split_point(n: usize) -> usize {
    let mut k = 1;
    while k << 1 < n {
        k <<= 1;
    }
    k
}

/// Merkle Tree Hash of a list of leaf hashes
fn mth(leaves: &[Digest]) -> Digest {
    match leaves.len() {
        0 => empty_root(),
        1 => leaves[0],
        n => {
            let k = split_point(n);
            node_hash(&mth(&leaves[..k]), &mth(&leaves[k..]))
        }
    }
}

/// SUBPROOF(m, leaves, complete) from RFC 6962 section 2.1.2
fn subproof(m: usize, leaves: &[Digest], complete: bool, proof: &mut Vec<Digest>) {
    let n = leaves.len();
    if m == n {
        if !complete {
            proof.push(mth(leaves));
        }
        return;
    }

    let k = split_point(n);
    if m <= k {
        subproof(m, &leaves[..k], complete, proof);
        proof.push(mth(&leaves[k..]));
    } else {
        subproof(m - k, &leaves[k..], false, proof);
        proof.push(mth(&leaves[..k]));
    }
}

/// PATH(m, leaves) from RFC 6962 section 2.1.1
fn path(m: usize, leaves: &[Digest], proof: &mut Vec<Digest>) {
    let n = leaves.len();
    if n <= 1 {
        return;
    }

    let k = split_point(n);
    if m < k {
        path(m, &leaves[..k], proof);
        proof.push(mth(&leaves[k..]));
    } else {
        path(m - k, &leaves[k..], proof);
        proof.push(mth(&leaves[..k]));
    }
}
