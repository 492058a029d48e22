//! Inclusion Proof Verification

use crate::error::{Mismatch, VerificationError};
use crate::merkle::consistency::{chain_border_right, chain_inner, decompose_inclusion_proof};
use crate::merkle::hash::Digest;
use crate::merkle::root::LogRoot;

/// Verify that `leaf_hash` sits at `leaf_index` in the log committed to by `root`
pub fn verify_inclusion(
    leaf_index: u64,
    root: &LogRoot,
    leaf_hash: &Digest,
    proof: &[Digest],
) -> Result<(), VerificationError> {
    if leaf_index >= root.tree_size {
        return Err(VerificationError::LeafIndexOutOfRange {
            index: leaf_index,
            tree_size: root.tree_size,
        });
    }

    let (inner, border) = decompose_inclusion_proof(leaf_index, root.tree_size);
    if proof.len() != inner + border {
        return Err(VerificationError::MalformedProof {
            expected: inner + border,
            actual: proof.len(),
        });
    }

    let (inner_path, border_path) = proof.split_at(inner);
    let computed = chain_border_right(chain_inner(*leaf_hash, inner_path, leaf_index), border_path);
    if computed != root.root_hash {
        return Err(VerificationError::ConsistencyMismatch(Mismatch::InclusionRoot));
    }

    Ok(())
}
