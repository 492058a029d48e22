//! Consistency Proof Verification
//!
//! Checks that a newer log root commits to every leaf of an older one, using
//! RFC 6962 consistency proofs. Pure computation, no I/O.

use tracing::debug;

use crate::error::{Mismatch, VerificationError};
use crate::merkle::hash::{node_hash, Digest};
use crate::merkle::root::LogRoot;

/// Split an inclusion proof for `index` in a tree of `size` leaves into its
/// inner part (levels below the point where the path meets the right border)
/// and its border part (left siblings on the right border).
pub(crate) fn decompose_inclusion_proof(index: u64, size: u64) -> (usize, usize) {
    let inner = inner_proof_size(index, size);
    let border = (index >> inner).count_ones() as usize;
    (inner, border)
}

fn inner_proof_size(index: u64, size: u64) -> usize {
    let diverge = index ^ (size - 1);
    (u64::BITS - diverge.leading_zeros()) as usize
}

/// Fold inner siblings into `seed`; bit `i` of `index` says whether the node
/// at level `i` is a right child (sibling on the left).
pub(crate) fn chain_inner(seed: Digest, proof: &[Digest], index: u64) -> Digest {
    proof.iter().enumerate().fold(seed, |acc, (level, sibling)| {
        if (index >> level) & 1 == 0 {
            node_hash(&acc, sibling)
        } else {
            node_hash(sibling, &acc)
        }
    })
}

/// Like `chain_inner` but only folds left siblings, which yields the root of
/// the smaller tree that ends at the same leaf.
fn chain_inner_right(seed: Digest, proof: &[Digest], index: u64) -> Digest {
    proof.iter().enumerate().fold(seed, |acc, (level, sibling)| {
        if (index >> level) & 1 == 1 {
            node_hash(sibling, &acc)
        } else {
            acc
        }
    })
}

pub(crate) fn chain_border_right(seed: Digest, proof: &[Digest]) -> Digest {
    proof
        .iter()
        .fold(seed, |acc, sibling| node_hash(sibling, &acc))
}

/// Number of hashes a consistency proof between the two sizes must contain.
///
/// Returns `None` when `new_size < old_size`, for which no proof exists.
pub fn expected_proof_len(old_size: u64, new_size: u64) -> Option<usize> {
    if new_size < old_size {
        return None;
    }
    if old_size == 0 || old_size == new_size {
        return Some(0);
    }

    let (inner, border) = decompose_inclusion_proof(old_size - 1, new_size);
    let shift = old_size.trailing_zeros() as usize;
    let seeded_by_old_root = old_size == 1u64 << shift;
    let start = if seeded_by_old_root { 0 } else { 1 };

    Some(start + inner - shift + border)
}

/// Verify that `new` extends `old` according to `proof`.
///
/// On success the claimed new root is handed back untouched; verification
/// attests to it, it does not rewrite it. Revision ordering is not checked
/// here.
pub fn verify_consistency<'a>(
    old: &LogRoot,
    new: &'a LogRoot,
    proof: &[Digest],
) -> Result<&'a LogRoot, VerificationError> {
    let (old_size, new_size) = (old.tree_size, new.tree_size);

    if new_size < old_size {
        return Err(VerificationError::ConsistencyMismatch(Mismatch::TreeShrank {
            old_size,
            new_size,
        }));
    }

    // Nothing is trusted yet, so any root (even a size 0 one) extends it
    if old_size == 0 {
        if !proof.is_empty() {
            return Err(VerificationError::MalformedProof {
                expected: 0,
                actual: proof.len(),
            });
        }
        return Ok(new);
    }

    if old_size == new_size {
        if !proof.is_empty() {
            return Err(VerificationError::MalformedProof {
                expected: 0,
                actual: proof.len(),
            });
        }
        if old.root_hash != new.root_hash {
            return Err(VerificationError::ConsistencyMismatch(
                Mismatch::RefreshHashDiffers,
            ));
        }
        return Ok(new);
    }

    let (inner, border) = decompose_inclusion_proof(old_size - 1, new_size);
    let shift = old_size.trailing_zeros() as usize;
    // shift < inner whenever old_size < new_size
    let inner = inner - shift;

    // When old_size is a power of two the old root is itself the subtree the
    // walk starts from; otherwise the first proof element is that subtree.
    let (seed, start) = if old_size == 1u64 << shift {
        (old.root_hash, 0)
    } else {
        match proof.first() {
            Some(first) => (*first, 1),
            None => {
                return Err(VerificationError::MalformedProof {
                    expected: 1 + inner + border,
                    actual: 0,
                })
            }
        }
    };

    let expected = start + inner + border;
    if proof.len() != expected {
        return Err(VerificationError::MalformedProof {
            expected,
            actual: proof.len(),
        });
    }

    let path = &proof[start..];
    let (inner_path, border_path) = path.split_at(inner);
    let mask = (old_size - 1) >> shift;

    let old_hash = chain_border_right(chain_inner_right(seed, inner_path, mask), border_path);
    if old_hash != old.root_hash {
        debug!(
            "Reconstructed old root {} does not match trusted {}",
            hex::encode(old_hash),
            hex::encode(old.root_hash)
        );
        return Err(VerificationError::ConsistencyMismatch(Mismatch::OldRootHash));
    }

    let new_hash = chain_border_right(chain_inner(seed, inner_path, mask), border_path);
    if new_hash != new.root_hash {
        debug!(
            "Reconstructed new root {} does not match claimed {}",
            hex::encode(new_hash),
            hex::encode(new.root_hash)
        );
        return Err(VerificationError::ConsistencyMismatch(Mismatch::NewRootHash));
    }

    Ok(new)
}
