//! Merkle Log Verification
//!
//! RFC 6962 hashing, consistency and inclusion proof verification, and an
//! in-memory reference tree for generating honest proofs.

pub mod consistency;
pub mod hash;
pub mod inclusion;
pub mod root;
pub mod tree;

pub use consistency::{expected_proof_len, verify_consistency};
pub use hash::{empty_root, leaf_hash, node_hash, Digest};
pub use inclusion::verify_inclusion;
pub use root::{ConsistencyProof, InclusionProof, LogRoot};
pub use tree::MerkleTree;
