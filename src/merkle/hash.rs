//! Hash Chain Primitives
//!
//! RFC 6962 domain-separated hashing for Merkle tree leaves and internal nodes.

use sha2::{Digest as _, Sha256};

/// SHA-256 output as used for every leaf, node and root hash
pub type Digest = [u8; 32];

/// Domain tag prepended to leaf data
pub const LEAF_PREFIX: u8 = 0x00;

/// Domain tag prepended to a pair of child hashes
pub const NODE_PREFIX: u8 = 0x01;

/// Compute the leaf hash: SHA256(0x00 || data)
pub fn leaf_hash(data: &[u8]) -> Digest {
    let mut hasher = Sha256::new();
    hasher.update([LEAF_PREFIX]);
    hasher.update(data);
    hasher.finalize().into()
}

/// Compute the internal node hash: SHA256(0x01 || left || right)
pub fn node_hash(left: &Digest, right: &Digest) -> Digest {
    let mut hasher = Sha256::new();
    hasher.update([NODE_PREFIX]);
    hasher.update(left);
    hasher.update(right);
    hasher.finalize().into()
}

/// Root hash of a log with no entries: SHA256 of the empty string
pub fn empty_root() -> Digest {
    Sha256::digest(b"").into()
}

/// Parse a hex string into a digest, rejecting anything that is not exactly 32 bytes
pub fn digest_from_hex(s: &str) -> Result<Digest, String> {
    let bytes = hex::decode(s).map_err(|e| format!("invalid hex digest: {}", e))?;
    bytes
        .try_into()
        .map_err(|b: Vec<u8>| format!("digest must be 32 bytes, got {}", b.len()))
}

/// Serde helpers for a single hex-encoded digest
pub mod hex_digest {
    use super::Digest;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(digest: &Digest, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(digest))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Digest, D::Error> {
        let s = String::deserialize(deserializer)?;
        super::digest_from_hex(&s).map_err(serde::de::Error::custom)
    }
}

/// Serde helpers for a list of hex-encoded digests
pub mod hex_digests {
    use super::Digest;
    use serde::ser::SerializeSeq;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(digests: &[Digest], serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(digests.len()))?;
        for digest in digests {
            seq.serialize_element(&hex::encode(digest))?;
        }
        seq.end()
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<Digest>, D::Error> {
        let raw = Vec::<String>::deserialize(deserializer)?;
        raw.iter()
            .map(|s| super::digest_from_hex(s).map_err(serde::de::Error::custom))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sha2::Digest as _;

    #[test]
    fn test_leaf_hash_uses_leaf_prefix() {
        let data = b"test data";

        let mut hasher = Sha256::new();
        hasher.update([0x00u8]);
        hasher.update(data);
        let expected: Digest = hasher.finalize().into();

        assert_eq!(leaf_hash(data), expected);
    }

    #[test]
    fn test_node_hash_uses_node_prefix() {
        let left: Digest = [0x42; 32];
        let right: Digest = [0x43; 32];

        let mut hasher = Sha256::new();
        hasher.update([0x01u8]);
        hasher.update(left);
        hasher.update(right);
        let expected: Digest = hasher.finalize().into();

        assert_eq!(node_hash(&left, &right), expected);
    }

    #[test]
    fn test_node_hash_is_order_sensitive() {
        let a = leaf_hash(b"a");
        let b = leaf_hash(b"b");
        assert_ne!(node_hash(&a, &b), node_hash(&b, &a));
    }

    #[test]
    fn test_leaf_and_node_hashes_differ() {
        // 64 bytes of leaf data vs. the same bytes split into two children
        let left: Digest = [0u8; 32];
        let right: Digest = [0u8; 32];
        let mut data = Vec::new();
        data.extend_from_slice(&left);
        data.extend_from_slice(&right);

        assert_ne!(leaf_hash(&data), node_hash(&left, &right));
    }

    #[test]
    fn test_empty_root_known_value() {
        assert_eq!(
            hex::encode(empty_root()),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_digest_from_hex() {
        let digest = leaf_hash(b"x");
        assert_eq!(digest_from_hex(&hex::encode(digest)).unwrap(), digest);
        assert!(digest_from_hex("abcd").is_err());
        assert!(digest_from_hex("not hex").is_err());
    }
}
