use std::time::Duration;
use thiserror::Error;

/// Which integrity check a consistency or inclusion proof failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mismatch {
    /// The new root is smaller than the trusted one
    TreeShrank { old_size: u64, new_size: u64 },
    /// Same tree size but a different root hash
    RefreshHashDiffers,
    /// The proof does not reconstruct the trusted root hash
    OldRootHash,
    /// The proof does not reconstruct the claimed new root hash
    NewRootHash,
    /// An inclusion proof does not reconstruct the root hash
    InclusionRoot,
}

impl std::fmt::Display for Mismatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Mismatch::TreeShrank { old_size, new_size } => {
                write!(f, "log shrank from {} to {} entries", old_size, new_size)
            }
            Mismatch::RefreshHashDiffers => {
                write!(f, "root hash changed without the tree growing")
            }
            Mismatch::OldRootHash => write!(f, "proof does not reproduce the trusted root hash"),
            Mismatch::NewRootHash => write!(f, "proof does not reproduce the claimed new root hash"),
            Mismatch::InclusionRoot => write!(f, "inclusion proof does not reproduce the root hash"),
        }
    }
}

/// Failure to verify a proof against a pair of roots
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VerificationError {
    #[error("Malformed proof: expected {expected} hashes, got {actual}")]
    MalformedProof { expected: usize, actual: usize },

    #[error("Consistency mismatch: {0}")]
    ConsistencyMismatch(Mismatch),

    #[error("Leaf index {index} out of range for tree size {tree_size}")]
    LeafIndexOutOfRange { index: u64, tree_size: u64 },
}

impl VerificationError {
    /// True when the log itself appears to have misbehaved
    pub fn is_integrity_failure(&self) -> bool {
        matches!(self, VerificationError::ConsistencyMismatch(_))
    }
}

/// Transient failure while retrieving a root and proof from the log
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("Fetch timed out after {0:?}")]
    Timeout(Duration),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Log service returned HTTP {0}")]
    Status(u16),

    #[error("Protocol error: {0}")]
    Protocol(String),
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::Protocol(format!("Failed to decode response: {}", err))
        } else if let Some(status) = err.status() {
            Self::Status(status.as_u16())
        } else {
            Self::Transport(err.to_string())
        }
    }
}

/// Errors raised by the in-memory reference tree
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TreeError {
    #[error("Tree size {requested} exceeds the {available} leaves available")]
    SizeOutOfRange { requested: u64, available: u64 },

    #[error("Invalid proof range: old size {old_size}, new size {new_size}")]
    InvalidRange { old_size: u64, new_size: u64 },

    #[error("Leaf index {index} out of range for tree size {size}")]
    IndexOutOfRange { index: u64, size: u64 },
}

#[derive(Error, Debug)]
pub enum AuditorError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    #[error("Verification error: {0}")]
    Verification(#[from] VerificationError),

    #[error("Snapshot error: {0}")]
    SnapshotError(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Status server error: {0}")]
    ServerError(String),
}

impl From<serde_json::Error> for AuditorError {
    fn from(err: serde_json::Error) -> Self {
        Self::SnapshotError(format!("JSON serialization error: {}", err))
    }
}

impl From<::config::ConfigError> for AuditorError {
    fn from(err: ::config::ConfigError) -> Self {
        Self::ConfigError(err.to_string())
    }
}
