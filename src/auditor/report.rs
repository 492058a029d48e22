//! Audit Reporting
//!
//! Fire-and-forget sink for audit outcomes. The default reporter turns them
//! into `tracing` events with severity matching the kind of failure.

use std::sync::atomic::{AtomicU32, Ordering};
use tracing::{debug, error, info, warn};

use crate::error::{FetchError, VerificationError};
use crate::merkle::root::LogRoot;

/// Receives audit events; nothing returned is consumed by the auditor
pub trait Reporter: Send + Sync {
    fn root_advanced(&self, old_size: u64, new_size: u64, revision: u64);

    fn fetch_failed(&self, err: &FetchError);

    fn verification_failed(&self, err: &VerificationError);

    /// A cycle verified but left the trusted root where it was
    fn root_unchanged(&self, _trusted: &LogRoot) {}
}

/// Reporter emitting structured `tracing` events
#[derive(Debug)]
pub struct TracingReporter {
    malformed_escalation_threshold: u32,
    consecutive_malformed: AtomicU32,
}

impl TracingReporter {
    pub fn new(malformed_escalation_threshold: u32) -> Self {
        Self {
            malformed_escalation_threshold,
            consecutive_malformed: AtomicU32::new(0),
        }
    }

    pub fn consecutive_malformed(&self) -> u32 {
        self.consecutive_malformed.load(Ordering::Relaxed)
    }

    fn reset_malformed(&self) {
        self.consecutive_malformed.store(0, Ordering::Relaxed);
    }
}

impl Default for TracingReporter {
    fn default() -> Self {
        Self::new(3)
    }
}

impl Reporter for TracingReporter {
    fn root_advanced(&self, old_size: u64, new_size: u64, revision: u64) {
        self.reset_malformed();
        info!(
            old_size,
            new_size,
            revision,
            "updated trusted root to revision={} with size={}",
            revision,
            new_size
        );
    }

    fn fetch_failed(&self, err: &FetchError) {
        warn!(error = %err, "error checking latest root");
    }

    fn verification_failed(&self, err: &VerificationError) {
        match err {
            VerificationError::ConsistencyMismatch(mismatch) => {
                self.reset_malformed();
                error!(
                    mismatch = %mismatch,
                    "LOG INTEGRITY FAILURE: log is not consistent with the trusted root"
                );
            }
            VerificationError::MalformedProof { expected, actual } => {
                let count = self.consecutive_malformed.fetch_add(1, Ordering::Relaxed) + 1;
                if count >= self.malformed_escalation_threshold {
                    error!(
                        expected,
                        actual,
                        consecutive = count,
                        "log keeps serving malformed consistency proofs"
                    );
                } else {
                    warn!(expected, actual, "malformed consistency proof");
                }
            }
            VerificationError::LeafIndexOutOfRange { index, tree_size } => {
                warn!(index, tree_size, "inclusion check for a leaf beyond the tree");
            }
        }
    }

    fn root_unchanged(&self, trusted: &LogRoot) {
        self.reset_malformed();
        debug!("trusted root unchanged: {}", trusted.summary());
    }
}
