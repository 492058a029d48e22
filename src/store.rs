//! Trusted Root Store
//!
//! Holds the single log root the auditor currently trusts. The only way to
//! change it is a verified advance; readers get snapshots or a watch
//! subscription and can never write.

use tokio::sync::watch;
use tracing::debug;

use crate::error::VerificationError;
use crate::merkle::consistency::verify_consistency;
use crate::merkle::hash::Digest;
use crate::merkle::root::LogRoot;

/// Result of a successful advance attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Advance {
    /// The candidate replaced the trusted root
    Advanced { previous: LogRoot },
    /// The candidate is the trusted checkpoint again
    Unchanged,
    /// The candidate verified but its revision does not move forward
    Stale {
        trusted_revision: u64,
        candidate_revision: u64,
    },
}

impl Advance {
    pub fn is_advanced(&self) -> bool {
        matches!(self, Advance::Advanced { .. })
    }
}

/// Owner of the trusted root
#[derive(Debug)]
pub struct TrustedRootStore {
    trusted: watch::Sender<LogRoot>,
}

impl TrustedRootStore {
    /// Start from the empty log, which is trusted without proof
    pub fn new() -> Self {
        Self::with_root(LogRoot::empty())
    }

    /// Start from a root obtained out of band, e.g. a persisted snapshot
    pub fn with_root(root: LogRoot) -> Self {
        let (trusted, _) = watch::channel(root);
        Self { trusted }
    }

    /// Snapshot of the currently trusted root
    pub fn current(&self) -> LogRoot {
        self.trusted.borrow().clone()
    }

    /// Read-only stream of trusted roots for other tasks
    pub fn subscribe(&self) -> watch::Receiver<LogRoot> {
        self.trusted.subscribe()
    }

    /// Replace the trusted root with `candidate` iff `verify` accepts the
    /// transition and the revision strictly increases. Any error leaves the
    /// trusted root untouched.
    pub fn try_advance<F>(
        &mut self,
        candidate: LogRoot,
        proof: &[Digest],
        verify: F,
    ) -> Result<Advance, VerificationError>
    where
        F: FnOnce(&LogRoot, &LogRoot, &[Digest]) -> Result<(), VerificationError>,
    {
        let current = self.current();
        verify(&current, &candidate, proof)?;

        if candidate.revision > current.revision {
            debug!("Advancing trusted root {} -> {}", current.summary(), candidate.summary());
            let previous = self.trusted.send_replace(candidate);
            return Ok(Advance::Advanced { previous });
        }

        if candidate.same_checkpoint(&current) {
            return Ok(Advance::Unchanged);
        }

        Ok(Advance::Stale {
            trusted_revision: current.revision,
            candidate_revision: candidate.revision,
        })
    }

    /// `try_advance` with RFC 6962 consistency verification
    pub fn advance(&mut self, candidate: LogRoot, proof: &[Digest]) -> Result<Advance, VerificationError> {
        self.try_advance(candidate, proof, |old, new, proof| {
            verify_consistency(old, new, proof).map(|_| ())
        })
    }
}

impl Default for TrustedRootStore {
    fn default() -> Self {
        Self::new()
    }
}
