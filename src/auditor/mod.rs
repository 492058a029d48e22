//! Log Auditor
//!
//! Periodically fetches the latest root of a log, verifies it extends the
//! trusted root, and advances the trusted root when it does.
//!
//! Each cycle moves `Idle -> Fetching -> Verifying -> Idle`, published on a
//! watch channel next to the trusted root. The trusted root is only written after a verification has fully succeeded, so abandoning a
//! cycle at any point leaves it intact.

pub mod http;
pub mod report;
pub mod source;

pub use http::HttpLogSource;
pub use report::{Reporter, TracingReporter};
pub use source::{LatestRoot, LogSource, MemoryLogSource};

use std::future::Future;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::{interval, timeout, MissedTickBehavior};
use tracing::{debug, error, info, trace, warn};

use crate::error::{FetchError, VerificationError};
use crate::merkle::root::LogRoot;
use crate::snapshot::RootSnapshot;
use crate::store::{Advance, TrustedRootStore};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(2);

/// Where the auditor is within a cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditState {
    Idle,
    Fetching,
    Verifying,
}

/// What a single audit cycle concluded
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    Verified(Advance),
    FetchFailed(FetchError),
    VerificationFailed(VerificationError),
}

/// Periodic driver for one log
pub struct Auditor<S, R> {
    source: S,
    reporter: R,
    store: TrustedRootStore,
    state: watch::Sender<AuditState>,
    poll_interval: Duration,
    fetch_timeout: Duration,
    snapshot: Option<RootSnapshot>,
}

impl<S: LogSource, R: Reporter> Auditor<S, R> {
    pub fn new(source: S, reporter: R, store: TrustedRootStore) -> Self {
        Self {
            source,
            reporter,
            store,
            state: watch::channel(AuditState::Idle).0,
            poll_interval: DEFAULT_POLL_INTERVAL,
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
            snapshot: None,
        }
    }

    /// A zero interval cannot drive a ticker and falls back to the default
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        if poll_interval.is_zero() {
            warn!("Poll interval must be positive, using {:?}", DEFAULT_POLL_INTERVAL);
            self.poll_interval = DEFAULT_POLL_INTERVAL;
        } else {
            self.poll_interval = poll_interval;
        }
        self
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    pub fn with_fetch_timeout(mut self, fetch_timeout: Duration) -> Self {
        self.fetch_timeout = fetch_timeout;
        self
    }

    /// Persist every advanced root to `snapshot`
    pub fn with_snapshot(mut self, snapshot: RootSnapshot) -> Self {
        self.snapshot = Some(snapshot);
        self
    }

    pub fn state(&self) -> AuditState {
        *self.state.borrow()
    }

    /// Follow the cycle state from another task
    pub fn subscribe_state(&self) -> watch::Receiver<AuditState> {
        self.state.subscribe()
    }

    fn set_state(&self, state: AuditState) {
        trace!("Audit state: {:?}", state);
        self.state.send_replace(state);
    }

    pub fn trusted_root(&self) -> LogRoot {
        self.store.current()
    }

    pub fn subscribe(&self) -> watch::Receiver<LogRoot> {
        self.store.subscribe()
    }

    pub fn reporter(&self) -> &R {
        &self.reporter
    }

    /// Run one fetch-and-verify cycle
    pub async fn check_latest(&mut self) -> CycleOutcome {
        let trusted = self.store.current();

        self.set_state(AuditState::Fetching);
        let fetched = match timeout(self.fetch_timeout, self.source.fetch_latest(trusted.tree_size)).await {
            Ok(result) => result,
            Err(_) => Err(FetchError::Timeout(self.fetch_timeout)),
        };

        let latest = match fetched {
            Ok(latest) => latest,
            Err(err) => {
                self.set_state(AuditState::Idle);
                self.reporter.fetch_failed(&err);
                return CycleOutcome::FetchFailed(err);
            }
        };

        self.set_state(AuditState::Verifying);
        // Nothing to prove against the empty log; ignore whatever proof came along
        let proof = if trusted.tree_size == 0 {
            if !latest.proof.is_empty() {
                debug!("Discarding {} proof hashes sent for the empty log", latest.proof.len());
            }
            Vec::new()
        } else {
            latest.proof.into_hashes()
        };

        let result = self.store.advance(latest.root, &proof);
        self.set_state(AuditState::Idle);

        match result {
            Ok(advance) => {
                match &advance {
                    Advance::Advanced { previous } => {
                        let now = self.store.current();
                        self.reporter
                            .root_advanced(previous.tree_size, now.tree_size, now.revision);
                        self.persist(&now);
                    }
                    Advance::Unchanged => self.reporter.root_unchanged(&trusted),
                    Advance::Stale {
                        trusted_revision,
                        candidate_revision,
                    } => {
                        debug!(
                            "Ignoring root with revision {} (trusted revision {})",
                            candidate_revision, trusted_revision
                        );
                        self.reporter.root_unchanged(&trusted);
                    }
                }
                CycleOutcome::Verified(advance)
            }
            Err(err) => {
                self.reporter.verification_failed(&err);
                CycleOutcome::VerificationFailed(err)
            }
        }
    }

    /// Audit on every tick until `shutdown` resolves
    pub async fn run<F>(&mut self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        info!("auditor running, poll interval: {:?}", self.poll_interval);
        tokio::pin!(shutdown);

        let mut ticker = interval(self.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = &mut shutdown => {
                    info!("shutdown requested - finishing");
                    break;
                }
                _ = ticker.tick() => {
                    trace!("Tick");
                    self.check_latest().await;
                }
            }
        }
    }

    fn persist(&self, root: &LogRoot) {
        if let Some(snapshot) = &self.snapshot {
            if let Err(e) = snapshot.save(root) {
                error!("Failed to persist trusted root to {:?}: {}", snapshot.path(), e);
            }
        }
    }
}
