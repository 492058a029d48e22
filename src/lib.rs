pub mod auditor;
pub mod config;
pub mod error;
pub mod merkle;
pub mod server;
pub mod snapshot;
pub mod store;

pub use auditor::{Auditor, CycleOutcome, LogSource, Reporter};
pub use error::{AuditorError, FetchError, Mismatch, VerificationError};
pub use merkle::{verify_consistency, ConsistencyProof, LogRoot};
pub use store::{Advance, TrustedRootStore};
