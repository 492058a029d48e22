//! Trusted Root Snapshots
//!
//! Optional JSON persistence of the trusted root so an auditor restarted on
//! the same host resumes from the last verified checkpoint instead of the
//! empty log.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::error::AuditorError;
use crate::merkle::root::LogRoot;

/// Location of a persisted trusted root
#[derive(Debug, Clone)]
pub struct RootSnapshot {
    path: PathBuf,
}

impl RootSnapshot {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the persisted root, or `None` if nothing has been saved yet
    pub fn load(&self) -> Result<Option<LogRoot>, AuditorError> {
        if !self.path.exists() {
            debug!("No trusted root snapshot at {:?}", self.path);
            return Ok(None);
        }

        let contents = fs::read_to_string(&self.path).map_err(|e| {
            AuditorError::SnapshotError(format!("Failed to read {:?}: {}", self.path, e))
        })?;
        let root: LogRoot = serde_json::from_str(&contents)?;

        info!("Loaded trusted root snapshot: {}", root.summary());
        Ok(Some(root))
    }

    /// Persist `root`, replacing any previous snapshot in one rename
    pub fn save(&self, root: &LogRoot) -> Result<(), AuditorError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let json = serde_json::to_string_pretty(root)?;
        let tmp = self.path.with_extension("tmp");
        {
            let mut file = fs::File::create(&tmp)?;
            file.write_all(json.as_bytes())?;
            // Contents must be durable before the rename makes them visible
            file.sync_all()?;
        }
        fs::rename(&tmp, &self.path)?;

        debug!("Saved trusted root snapshot to {:?}", self.path);
        Ok(())
    }
}
