//! Sidecar state files
//!
//! Every declaration directory holds a `state.yaml` recording what was last
//! applied: the remote id and the checksum of the declaration at that time.

use crate::Result;
use chrono::Utc;
use converge_fs::ConfigStore;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Fixed name of the sidecar state file
pub const STATE_FILE_NAME: &str = "state.yaml";

/// What was last successfully applied for one declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceState {
    pub configuration_path: PathBuf,
    pub resource_id: String,
    /// Unix timestamp (seconds) of the apply that wrote this record
    pub generation_timestamp: i64,
    pub configuration_checksum: String,
}

impl ResourceState {
    pub fn new(
        configuration_path: impl Into<PathBuf>,
        resource_id: impl Into<String>,
        configuration_checksum: impl Into<String>,
    ) -> Self {
        Self {
            configuration_path: configuration_path.into(),
            resource_id: resource_id.into(),
            generation_timestamp: Utc::now().timestamp(),
            configuration_checksum: configuration_checksum.into(),
        }
    }
}

/// Reads and writes [`ResourceState`] sidecars.
#[derive(Debug, Default, Clone, Copy)]
pub struct StateStore {
    store: ConfigStore,
}

impl StateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Path of the sidecar for a configuration file: a sibling named
    /// [`STATE_FILE_NAME`].
    pub fn state_path(configuration_path: &Path) -> PathBuf {
        configuration_path
            .parent()
            .unwrap_or_else(|| Path::new(""))
            .join(STATE_FILE_NAME)
    }

    /// Load the state for a configuration file.
    ///
    /// Returns `Ok(None)` when no sidecar exists yet.
    ///
    /// # Errors
    ///
    /// Returns an error if the sidecar exists but cannot be read or parsed.
    pub fn load(&self, configuration_path: &Path) -> Result<Option<ResourceState>> {
        let path = Self::state_path(configuration_path);
        if !path.is_file() {
            tracing::debug!(?path, "No state file, resource was never applied");
            return Ok(None);
        }

        let state: ResourceState = self.store.load(&path)?;
        tracing::debug!(?path, resource_id = %state.resource_id, "Loaded state");
        Ok(Some(state))
    }

    /// Write a fresh state record, replacing any previous one.
    pub fn save(
        &self,
        configuration_path: &Path,
        resource_id: &str,
        configuration_checksum: &str,
    ) -> Result<ResourceState> {
        let state = ResourceState::new(configuration_path, resource_id, configuration_checksum);
        let path = Self::state_path(configuration_path);
        self.store.save(&path, &state)?;
        tracing::info!(?path, resource_id, "Saved state");
        Ok(state)
    }
}
