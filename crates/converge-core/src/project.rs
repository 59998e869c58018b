//! Project-level configuration

use crate::{Error, Result};
use converge_fs::ConfigStore;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Accepted project file names, in lookup order
pub const PROJECT_FILE_NAMES: &[&str] = &[
    "converge.yaml",
    "converge.yml",
    "converge.json",
    "converge.toml",
];

/// Settings shared by every declaration in a project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectConfig {
    /// Workspace every declaration is applied to
    pub workspace_id: String,
}

impl ProjectConfig {
    /// The project file under `root`, if any.
    pub fn find(root: &Path) -> Option<PathBuf> {
        PROJECT_FILE_NAMES
            .iter()
            .map(|name| root.join(name))
            .find(|path| path.is_file())
    }

    /// Load the project file under `root`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ProjectConfigNotFound`] if there is no project file,
    /// or a parse error if it is malformed.
    pub fn load(root: &Path) -> Result<Self> {
        let path = Self::find(root).ok_or_else(|| Error::ProjectConfigNotFound {
            root: root.to_path_buf(),
        })?;
        tracing::debug!(?path, "Loading project config");
        Ok(ConfigStore::new().load(&path)?)
    }
}
