//! Resource declarations on disk
//!
//! A project keeps one directory per resource under `sources/`,
//! `destinations/` and `connections/`, each holding a `configuration` file:
//!
//! ```text
//! project/
//! ├── converge.yaml
//! ├── sources/
//! │   └── pg/
//! │       ├── configuration.yaml
//! │       └── state.yaml
//! └── connections/
//!     └── pg_to_warehouse/
//!         └── configuration.yaml
//! ```

use crate::kinds::ResourceType;
use crate::{Error, Result};
use converge_fs::ConfigStore;
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};

/// Accepted configuration file names, in lookup order
pub const CONFIGURATION_FILE_NAMES: &[&str] = &[
    "configuration.yaml",
    "configuration.yml",
    "configuration.json",
    "configuration.toml",
];

/// One declared resource.
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceDefinition {
    pub resource_type: ResourceType,
    pub workspace_id: String,
    pub configuration_path: PathBuf,
    pub local: Map<String, Value>,
}

impl ResourceDefinition {
    pub fn new(
        resource_type: ResourceType,
        workspace_id: impl Into<String>,
        local: Map<String, Value>,
        configuration_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            resource_type,
            workspace_id: workspace_id.into(),
            configuration_path: configuration_path.into(),
            local,
        }
    }

    /// Load a declaration file.
    ///
    /// The file must be a mapping with a `definition_type` naming the kind.
    pub fn from_file(path: &Path, workspace_id: &str) -> Result<Self> {
        let value: Value = ConfigStore::new().load(path)?;
        let Value::Object(local) = value else {
            return Err(Error::InvalidDefinition {
                path: path.to_path_buf(),
                message: "top level must be a mapping".to_string(),
            });
        };

        let resource_type = local
            .get("definition_type")
            .and_then(Value::as_str)
            .ok_or_else(|| Error::InvalidDefinition {
                path: path.to_path_buf(),
                message: "missing `definition_type`".to_string(),
            })?
            .parse::<ResourceType>()
            .map_err(|message| Error::InvalidDefinition {
                path: path.to_path_buf(),
                message,
            })?;

        Ok(Self::new(resource_type, workspace_id, local, path))
    }

    pub fn resource_name(&self) -> Option<&str> {
        self.local.get("resource_name").and_then(Value::as_str)
    }
}

/// Find every declaration file under a project root.
///
/// Order is stable: sources, then destinations, then connections, each
/// alphabetical by directory name. Directories without a configuration file
/// are skipped.
pub fn discover(root: &Path) -> Result<Vec<PathBuf>> {
    let mut found = Vec::new();

    for resource_type in ResourceType::ALL {
        let kind_dir = root.join(resource_type.collection());
        if !kind_dir.is_dir() {
            continue;
        }

        for dir in resource_dirs(&kind_dir)? {
            match CONFIGURATION_FILE_NAMES
                .iter()
                .map(|name| dir.join(name))
                .find(|candidate| candidate.is_file())
            {
                Some(path) => found.push(path),
                None => tracing::warn!(?dir, "No configuration file, skipping"),
            }
        }
    }

    Ok(found)
}

/// Subdirectories of a kind directory, sorted by name.
fn resource_dirs(kind_dir: &Path) -> Result<Vec<PathBuf>> {
    let mut dirs = Vec::new();
    for entry in fs::read_dir(kind_dir).map_err(|e| converge_fs::Error::io(kind_dir, e))? {
        let path = entry
            .map_err(|e| converge_fs::Error::io(kind_dir, e))?
            .path();
        if path.is_dir() {
            dirs.push(path);
        }
    }
    dirs.sort();
    Ok(dirs)
}
