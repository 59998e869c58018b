//! [`TestProject`] builder for declaration directories.

use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A temporary project directory with helpers to write declarations.
///
/// # Example
///
/// ```rust,no_run
/// use converge_test_utils::TestProject;
///
/// let project = TestProject::new("workspace-1");
/// let path = project.declare_source("pg", "def-1", "host: db\nport: 5432\n");
/// assert!(path.ends_with("sources/pg/configuration.yaml"));
/// ```
pub struct TestProject {
    temp_dir: TempDir,
}

impl TestProject {
    /// Create a project with a `converge.yaml` naming `workspace_id`.
    pub fn new(workspace_id: &str) -> Self {
        let project = Self::empty();
        fs::write(
            project.root().join("converge.yaml"),
            format!("workspace_id: {workspace_id}\n"),
        )
        .unwrap();
        project
    }

    /// Create a directory with no project file.
    pub fn empty() -> Self {
        Self {
            temp_dir: TempDir::new().unwrap(),
        }
    }

    pub fn root(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Write `<collection>/<name>/configuration.yaml` with raw YAML content.
    pub fn write_declaration(&self, collection: &str, name: &str, yaml: &str) -> PathBuf {
        let dir = self.root().join(collection).join(name);
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("configuration.yaml");
        fs::write(&path, yaml).unwrap();
        path
    }

    /// Declare a source. `configuration` is a YAML block without indentation.
    pub fn declare_source(&self, name: &str, definition_id: &str, configuration: &str) -> PathBuf {
        self.write_declaration(
            "sources",
            name,
            &connector_yaml("source", name, definition_id, configuration),
        )
    }

    /// Declare a destination. `configuration` is a YAML block without indentation.
    pub fn declare_destination(
        &self,
        name: &str,
        definition_id: &str,
        configuration: &str,
    ) -> PathBuf {
        self.write_declaration(
            "destinations",
            name,
            &connector_yaml("destination", name, definition_id, configuration),
        )
    }

    /// Declare a connection between existing remote ids.
    pub fn declare_connection(
        &self,
        name: &str,
        source_id: &str,
        destination_id: &str,
        configuration: &str,
    ) -> PathBuf {
        let yaml = format!(
            "resource_name: {name}\ndefinition_type: connection\nsource_id: {source_id}\n\
             destination_id: {destination_id}\nconfiguration:\n{}",
            indent(configuration)
        );
        self.write_declaration("connections", name, &yaml)
    }

    /// Path of the sidecar state file next to a declaration.
    pub fn state_path(&self, configuration_path: &Path) -> PathBuf {
        configuration_path.with_file_name("state.yaml")
    }
}

fn connector_yaml(kind: &str, name: &str, definition_id: &str, configuration: &str) -> String {
    format!(
        "resource_name: {name}\ndefinition_type: {kind}\ndefinition_id: {definition_id}\n\
         configuration:\n{}",
        indent(configuration)
    )
}

fn indent(block: &str) -> String {
    block
        .lines()
        .map(|line| format!("  {line}\n"))
        .collect()
}
