//! Plan and apply
//!
//! Turns a reconciler's [`ReconcileStatus`] into an action and runs it, and
//! applies a whole project one declaration at a time.

use crate::api::ApiClient;
use crate::definition::{self, ResourceDefinition};
use crate::kinds::{Connection, Destination, ResourceKind, ResourceType, Source};
use crate::project::ProjectConfig;
use crate::reconciler::{ReconcileStatus, Reconciler};
use crate::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Options for apply operations
#[derive(Debug, Clone, Default)]
pub struct ApplyOptions {
    /// Update resources even when the declaration did not change
    pub force: bool,
    /// Plan only: no remote write, no state write
    pub dry_run: bool,
}

/// What apply does for one declaration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplyAction {
    Create,
    Update,
    Skip,
}

/// Result of applying one declaration
#[derive(Debug, Clone)]
pub struct ApplyOutcome {
    pub resource_type: ResourceType,
    pub configuration_path: PathBuf,
    pub status: ReconcileStatus,
    pub action: ApplyAction,
    /// Remote id after the apply (before it, for a dry run)
    pub resource_id: Option<String>,
    /// Rendered remote-to-local diff, for updates
    pub diff: Option<String>,
    pub dry_run: bool,
}

/// Report from applying a project
#[derive(Debug, Clone, Default)]
pub struct ApplyReport {
    pub outcomes: Vec<ApplyOutcome>,
    /// One message per declaration that failed
    pub errors: Vec<String>,
}

impl ApplyReport {
    pub fn success(&self) -> bool {
        self.errors.is_empty()
    }

    /// Outcomes with the given action
    pub fn with_action(&self, action: ApplyAction) -> impl Iterator<Item = &ApplyOutcome> {
        self.outcomes.iter().filter(move |o| o.action == action)
    }
}

impl<K: ResourceKind, C: ApiClient + ?Sized> Reconciler<'_, K, C> {
    /// Decide what apply would do.
    pub fn plan(&self, options: &ApplyOptions) -> ApplyAction {
        match self.status() {
            ReconcileStatus::New | ReconcileStatus::OrphanLocalState => ApplyAction::Create,
            ReconcileStatus::Drifted => ApplyAction::Update,
            ReconcileStatus::Unchanged if options.force => ApplyAction::Update,
            ReconcileStatus::Unchanged => ApplyAction::Skip,
        }
    }

    /// Converge the remote resource with the declaration.
    pub fn apply(&self, options: &ApplyOptions) -> Result<ApplyOutcome> {
        let status = self.status();
        let action = self.plan(options);

        if status == ReconcileStatus::OrphanLocalState {
            tracing::warn!(
                path = ?self.configuration_path(),
                "State exists but the remote resource is gone, recreating"
            );
        }

        let diff = match action {
            ApplyAction::Update => {
                let diff = self.diff_with_remote_resource()?;
                if !diff.is_empty() {
                    tracing::debug!(
                        path = ?self.configuration_path(),
                        "Remote differs from declaration:\n{}",
                        diff.summary()
                    );
                }
                Some(diff.render())
            }
            _ => None,
        };

        let resource_id = if options.dry_run || action == ApplyAction::Skip {
            if options.dry_run {
                tracing::info!(path = ?self.configuration_path(), ?action, "[dry-run] Would apply");
            }
            self.resource_id().map(str::to_string)
        } else {
            let (_, state) = match action {
                ApplyAction::Create => self.create()?,
                _ => self.update()?,
            };
            Some(state.resource_id)
        };

        Ok(ApplyOutcome {
            resource_type: K::RESOURCE_TYPE,
            configuration_path: self.configuration_path().to_path_buf(),
            status,
            action,
            resource_id,
            diff,
            dry_run: options.dry_run,
        })
    }
}

/// Apply one declaration with the default engines.
pub fn apply_definition<C: ApiClient + ?Sized>(
    client: &C,
    definition: ResourceDefinition,
    options: &ApplyOptions,
) -> Result<ApplyOutcome> {
    fn run<K: ResourceKind, C: ApiClient + ?Sized>(
        client: &C,
        definition: ResourceDefinition,
        options: &ApplyOptions,
    ) -> Result<ApplyOutcome> {
        Reconciler::<K, C>::new(
            client,
            definition.workspace_id,
            definition.local,
            definition.configuration_path,
        )?
        .apply(options)
    }

    match definition.resource_type {
        ResourceType::Source => run::<Source, C>(client, definition, options),
        ResourceType::Destination => run::<Destination, C>(client, definition, options),
        ResourceType::Connection => run::<Connection, C>(client, definition, options),
    }
}

/// Apply every declaration of the project rooted at `root`.
///
/// Declarations are applied in discovery order. A failing declaration is
/// recorded in the report and does not stop the ones after it.
///
/// # Errors
///
/// Fails only if the project file cannot be loaded or the project cannot be
/// scanned.
pub fn apply_all<C: ApiClient + ?Sized>(
    client: &C,
    root: &Path,
    options: &ApplyOptions,
) -> Result<ApplyReport> {
    let project = ProjectConfig::load(root)?;
    let mut report = ApplyReport::default();

    for path in definition::discover(root)? {
        let result = ResourceDefinition::from_file(&path, &project.workspace_id)
            .and_then(|definition| apply_definition(client, definition, options));

        match result {
            Ok(outcome) => {
                tracing::info!(path = ?outcome.configuration_path, action = ?outcome.action, "Applied");
                report.outcomes.push(outcome);
            }
            Err(e) => {
                tracing::warn!(?path, "Apply failed: {}", e);
                report.errors.push(format!("{}: {}", path.display(), e));
            }
        }
    }

    Ok(report)
}
