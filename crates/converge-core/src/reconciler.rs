//! Per-resource reconciliation
//!
//! A [`Reconciler`] is built for one declaration. Construction gathers the
//! three views of the resource:
//!
//! - **local**: the declaration mapping and its checksum
//! - **applied**: the sidecar [`ResourceState`], if any
//! - **remote**: the single remote match of the identifying search, if any
//!
//! From these it exposes `create()`, `update()` and a rendered diff. Nothing
//! is cached across reconcilers; every construction searches the remote API.

use crate::api::{ApiClient, ApiError, ResourceApi};
use crate::engines::{ChecksumEngine, DiffEngine, Sha256Checksum, StructuralDiff};
use crate::kinds::{ResourceKind, ResourceType};
use crate::locator::{self, RemoteResource};
use crate::state::{ResourceState, StateStore};
use crate::{Error, Result};
use converge_diff::ConfigDiff;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};

/// Implicit state of a declaration, derived from its three views.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileStatus {
    /// Never applied and nothing remote
    New,
    /// Remote exists and the declaration matches the last apply
    Unchanged,
    /// Remote exists but the declaration changed, or was never recorded
    Drifted,
    /// State recorded but the remote resource is gone
    OrphanLocalState,
}

/// Reconciles one declaration of kind `K` against the remote API.
pub struct Reconciler<'a, K: ResourceKind, C: ApiClient + ?Sized> {
    api: ResourceApi<'a, K, C>,
    workspace_id: String,
    local: Map<String, Value>,
    configuration_path: PathBuf,
    state_store: StateStore,
    diff_engine: Box<dyn DiffEngine>,
    state: Option<ResourceState>,
    remote: Option<RemoteResource>,
    local_checksum: String,
    local_file_changed: bool,
}

impl<'a, K: ResourceKind, C: ApiClient + ?Sized> Reconciler<'a, K, C> {
    /// Create a reconciler using the default checksum and diff engines.
    ///
    /// # Errors
    ///
    /// Fails if the declaration lacks identifying fields, the state file is
    /// malformed, the search fails, or the search matches more than one
    /// remote resource.
    pub fn new(
        client: &'a C,
        workspace_id: impl Into<String>,
        local: Map<String, Value>,
        configuration_path: impl Into<PathBuf>,
    ) -> Result<Self> {
        Self::with_engines(
            client,
            workspace_id,
            local,
            configuration_path,
            Box::new(Sha256Checksum),
            Box::new(StructuralDiff),
        )
    }

    /// Create a reconciler with explicit checksum and diff engines.
    pub fn with_engines(
        client: &'a C,
        workspace_id: impl Into<String>,
        local: Map<String, Value>,
        configuration_path: impl Into<PathBuf>,
        checksum_engine: Box<dyn ChecksumEngine>,
        diff_engine: Box<dyn DiffEngine>,
    ) -> Result<Self> {
        let workspace_id = workspace_id.into();
        let configuration_path = configuration_path.into();
        let api = ResourceApi::<K, C>::new(client);
        let state_store = StateStore::new();

        let state = state_store.load(&configuration_path)?;

        let identifying_payload = K::search_payload(&workspace_id, &local)?;
        let remote = locator::locate(&api, &identifying_payload, &configuration_path)?;

        let local_checksum = checksum_engine.compute(&Value::Object(local.clone()));
        let local_file_changed = state
            .as_ref()
            .is_none_or(|s| s.configuration_checksum != local_checksum);

        tracing::debug!(
            resource_type = %K::RESOURCE_TYPE,
            path = ?configuration_path,
            remote_id = remote.as_ref().map(|r| r.resource_id.as_str()),
            local_file_changed,
            "Reconciler ready"
        );

        Ok(Self {
            api,
            workspace_id,
            local,
            configuration_path,
            state_store,
            diff_engine,
            state,
            remote,
            local_checksum,
            local_file_changed,
        })
    }

    pub fn resource_type(&self) -> ResourceType {
        K::RESOURCE_TYPE
    }

    pub fn workspace_id(&self) -> &str {
        &self.workspace_id
    }

    pub fn configuration_path(&self) -> &Path {
        &self.configuration_path
    }

    /// The full declaration mapping.
    pub fn local_configuration(&self) -> &Map<String, Value> {
        &self.local
    }

    /// The api instance bound to this kind's operations.
    pub fn api_instance(&self) -> &ResourceApi<'a, K, C> {
        &self.api
    }

    /// State recorded by the last apply.
    pub fn state(&self) -> Option<&ResourceState> {
        self.state.as_ref()
    }

    pub fn remote_resource(&self) -> Option<&RemoteResource> {
        self.remote.as_ref()
    }

    /// Whether the resource exists remotely.
    pub fn was_created(&self) -> bool {
        self.remote.is_some()
    }

    /// Id of the bound remote resource.
    pub fn resource_id(&self) -> Option<&str> {
        self.remote.as_ref().map(|r| r.resource_id.as_str())
    }

    /// Whether the declaration differs from what was last applied.
    ///
    /// Always true when nothing was ever applied.
    pub fn local_file_changed(&self) -> bool {
        self.local_file_changed
    }

    /// Checksum of the declaration as it is now.
    pub fn local_checksum(&self) -> &str {
        &self.local_checksum
    }

    pub fn status(&self) -> ReconcileStatus {
        match (&self.remote, &self.state) {
            (None, None) => ReconcileStatus::New,
            (None, Some(_)) => ReconcileStatus::OrphanLocalState,
            (Some(_), _) if self.local_file_changed => ReconcileStatus::Drifted,
            (Some(_), _) => ReconcileStatus::Unchanged,
        }
    }

    /// Read a field by name.
    ///
    /// Reconciler fields (`workspace_id`, `configuration_path`,
    /// `resource_type`, `resource_id`) take precedence over top-level keys of
    /// the declaration. `resource_id` is `null` while nothing is bound.
    pub fn attribute(&self, name: &str) -> Result<Value> {
        match name {
            "workspace_id" => Ok(Value::from(self.workspace_id.as_str())),
            "configuration_path" => Ok(Value::String(
                self.configuration_path.to_string_lossy().into_owned(),
            )),
            "resource_type" => Ok(Value::from(K::RESOURCE_TYPE.as_str())),
            "resource_id" => Ok(self.resource_id().map_or(Value::Null, Value::from)),
            _ => self
                .local
                .get(name)
                .cloned()
                .ok_or_else(|| Error::AttributeNotFound {
                    name: name.to_string(),
                }),
        }
    }

    /// Payload sent by [`Reconciler::create`].
    pub fn create_payload(&self) -> Result<Value> {
        K::create_payload(&self.workspace_id, &self.local)
    }

    /// Payload sent by [`Reconciler::update`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::NonExistingResource`] if nothing is bound remotely.
    pub fn update_payload(&self) -> Result<Value> {
        let resource_id = self.resource_id().ok_or_else(|| self.non_existing())?;
        K::update_payload(resource_id, &self.local)
    }

    /// Create the remote resource and record the new state.
    pub fn create(&self) -> Result<(Value, ResourceState)> {
        let payload = self.create_payload()?;
        tracing::info!(
            resource_type = %K::RESOURCE_TYPE,
            path = ?self.configuration_path,
            "Creating remote resource"
        );
        self.create_or_update(ResourceApi::create, &payload)
    }

    /// Update the bound remote resource and record the new state.
    pub fn update(&self) -> Result<(Value, ResourceState)> {
        let payload = self.update_payload()?;
        tracing::info!(
            resource_type = %K::RESOURCE_TYPE,
            resource_id = self.resource_id(),
            "Updating remote resource"
        );
        self.create_or_update(ResourceApi::update, &payload)
    }

    /// Run a remote write and persist state on success.
    ///
    /// A 422 rejection becomes [`Error::InvalidConfiguration`] with the
    /// remote detail; every other API error, "not found" included, is
    /// returned unchanged as [`Error::Api`].
    pub fn create_or_update<F>(&self, operation: F, payload: &Value) -> Result<(Value, ResourceState)>
    where
        F: FnOnce(&ResourceApi<'a, K, C>, &Value) -> std::result::Result<Value, ApiError>,
    {
        let record = operation(&self.api, payload).map_err(|err| match err {
            ApiError::Unprocessable { detail, .. } => Error::InvalidConfiguration {
                resource_type: K::RESOURCE_TYPE,
                detail,
            },
            other => Error::Api(other),
        })?;

        let resource_id = record
            .get(K::ID_FIELD)
            .and_then(Value::as_str)
            .ok_or_else(|| Error::MalformedResponse {
                operation: format!("{} write", K::RESOURCE_TYPE),
                message: format!("response has no string `{}` field", K::ID_FIELD),
            })?;

        let state = self
            .state_store
            .save(&self.configuration_path, resource_id, &self.local_checksum)?;
        Ok((record, state))
    }

    /// Difference between the remote configuration and the declared one.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NonExistingResource`] if nothing is bound remotely.
    pub fn diff_with_remote_resource(&self) -> Result<ConfigDiff> {
        let remote = self.remote.as_ref().ok_or_else(|| self.non_existing())?;
        let declared = K::local_configuration(&self.local);
        Ok(self
            .diff_engine
            .diff(&remote.configuration::<K>(&declared), &declared))
    }

    /// Rendered form of [`Reconciler::diff_with_remote_resource`].
    pub fn get_diff_with_remote_resource(&self) -> Result<String> {
        Ok(self.diff_with_remote_resource()?.render())
    }

    fn non_existing(&self) -> Error {
        Error::NonExistingResource {
            resource_type: K::RESOURCE_TYPE,
            path: self.configuration_path.clone(),
        }
    }
}
