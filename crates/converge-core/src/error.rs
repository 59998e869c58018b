//! Error types for converge-core

use crate::api::ApiError;
use crate::kinds::ResourceType;
use std::path::PathBuf;

/// Result type for converge-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while reconciling resources
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The identifying search matched more than one remote resource
    #[error(
        "Found {count} remote {resource_type}s matching the declaration at {path}; \
         make the identifying fields unique"
    )]
    DuplicateResource {
        resource_type: ResourceType,
        count: usize,
        path: PathBuf,
    },

    /// An operation needs a bound remote resource but none exists
    #[error("The {resource_type} declared at {path} does not exist remotely")]
    NonExistingResource {
        resource_type: ResourceType,
        path: PathBuf,
    },

    /// The remote API rejected the declared configuration
    #[error("Invalid {resource_type} configuration: {detail}")]
    InvalidConfiguration {
        resource_type: ResourceType,
        detail: String,
    },

    /// Requested attribute is neither a reconciler field nor a declared key
    #[error("Attribute not found: {name}")]
    AttributeNotFound { name: String },

    /// Declaration lacks a field needed to locate the resource remotely
    #[error("{resource_type} declaration is missing identifying field `{field}`")]
    MissingIdentifyingField {
        resource_type: ResourceType,
        field: String,
    },

    /// Declaration file is structurally wrong
    #[error("Invalid resource definition at {path}: {message}")]
    InvalidDefinition { path: PathBuf, message: String },

    /// No project file found under the project root
    #[error("Project configuration not found in {root}")]
    ProjectConfigNotFound { root: PathBuf },

    /// The remote API answered with an unexpected shape
    #[error("Malformed response from {operation}: {message}")]
    MalformedResponse { operation: String, message: String },

    /// Remote API failure, propagated unchanged
    #[error(transparent)]
    Api(#[from] ApiError),

    /// Filesystem error from converge-fs
    #[error(transparent)]
    Fs(#[from] converge_fs::Error),
}
