//! Resource reconciliation engine for converge
//!
//! Applies locally declared resources (sources, destinations, connections)
//! to a remote configuration API:
//!
//! - **StateStore**: sidecar `state.yaml` with the last applied checksum
//! - **locator**: identifying search, at most one remote match
//! - **engines**: pluggable checksum and diff strategies
//! - **Reconciler**: create, update and diff for one declaration
//! - **apply**: plan/apply over a single declaration or a whole project
//!
//! # Architecture
//!
//! ```text
//!            apply (project driver)
//!                    |
//!               Reconciler<K>
//!                    |
//!    +--------+------+------+---------+
//!    |        |             |         |
//! StateStore locator     engines    kinds
//!    |                      |
//! converge-fs          converge-diff
//! ```
//!
//! # Example
//!
//! ```ignore
//! use converge_core::{ApplyOptions, apply_all};
//!
//! let report = apply_all(&client, project_root, &ApplyOptions::default())?;
//! for outcome in &report.outcomes {
//!     println!("{:?} {}", outcome.action, outcome.configuration_path.display());
//! }
//! ```

pub mod api;
pub mod apply;
pub mod definition;
pub mod engines;
pub mod error;
pub mod kinds;
pub mod locator;
pub mod logging;
pub mod project;
pub mod reconciler;
pub mod state;

pub use api::{ApiClient, ApiError, ResourceApi};
pub use apply::{ApplyAction, ApplyOptions, ApplyOutcome, ApplyReport, apply_all, apply_definition};
pub use definition::{ResourceDefinition, discover};
pub use engines::{ChecksumEngine, DiffEngine, Sha256Checksum, StructuralDiff};
pub use error::{Error, Result};
pub use kinds::{Connection, Destination, ResourceKind, ResourceType, Source};
pub use locator::RemoteResource;
pub use project::ProjectConfig;
pub use reconciler::{ReconcileStatus, Reconciler};
pub use state::{ResourceState, STATE_FILE_NAME, StateStore};
