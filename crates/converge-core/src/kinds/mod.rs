//! Resource kinds
//!
//! Each kind knows the remote operations that manage it, the field that
//! carries its server-assigned id, and how to project a local declaration
//! into search, create and update payloads.

mod connection;
mod destination;
mod source;

pub use connection::Connection;
pub use destination::Destination;
pub use source::Source;

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

/// The kind of a declared resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceType {
    Source,
    Destination,
    Connection,
}

impl ResourceType {
    pub const ALL: [ResourceType; 3] = [Self::Source, Self::Destination, Self::Connection];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Source => "source",
            Self::Destination => "destination",
            Self::Connection => "connection",
        }
    }

    /// Plural name, used both as the project directory and as the key that
    /// lists matches in a search response.
    pub fn collection(&self) -> &'static str {
        match self {
            Self::Source => "sources",
            Self::Destination => "destinations",
            Self::Connection => "connections",
        }
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResourceType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "source" => Ok(Self::Source),
            "destination" => Ok(Self::Destination),
            "connection" => Ok(Self::Connection),
            other => Err(format!("unknown resource type: {other}")),
        }
    }
}

/// Kind-specific knowledge the reconciler is generic over.
///
/// `local` is always the full declaration mapping (top-level keys such as
/// `resource_name` and `configuration`).
pub trait ResourceKind {
    const RESOURCE_TYPE: ResourceType;
    /// Field of a remote record holding the server-assigned id
    const ID_FIELD: &'static str;
    const SEARCH_OPERATION: &'static str;
    const CREATE_OPERATION: &'static str;
    const UPDATE_OPERATION: &'static str;

    /// Minimal stable subset of fields that locates the resource remotely.
    fn search_payload(workspace_id: &str, local: &Map<String, Value>) -> Result<Value>;

    fn create_payload(workspace_id: &str, local: &Map<String, Value>) -> Result<Value>;

    fn update_payload(resource_id: &str, local: &Map<String, Value>) -> Result<Value>;

    /// The remote record's view of the configuration the user declares.
    ///
    /// `declared` is [`ResourceKind::local_configuration`], for kinds whose
    /// record mixes declared settings with other fields.
    fn remote_configuration(record: &Value, _declared: &Value) -> Value {
        record
            .get("connectionConfiguration")
            .cloned()
            .unwrap_or_else(|| Value::Object(Map::new()))
    }

    /// The declared configuration payload.
    fn local_configuration(local: &Map<String, Value>) -> Value {
        local
            .get("configuration")
            .cloned()
            .unwrap_or_else(|| Value::Object(Map::new()))
    }
}

/// Fetch a required string field from a declaration.
pub(crate) fn required_str<'a>(
    local: &'a Map<String, Value>,
    field: &str,
    resource_type: ResourceType,
) -> Result<&'a str> {
    local
        .get(field)
        .and_then(Value::as_str)
        .ok_or_else(|| Error::MissingIdentifyingField {
            resource_type,
            field: field.to_string(),
        })
}
