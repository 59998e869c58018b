use super::{ResourceKind, ResourceType, required_str};
use crate::Result;
use serde_json::{Map, Value, json};

/// A connector that data is read from.
#[derive(Debug, Clone, Copy, Default)]
pub struct Source;

impl ResourceKind for Source {
    const RESOURCE_TYPE: ResourceType = ResourceType::Source;
    const ID_FIELD: &'static str = "sourceId";
    const SEARCH_OPERATION: &'static str = "sources/search";
    const CREATE_OPERATION: &'static str = "sources/create";
    const UPDATE_OPERATION: &'static str = "sources/update";

    fn search_payload(workspace_id: &str, local: &Map<String, Value>) -> Result<Value> {
        Ok(json!({
            "workspaceId": workspace_id,
            "sourceDefinitionId": required_str(local, "definition_id", Self::RESOURCE_TYPE)?,
            "name": required_str(local, "resource_name", Self::RESOURCE_TYPE)?,
        }))
    }

    fn create_payload(workspace_id: &str, local: &Map<String, Value>) -> Result<Value> {
        Ok(json!({
            "workspaceId": workspace_id,
            "sourceDefinitionId": required_str(local, "definition_id", Self::RESOURCE_TYPE)?,
            "name": required_str(local, "resource_name", Self::RESOURCE_TYPE)?,
            "connectionConfiguration": Self::local_configuration(local),
        }))
    }

    fn update_payload(resource_id: &str, local: &Map<String, Value>) -> Result<Value> {
        Ok(json!({
            "sourceId": resource_id,
            "name": required_str(local, "resource_name", Self::RESOURCE_TYPE)?,
            "connectionConfiguration": Self::local_configuration(local),
        }))
    }
}
