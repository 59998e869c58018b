use super::{ResourceKind, ResourceType, required_str};
use crate::Result;
use serde_json::{Map, Value, json};

/// A connector that data is written to.
#[derive(Debug, Clone, Copy, Default)]
pub struct Destination;

impl ResourceKind for Destination {
    const RESOURCE_TYPE: ResourceType = ResourceType::Destination;
    const ID_FIELD: &'static str = "destinationId";
    const SEARCH_OPERATION: &'static str = "destinations/search";
    const CREATE_OPERATION: &'static str = "destinations/create";
    const UPDATE_OPERATION: &'static str = "destinations/update";

    fn search_payload(workspace_id: &str, local: &Map<String, Value>) -> Result<Value> {
        Ok(json!({
            "workspaceId": workspace_id,
            "destinationDefinitionId": required_str(local, "definition_id", Self::RESOURCE_TYPE)?,
            "name": required_str(local, "resource_name", Self::RESOURCE_TYPE)?,
        }))
    }

    fn create_payload(workspace_id: &str, local: &Map<String, Value>) -> Result<Value> {
        Ok(json!({
            "workspaceId": workspace_id,
            "destinationDefinitionId": required_str(local, "definition_id", Self::RESOURCE_TYPE)?,
            "name": required_str(local, "resource_name", Self::RESOURCE_TYPE)?,
            "connectionConfiguration": Self::local_configuration(local),
        }))
    }

    fn update_payload(resource_id: &str, local: &Map<String, Value>) -> Result<Value> {
        Ok(json!({
            "destinationId": resource_id,
            "name": required_str(local, "resource_name", Self::RESOURCE_TYPE)?,
            "connectionConfiguration": Self::local_configuration(local),
        }))
    }
}
