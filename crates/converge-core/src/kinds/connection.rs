use super::{ResourceKind, ResourceType, required_str};
use crate::Result;
use serde_json::{Map, Value, json};

/// Remote record fields that make up a connection's declared settings.
const SETTINGS_FIELDS: &[&str] = &[
    "status",
    "schedule",
    "syncCatalog",
    "namespaceDefinition",
    "namespaceFormat",
    "prefix",
    "operationIds",
];

/// Record fields owned by the binding, never taken from `configuration`.
const BINDING_FIELDS: &[&str] = &["connectionId", "sourceId", "destinationId", "name"];

/// A sync between one source and one destination.
///
/// The declared `configuration` is sent merged with the ids that bind the
/// connection. Binding fields inside `configuration` are ignored.
#[derive(Debug, Clone, Copy, Default)]
pub struct Connection;

impl Connection {
    fn merged(mut base: Map<String, Value>, local: &Map<String, Value>) -> Value {
        if let Value::Object(settings) = Self::local_configuration(local) {
            for (key, value) in settings {
                base.entry(key).or_insert(value);
            }
        }
        Value::Object(base)
    }

    fn binding(local: &Map<String, Value>) -> Result<Map<String, Value>> {
        let mut base = Map::new();
        base.insert(
            "sourceId".into(),
            required_str(local, "source_id", Self::RESOURCE_TYPE)?.into(),
        );
        base.insert(
            "destinationId".into(),
            required_str(local, "destination_id", Self::RESOURCE_TYPE)?.into(),
        );
        base.insert(
            "name".into(),
            required_str(local, "resource_name", Self::RESOURCE_TYPE)?.into(),
        );
        Ok(base)
    }
}

impl ResourceKind for Connection {
    const RESOURCE_TYPE: ResourceType = ResourceType::Connection;
    const ID_FIELD: &'static str = "connectionId";
    const SEARCH_OPERATION: &'static str = "connections/search";
    const CREATE_OPERATION: &'static str = "connections/create";
    const UPDATE_OPERATION: &'static str = "connections/update";

    // Sources and destinations are workspace-scoped already
    fn search_payload(_workspace_id: &str, local: &Map<String, Value>) -> Result<Value> {
        Ok(Value::Object(Self::binding(local)?))
    }

    fn create_payload(_workspace_id: &str, local: &Map<String, Value>) -> Result<Value> {
        Ok(Self::merged(Self::binding(local)?, local))
    }

    fn update_payload(resource_id: &str, local: &Map<String, Value>) -> Result<Value> {
        let mut base = Map::new();
        base.insert(Self::ID_FIELD.into(), json!(resource_id));
        Ok(Self::merged(base, local))
    }

    fn remote_configuration(record: &Value, declared: &Value) -> Value {
        let mut fields: Vec<&str> = SETTINGS_FIELDS.to_vec();
        if let Some(declared) = declared.as_object() {
            fields.extend(declared.keys().map(String::as_str));
        }
        let settings = fields
            .into_iter()
            .filter_map(|field| record.get(field).map(|value| (field.to_string(), value.clone())))
            .collect();
        Value::Object(settings)
    }

    fn local_configuration(local: &Map<String, Value>) -> Value {
        let settings = match local.get("configuration") {
            Some(Value::Object(settings)) => settings
                .iter()
                .filter(|(key, _)| !BINDING_FIELDS.contains(&key.as_str()))
                .map(|(key, value)| (key.clone(), value.clone()))
                .collect(),
            _ => Map::new(),
        };
        Value::Object(settings)
    }
}
