//! Locating the remote counterpart of a declaration

use crate::api::{ApiClient, ResourceApi};
use crate::kinds::ResourceKind;
use crate::{Error, Result};
use serde_json::Value;
use std::path::Path;

/// A remote record together with its server-assigned id.
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteResource {
    pub resource_id: String,
    pub record: Value,
}

impl RemoteResource {
    /// Wrap a record returned by `operation`, extracting the kind's id field.
    pub fn from_record<K: ResourceKind>(operation: &str, record: Value) -> Result<Self> {
        let resource_id = record
            .get(K::ID_FIELD)
            .and_then(Value::as_str)
            .ok_or_else(|| Error::MalformedResponse {
                operation: operation.to_string(),
                message: format!("record has no string `{}` field", K::ID_FIELD),
            })?
            .to_string();

        Ok(Self {
            resource_id,
            record,
        })
    }

    /// The part of the record comparable with the declared configuration.
    pub fn configuration<K: ResourceKind>(&self, declared: &Value) -> Value {
        K::remote_configuration(&self.record, declared)
    }
}

/// Every remote resource matching an identifying payload.
pub fn search<K, C>(api: &ResourceApi<'_, K, C>, identifying_payload: &Value) -> Result<Vec<RemoteResource>>
where
    K: ResourceKind,
    C: ApiClient + ?Sized,
{
    api.search(identifying_payload)?
        .into_iter()
        .map(|record| RemoteResource::from_record::<K>(K::SEARCH_OPERATION, record))
        .collect()
}

/// The single remote resource matching an identifying payload.
///
/// Zero matches is `Ok(None)`. More than one match is an error: the
/// declaration is ambiguous and no match is picked.
pub fn locate<K, C>(
    api: &ResourceApi<'_, K, C>,
    identifying_payload: &Value,
    configuration_path: &Path,
) -> Result<Option<RemoteResource>>
where
    K: ResourceKind,
    C: ApiClient + ?Sized,
{
    let mut matches = search(api, identifying_payload)?;
    match matches.len() {
        0 => Ok(None),
        1 => Ok(matches.pop()),
        count => Err(Error::DuplicateResource {
            resource_type: K::RESOURCE_TYPE,
            count,
            path: configuration_path.to_path_buf(),
        }),
    }
}
