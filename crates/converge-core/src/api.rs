//! Remote API capability
//!
//! The remote service is RPC-style: every operation is a named endpoint
//! (`sources/search`, `sources/create`, ...) taking and returning JSON.
//! Transport, retries and timeouts belong to the [`ApiClient`] implementor.

use crate::kinds::ResourceKind;
use serde_json::Value;
use std::marker::PhantomData;

/// Failure reported by an [`ApiClient`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
    /// 404: the targeted remote entity does not exist
    #[error("{operation} returned 404 Not Found: {detail}")]
    NotFound { operation: String, detail: String },

    /// 422: the payload failed remote validation
    #[error("{operation} returned 422 Unprocessable Entity: {detail}")]
    Unprocessable { operation: String, detail: String },

    /// Any other non-success status
    #[error("{operation} failed with status {status}: {detail}")]
    Status {
        operation: String,
        status: u16,
        detail: String,
    },

    /// The request never produced a response
    #[error("{operation} could not reach the API: {message}")]
    Transport { operation: String, message: String },
}

impl ApiError {
    /// Classify a non-success HTTP status.
    pub fn from_status(operation: impl Into<String>, status: u16, detail: impl Into<String>) -> Self {
        let operation = operation.into();
        let detail = detail.into();
        match status {
            404 => Self::NotFound { operation, detail },
            422 => Self::Unprocessable { operation, detail },
            _ => Self::Status {
                operation,
                status,
                detail,
            },
        }
    }

    /// HTTP status code, if a response was received.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::NotFound { .. } => Some(404),
            Self::Unprocessable { .. } => Some(422),
            Self::Status { status, .. } => Some(*status),
            Self::Transport { .. } => None,
        }
    }
}

/// Client for the remote configuration API.
pub trait ApiClient {
    /// Invoke `operation` with a JSON body and return the JSON response.
    fn post(&self, operation: &str, payload: &Value) -> Result<Value, ApiError>;
}

impl<T: ApiClient + ?Sized> ApiClient for &T {
    fn post(&self, operation: &str, payload: &Value) -> Result<Value, ApiError> {
        (**self).post(operation, payload)
    }
}

/// An [`ApiClient`] bound to the operations of one resource kind.
pub struct ResourceApi<'a, K, C: ?Sized> {
    client: &'a C,
    _kind: PhantomData<K>,
}

impl<'a, K: ResourceKind, C: ApiClient + ?Sized> ResourceApi<'a, K, C> {
    pub fn new(client: &'a C) -> Self {
        Self {
            client,
            _kind: PhantomData,
        }
    }

    /// Run the kind's search and return the listed matches.
    ///
    /// A response without the kind's collection key lists no matches.
    pub fn search(&self, payload: &Value) -> Result<Vec<Value>, ApiError> {
        let response = self.client.post(K::SEARCH_OPERATION, payload)?;
        let matches = match response.get(K::RESOURCE_TYPE.collection()) {
            Some(Value::Array(items)) => items.clone(),
            _ => Vec::new(),
        };
        Ok(matches)
    }

    pub fn create(&self, payload: &Value) -> Result<Value, ApiError> {
        self.client.post(K::CREATE_OPERATION, payload)
    }

    pub fn update(&self, payload: &Value) -> Result<Value, ApiError> {
        self.client.post(K::UPDATE_OPERATION, payload)
    }
}
