//! In-memory [`ApiClient`] for tests.

use converge_core::{ApiClient, ApiError};
use serde_json::{Map, Value};
use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap, VecDeque};

#[derive(Default)]
struct Inner {
    records: BTreeMap<String, Vec<Value>>,
    next_id: usize,
    calls: Vec<(String, Value)>,
    failures: HashMap<String, VecDeque<ApiError>>,
}

/// Fake remote API holding records per collection.
///
/// Understands `<collection>/search`, `<collection>/create` and
/// `<collection>/update`:
///
/// - search returns every record whose fields equal all payload fields
/// - create stores the payload under a fresh `<kind>Id` such as `sourceId`
/// - update merges the payload into the record with the same id, or fails
///   with 404
#[derive(Default)]
pub struct FakeApi {
    inner: RefCell<Inner>,
}

impl FakeApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a record, as if created out of band.
    pub fn with_record(self, collection: &str, record: Value) -> Self {
        self.insert(collection, record);
        self
    }

    pub fn insert(&self, collection: &str, record: Value) {
        self.inner
            .borrow_mut()
            .records
            .entry(collection.to_string())
            .or_default()
            .push(record);
    }

    /// Drop every record of a collection, as if deleted out of band.
    pub fn clear(&self, collection: &str) {
        self.inner.borrow_mut().records.remove(collection);
    }

    /// Make the next call to `operation` fail with `error`.
    pub fn fail_next(&self, operation: &str, error: ApiError) {
        self.inner
            .borrow_mut()
            .failures
            .entry(operation.to_string())
            .or_default()
            .push_back(error);
    }

    pub fn records(&self, collection: &str) -> Vec<Value> {
        self.inner
            .borrow()
            .records
            .get(collection)
            .cloned()
            .unwrap_or_default()
    }

    /// Every call made so far, as `(operation, payload)`.
    pub fn calls(&self) -> Vec<(String, Value)> {
        self.inner.borrow().calls.clone()
    }

    pub fn call_count(&self, operation: &str) -> usize {
        self.inner
            .borrow()
            .calls
            .iter()
            .filter(|(op, _)| op == operation)
            .count()
    }

    /// Operations called so far, in order.
    pub fn operations(&self) -> Vec<String> {
        self.inner
            .borrow()
            .calls
            .iter()
            .map(|(op, _)| op.clone())
            .collect()
    }
}

fn id_field(collection: &str) -> String {
    format!("{}Id", singular(collection))
}

fn singular(collection: &str) -> &str {
    collection.strip_suffix('s').unwrap_or(collection)
}

fn matches(record: &Value, filter: &Value) -> bool {
    match filter {
        Value::Object(fields) => fields.iter().all(|(k, v)| record.get(k) == Some(v)),
        _ => true,
    }
}

impl ApiClient for FakeApi {
    fn post(&self, operation: &str, payload: &Value) -> Result<Value, ApiError> {
        let mut inner = self.inner.borrow_mut();
        inner
            .calls
            .push((operation.to_string(), payload.clone()));

        if let Some(error) = inner
            .failures
            .get_mut(operation)
            .and_then(VecDeque::pop_front)
        {
            return Err(error);
        }

        let Some((collection, verb)) = operation.split_once('/') else {
            return Err(ApiError::from_status(operation, 404, "unknown operation"));
        };

        match verb {
            "search" => {
                let found: Vec<Value> = inner
                    .records
                    .get(collection)
                    .map(|records| {
                        records
                            .iter()
                            .filter(|r| matches(r, payload))
                            .cloned()
                            .collect()
                    })
                    .unwrap_or_default();
                let mut response = Map::new();
                response.insert(collection.to_string(), Value::Array(found));
                Ok(Value::Object(response))
            }
            "create" => {
                inner.next_id += 1;
                let id = format!("{}-{}", singular(collection), inner.next_id);
                let mut record = payload.clone();
                if let Value::Object(fields) = &mut record {
                    fields.insert(id_field(collection), Value::String(id));
                }
                inner
                    .records
                    .entry(collection.to_string())
                    .or_default()
                    .push(record.clone());
                Ok(record)
            }
            "update" => {
                let field = id_field(collection);
                let target = payload.get(&field).cloned();
                let record = inner
                    .records
                    .get_mut(collection)
                    .and_then(|records| {
                        records
                            .iter_mut()
                            .find(|r| target.is_some() && r.get(&field) == target.as_ref())
                    })
                    .ok_or_else(|| {
                        ApiError::from_status(operation, 404, format!("no {field} {target:?}"))
                    })?;
                if let (Value::Object(fields), Value::Object(changes)) = (&mut *record, payload) {
                    for (key, value) in changes {
                        fields.insert(key.clone(), value.clone());
                    }
                }
                Ok(record.clone())
            }
            _ => Err(ApiError::from_status(operation, 404, "unknown operation")),
        }
    }
}
