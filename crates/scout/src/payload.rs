//! Mutable request payloads.
//!
//! A [`Payload`] is the JSON document sent to the cluster for one request:
//! `{index, type, body: {...}}`. Nested keys are addressed with dotted paths
//! (`body.query.bool`). The keys that identify the target (`index`, and `type`
//! for record payloads) are fixed at construction and every later write to
//! them is ignored.

use serde_json::{Map, Value};

use crate::config::ScoutConfig;
use crate::error::ScoutResult;
use crate::model::Searchable;

const INDEX_KEYS: &[&str] = &["index"];
const TYPE_KEYS: &[&str] = &["index", "type"];

/// One request to the search cluster.
#[derive(Debug, Clone, PartialEq)]
pub struct Payload {
    payload: Map<String, Value>,
    protected_keys: &'static [&'static str],
}

impl Payload {
    /// Creates a payload addressed to an index.
    pub fn for_index(index: impl Into<String>) -> Self {
        let mut payload = Map::new();
        payload.insert("index".to_string(), Value::String(index.into()));

        Self {
            payload,
            protected_keys: INDEX_KEYS,
        }
    }

    /// Creates a payload addressed to a record type's index and type.
    ///
    /// # Errors
    ///
    /// * `ConfigurationError::MissingIndex` - If the record type has no index
    pub fn for_model<M: Searchable>(model: &M, config: &ScoutConfig) -> ScoutResult<Self> {
        let index = model.require_index()?;
        let mut payload = Self::for_index(index.full_name(&config.prefix));

        payload.payload.insert(
            "type".to_string(),
            Value::String(model.searchable_type_name()),
        );
        payload.protected_keys = TYPE_KEYS;

        Ok(payload)
    }

    /// Sets a value at a dotted path, creating intermediate objects.
    pub fn set(&mut self, key: &str, value: impl Into<Value>) -> &mut Self {
        if self.is_protected(key) {
            tracing::trace!(key, "ignoring write to protected payload key");
            return self;
        }

        let segments: Vec<&str> = key.split('.').collect();
        insert_path(&mut self.payload, &segments, value.into());

        self
    }

    /// Sets a value unless it is empty (`null`, `false`, `0`, `""`, `"0"`, `[]`, `{}`).
    pub fn set_if_not_empty(&mut self, key: &str, value: impl Into<Value>) -> &mut Self {
        let value = value.into();
        if is_empty(&value) {
            return self;
        }
        self.set(key, value)
    }

    /// Sets a value unless it is `null`.
    pub fn set_if_not_null(&mut self, key: &str, value: impl Into<Value>) -> &mut Self {
        let value = value.into();
        if value.is_null() {
            return self;
        }
        self.set(key, value)
    }

    /// Sets a value, leaving an existing one in place unless `overwrite` is true.
    pub fn add(&mut self, key: &str, value: impl Into<Value>, overwrite: bool) -> &mut Self {
        if !overwrite && self.has(key) {
            return self;
        }
        self.set(key, value)
    }

    /// Returns the value at a dotted path.
    pub fn get(&self, key: &str) -> Option<&Value> {
        let mut segments = key.split('.');
        let first = segments.next()?;
        let mut node = self.payload.get(first)?;

        for segment in segments {
            node = node.as_object()?.get(segment)?;
        }

        Some(node)
    }

    /// Returns true if a value exists at a dotted path.
    pub fn has(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Returns the payload as a JSON value.
    pub fn to_value(&self) -> Value {
        Value::Object(self.payload.clone())
    }

    /// Consumes the payload, returning the JSON value.
    pub fn into_value(self) -> Value {
        Value::Object(self.payload)
    }

    fn is_protected(&self, key: &str) -> bool {
        let root = key.split('.').next().unwrap_or(key);
        self.protected_keys.contains(&root)
    }
}

fn insert_path(node: &mut Map<String, Value>, segments: &[&str], value: Value) {
    match segments {
        [] => {}
        [leaf] => {
            node.insert(leaf.to_string(), value);
        }
        [head, rest @ ..] => {
            let child = node
                .entry(head.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            if !child.is_object() {
                *child = Value::Object(Map::new());
            }
            if let Value::Object(map) = child {
                insert_path(map, rest, value);
            }
        }
    }
}

/// Emptiness as understood by [`Payload::set_if_not_empty`].
pub(crate) fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty() || s == "0",
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
    }
}
