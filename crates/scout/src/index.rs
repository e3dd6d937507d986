//! Index descriptors.
//!
//! Index creation, mapping updates and migrations are handled elsewhere; the
//! query layer only needs the name a record type is stored under.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Describes the index a searchable record type lives in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Index {
    /// Unprefixed index name.
    pub name: String,

    /// Index settings, passed through to index management.
    #[serde(default)]
    pub settings: Map<String, Value>,

    /// Field mapping, passed through to index management.
    #[serde(default)]
    pub mapping: Map<String, Value>,
}

impl Index {
    /// Creates an index descriptor with empty settings and mapping.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            settings: Map::new(),
            mapping: Map::new(),
        }
    }

    /// Returns the index name with the configured prefix applied.
    pub fn full_name(&self, prefix: &str) -> String {
        format!("{}{}", prefix, self.name)
    }
}
