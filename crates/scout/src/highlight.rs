//! Highlighted fragments attached to a search hit.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Highlighted fragments of one hit, keyed by field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Highlight {
    fields: BTreeMap<String, Vec<String>>,
}

impl Highlight {
    /// Wraps a field-to-fragments map.
    pub fn new(fields: BTreeMap<String, Vec<String>>) -> Self {
        Self { fields }
    }

    /// Returns the fragments of a field.
    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.fields.get(field).map(Vec::as_slice)
    }

    /// Returns the fragments of a field joined by a single space.
    pub fn as_string(&self, field: &str) -> Option<String> {
        self.get(field).map(|fragments| fragments.join(" "))
    }

    /// Iterates the highlighted field names.
    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    /// Returns true if no field was highlighted.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, Vec<V>)> for Highlight {
    fn from_iter<I: IntoIterator<Item = (K, Vec<V>)>>(iter: I) -> Self {
        Self::new(
            iter.into_iter()
                .map(|(field, fragments)| {
                    (field.into(), fragments.into_iter().map(Into::into).collect())
                })
                .collect(),
        )
    }
}
