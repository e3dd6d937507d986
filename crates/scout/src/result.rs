//! Raw search responses and mapping them back to records.
//!
//! [`RawResult`] is the typed view of a cluster search response. It keeps the
//! payload that produced it, so [`ResultMapper::map`] can load exactly the
//! columns the search projected.

use std::collections::HashMap;
use std::ops::{Deref, DerefMut};

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::error::{ResponseError, ScoutResult};
use crate::highlight::Highlight;
use crate::model::{Columns, Searchable};

/// A cluster search response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawResult {
    /// The hits section.
    pub hits: Hits,

    /// The payload that produced this response, when it came from a compiled search.
    #[serde(skip)]
    pub payload: Option<Value>,

    /// Every other top-level key (`took`, `timed_out`, `profile`, ...).
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl RawResult {
    /// Parses a response document.
    ///
    /// # Errors
    ///
    /// * `ResponseError::Malformed` - If `hits` is missing or a hit has no usable `_id`
    pub fn from_value(value: Value) -> ScoutResult<Self> {
        if value.get("hits").is_none() {
            return Err(ResponseError::Malformed {
                message: "response has no hits section".to_string(),
            }
            .into());
        }
        Ok(serde_json::from_value(value)?)
    }

    /// Wraps a raw callback's answer without requiring a search response.
    ///
    /// An object without `hits` is kept whole in [`RawResult::extra`] and
    /// reports no hits.
    ///
    /// # Errors
    ///
    /// * `ResponseError::Malformed` - If the answer is not a JSON object or its
    ///   `hits` section cannot be parsed
    pub fn from_callback(value: Value) -> ScoutResult<Self> {
        match value {
            Value::Object(extra) if !extra.contains_key("hits") => Ok(Self {
                extra,
                ..Self::default()
            }),
            value => Self::from_value(value),
        }
    }

    /// Attaches the payload that produced this response.
    pub fn with_payload(mut self, payload: Value) -> Self {
        self.payload = Some(payload);
        self
    }

    /// Total number of matching documents.
    pub fn total(&self) -> u64 {
        match &self.hits.total {
            Some(total) => total.value(),
            None => self.hits.hits.len() as u64,
        }
    }
}

/// The `hits` section of a search response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Hits {
    /// Total hit counter.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total: Option<TotalHits>,

    /// Matched documents, in rank order.
    #[serde(default)]
    pub hits: Vec<Hit>,

    /// Highest score among the hits.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_score: Option<f64>,
}

/// Total hit counter, either tracked (`{"value", "relation"}`) or a bare number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TotalHits {
    /// Bare count.
    Count(u64),
    /// Tracked count with its accuracy relation (`eq` or `gte`).
    Tracked {
        /// The count.
        value: u64,
        /// Whether the count is exact.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        relation: Option<String>,
    },
}

impl TotalHits {
    /// The counted value.
    pub fn value(&self) -> u64 {
        match self {
            TotalHits::Count(value) | TotalHits::Tracked { value, .. } => *value,
        }
    }
}

/// One matched document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hit {
    /// Document id. Numeric ids are normalized to strings.
    #[serde(rename = "_id", deserialize_with = "deserialize_id")]
    pub id: String,

    /// Index the document was found in.
    #[serde(rename = "_index", default, skip_serializing_if = "Option::is_none")]
    pub index: Option<String>,

    /// Relevance score.
    #[serde(rename = "_score", default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,

    /// Stored source fields.
    #[serde(rename = "_source", default, skip_serializing_if = "Option::is_none")]
    pub source: Option<Value>,

    /// Highlighted fragments.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub highlight: Option<Highlight>,
}

fn deserialize_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::String(id) => Ok(id),
        Value::Number(id) => Ok(id.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected a string or number _id, found {other}"
        ))),
    }
}

/// A loaded record paired with its hit's highlight.
#[derive(Debug, Clone, PartialEq)]
pub struct MappedRecord<R> {
    /// The backing record.
    pub record: R,
    /// Highlighted fragments, when the hit carried any.
    pub highlight: Option<Highlight>,
}

impl<R> MappedRecord<R> {
    /// Returns the record, discarding the highlight.
    pub fn into_inner(self) -> R {
        self.record
    }
}

impl<R> Deref for MappedRecord<R> {
    type Target = R;

    fn deref(&self) -> &R {
        &self.record
    }
}

impl<R> DerefMut for MappedRecord<R> {
    fn deref_mut(&mut self) -> &mut R {
        &mut self.record
    }
}

/// Maps raw responses back to records.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResultMapper;

impl ResultMapper {
    /// Total number of matching documents.
    pub fn get_total_count(raw: &RawResult) -> u64 {
        raw.total()
    }

    /// Hit ids, in hit order.
    pub fn map_ids(raw: &RawResult) -> Vec<String> {
        raw.hits.hits.iter().map(|hit| hit.id.clone()).collect()
    }

    /// Loads the records behind a response, in hit order.
    ///
    /// Only the projected columns (plus the identifier) are requested when the
    /// search selected fields. Soft-deleted rows are included for record types
    /// that use soft deletion. Hits without a backing record are dropped; an id
    /// hit more than once maps at every position.
    ///
    /// # Errors
    ///
    /// Propagates record-store failures from [`Searchable::batch_fetch_by_ids`].
    pub async fn map<M: Searchable>(
        raw: &RawResult,
        model: &M,
    ) -> ScoutResult<Vec<MappedRecord<M::Record>>> {
        if raw.total() == 0 {
            return Ok(Vec::new());
        }

        let columns = Self::requested_columns(raw, model);
        let ids = Self::map_ids(raw);

        let records = model
            .batch_fetch_by_ids(&ids, &columns, model.uses_soft_delete())
            .await?;

        let mapped = Self::pair_hits(raw, &records);

        let dropped = raw.hits.hits.len() - mapped.len();
        if dropped > 0 {
            tracing::warn!(
                model = %model.model_name(),
                dropped,
                "search hits without a backing record were dropped"
            );
        }

        Ok(mapped)
    }

    fn requested_columns<M: Searchable>(raw: &RawResult, model: &M) -> Columns {
        let projected = raw
            .payload
            .as_ref()
            .and_then(|payload| payload.pointer("/body/_source"))
            .and_then(Value::as_array);

        match projected {
            Some(fields) => {
                let mut columns: Vec<String> = fields
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect();
                columns.push(model.identifier_field_name().to_string());
                Columns::Only(columns)
            }
            None => Columns::All,
        }
    }

    fn pair_hits<R: Clone>(
        raw: &RawResult,
        records: &HashMap<String, R>,
    ) -> Vec<MappedRecord<R>> {
        raw.hits
            .hits
            .iter()
            .filter_map(|hit| {
                records.get(&hit.id).cloned().map(|record| MappedRecord {
                    record,
                    highlight: hit.highlight.clone(),
                })
            })
            .collect()
    }
}
