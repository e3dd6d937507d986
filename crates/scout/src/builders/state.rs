//! Accumulated builder state.
//!
//! [`BuilderState`] holds everything a search has declared so far: boolean
//! clauses routed into buckets, result shaping (sort, pagination, projection,
//! collapse) and verbatim body/query additions. It is created per search,
//! mutated through the builder chain and read once by the payload compiler.

use std::fmt;
use std::str::FromStr;

use serde_json::{Map, Value, json};

use crate::error::QueryError;

/// Field that marks soft-deleted documents in the index.
pub const SOFT_DELETED_FIELD: &str = "__soft_deleted";

/// Default flags for regexp clauses.
pub const DEFAULT_REGEXP_FLAGS: &str = "ALL";

/// The four boolean occurrence buckets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Bucket {
    /// Clauses that must match.
    Must,
    /// Clauses that must not match.
    MustNot,
    /// Clauses that should match.
    Should,
    /// Non-scoring clauses that must match.
    Filter,
}

impl Bucket {
    /// All buckets, in wire order.
    pub const ALL: [Bucket; 4] = [Bucket::Must, Bucket::MustNot, Bucket::Should, Bucket::Filter];

    /// Returns the bool-query key for this bucket.
    pub fn as_str(&self) -> &'static str {
        match self {
            Bucket::Must => "must",
            Bucket::MustNot => "must_not",
            Bucket::Should => "should",
            Bucket::Filter => "filter",
        }
    }
}

impl fmt::Display for Bucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ordered clause lists for each bucket.
///
/// All four buckets always exist; clause order is insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Buckets {
    /// Clauses that must match.
    pub must: Vec<Value>,
    /// Clauses that must not match.
    pub must_not: Vec<Value>,
    /// Clauses that should match.
    pub should: Vec<Value>,
    /// Non-scoring clauses that must match.
    pub filter: Vec<Value>,
}

impl Buckets {
    /// Returns the clauses of a bucket.
    pub fn get(&self, bucket: Bucket) -> &[Value] {
        match bucket {
            Bucket::Must => &self.must,
            Bucket::MustNot => &self.must_not,
            Bucket::Should => &self.should,
            Bucket::Filter => &self.filter,
        }
    }

    fn get_mut(&mut self, bucket: Bucket) -> &mut Vec<Value> {
        match bucket {
            Bucket::Must => &mut self.must,
            Bucket::MustNot => &mut self.must_not,
            Bucket::Should => &mut self.should,
            Bucket::Filter => &mut self.filter,
        }
    }

    /// Appends a clause to a bucket.
    pub fn push(&mut self, bucket: Bucket, clause: Value) {
        self.get_mut(bucket).push(clause);
    }

    /// Iterates buckets in wire order.
    pub fn iter(&self) -> impl Iterator<Item = (Bucket, &[Value])> {
        Bucket::ALL.into_iter().map(move |bucket| (bucket, self.get(bucket)))
    }

    /// Returns true if every bucket is empty.
    pub fn is_empty(&self) -> bool {
        self.iter().all(|(_, clauses)| clauses.is_empty())
    }

    /// Renders all four buckets, including empty ones.
    pub fn to_value(&self) -> Value {
        json!({
            "must": self.must,
            "must_not": self.must_not,
            "should": self.should,
            "filter": self.filter,
        })
    }
}

/// Comparison operators accepted by `where_op`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    /// `=`
    Eq,
    /// `!=`
    Ne,
    /// `>`
    Gt,
    /// `>=`
    Gte,
    /// `<`
    Lt,
    /// `<=`
    Lte,
}

impl Operator {
    /// Returns the range key for comparison operators.
    fn range_key(&self) -> Option<&'static str> {
        match self {
            Operator::Gt => Some("gt"),
            Operator::Gte => Some("gte"),
            Operator::Lt => Some("lt"),
            Operator::Lte => Some("lte"),
            Operator::Eq | Operator::Ne => None,
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operator::Eq => write!(f, "="),
            Operator::Ne => write!(f, "!="),
            Operator::Gt => write!(f, ">"),
            Operator::Gte => write!(f, ">="),
            Operator::Lt => write!(f, "<"),
            Operator::Lte => write!(f, "<="),
        }
    }
}

impl FromStr for Operator {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "=" => Ok(Operator::Eq),
            "!=" => Ok(Operator::Ne),
            ">" => Ok(Operator::Gt),
            ">=" => Ok(Operator::Gte),
            "<" => Ok(Operator::Lt),
            "<=" => Ok(Operator::Lte),
            other => Err(QueryError::UnknownOperator {
                operator: other.to_string(),
            }),
        }
    }
}

/// Everything a search has declared so far.
#[derive(Debug, Clone, PartialEq)]
pub struct BuilderState {
    /// Structured boolean clauses.
    pub wheres: Buckets,
    /// Keys merged verbatim into the request body.
    pub body_appends: Map<String, Value>,
    /// Keys merged verbatim into the request query.
    pub query_appends: Map<String, Value>,
    /// Sort directives, `{field: direction}` each.
    pub orders: Vec<Value>,
    /// Result offset.
    pub offset: Option<u64>,
    /// Result limit.
    pub limit: Option<u64>,
    /// Projected source fields.
    pub select: Vec<String>,
    /// Field used for result de-duplication.
    pub collapse: Option<String>,
    soft_delete: bool,
}

impl BuilderState {
    /// Creates empty state.
    ///
    /// With soft-delete mode enabled, the exclusion clause for soft-deleted
    /// documents is the first `must` clause.
    pub fn new(soft_delete: bool) -> Self {
        let mut wheres = Buckets::default();
        if soft_delete {
            wheres.must.push(soft_delete_clause(false));
        }

        Self {
            wheres,
            body_appends: Map::new(),
            query_appends: Map::new(),
            orders: Vec::new(),
            offset: None,
            limit: None,
            select: Vec::new(),
            collapse: None,
            soft_delete,
        }
    }

    /// Returns true if soft-delete mode was enabled at construction.
    pub fn soft_delete(&self) -> bool {
        self.soft_delete
    }

    /// Adds a comparison on a field.
    pub fn where_op(&mut self, field: &str, operator: Operator, value: Value) {
        let (bucket, clause) = match operator.range_key() {
            Some(key) => (Bucket::Must, json!({ "range": { field: { key: value } } })),
            None => (
                negated(operator == Operator::Ne),
                json!({ "term": { field: value } }),
            ),
        };
        self.wheres.push(bucket, clause);
    }

    /// Adds a terms clause to `must` or `must_not`.
    pub fn where_in(&mut self, field: &str, values: Vec<Value>, negate: bool) {
        self.wheres.push(
            negated(negate),
            json!({ "terms": { field: values } }),
        );
    }

    /// Adds an inclusive range clause to `must` or `must_not`.
    pub fn where_between(&mut self, field: &str, low: Value, high: Value, negate: bool) {
        self.wheres.push(
            negated(negate),
            json!({ "range": { field: { "gte": low, "lte": high } } }),
        );
    }

    /// Adds an exists clause to `must` or `must_not`.
    pub fn where_exists(&mut self, field: &str, negate: bool) {
        self.wheres
            .push(negated(negate), json!({ "exists": { "field": field } }));
    }

    /// Adds a regexp clause.
    pub fn where_regexp(&mut self, field: &str, pattern: &str, flags: &str) {
        self.wheres.push(
            Bucket::Must,
            json!({ "regexp": { field: { "value": pattern, "flags": flags } } }),
        );
    }

    /// Adds a geo distance clause.
    pub fn where_geo_distance(&mut self, field: &str, point: Value, distance: &str) {
        self.wheres.push(
            Bucket::Must,
            json!({ "geo_distance": { "distance": distance, field: point } }),
        );
    }

    /// Adds a geo bounding box clause.
    pub fn where_geo_bounding_box(&mut self, field: &str, bounds: Value) {
        self.wheres
            .push(Bucket::Must, json!({ "geo_bounding_box": { field: bounds } }));
    }

    /// Adds a geo polygon clause.
    pub fn where_geo_polygon(&mut self, field: &str, points: Value) {
        self.wheres.push(
            Bucket::Must,
            json!({ "geo_polygon": { field: { "points": points } } }),
        );
    }

    /// Adds a geo shape clause.
    pub fn where_geo_shape(&mut self, field: &str, shape: Value, relation: &str) {
        self.wheres.push(
            Bucket::Must,
            json!({ "geo_shape": { field: { "shape": shape, "relation": relation } } }),
        );
    }

    /// Appends a sort directive, normalizing the direction to lowercase.
    pub fn order_by(&mut self, field: &str, direction: &str) {
        self.orders
            .push(json!({ field: direction.to_lowercase() }));
    }

    /// Drops the soft-delete exclusion so deleted documents match too.
    pub fn with_trashed(&mut self) {
        if !self.soft_delete {
            return;
        }
        self.remove_soft_delete_clauses();
    }

    /// Replaces the soft-delete exclusion with an inclusion clause at the head of `must`.
    pub fn only_trashed(&mut self) {
        if !self.soft_delete {
            return;
        }
        self.remove_soft_delete_clauses();
        self.wheres.must.insert(0, soft_delete_clause(true));
    }

    fn remove_soft_delete_clauses(&mut self) {
        let excluded = soft_delete_clause(false);
        let included = soft_delete_clause(true);
        self.wheres
            .must
            .retain(|clause| clause != &excluded && clause != &included);
    }
}

fn negated(negate: bool) -> Bucket {
    if negate { Bucket::MustNot } else { Bucket::Must }
}

fn soft_delete_clause(deleted: bool) -> Value {
    json!({ "term": { SOFT_DELETED_FIELD: u8::from(deleted) } })
}
