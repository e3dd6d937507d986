//! Fluent search builders.
//!
//! Two builders share one chainable vocabulary ([`Filterable`]):
//!
//! - [`FilterBuilder`] - structured filters only; compiles to a single
//!   match-all payload.
//! - [`SearchQueryBuilder`] - a free-text query evaluated through an ordered
//!   list of [`SearchRule`](crate::rule::SearchRule)s; compiles to one payload
//!   per applicable rule.
//!
//! # Example
//!
//! ```ignore
//! use helios_scout::builders::{Filterable, Operator, SearchQueryBuilder};
//!
//! let builder = SearchQueryBuilder::new(restaurants, "pizza", &config)
//!     .where_op("rating", Operator::Gte, 4)
//!     .where_in("city", ["Berlin", "Hamburg"])
//!     .order_by("rating", "desc")
//!     .take(20);
//! ```

mod filter;
mod search;
mod state;

use std::sync::Arc;

use serde_json::Value;

use crate::compiler::SearchOptions;
use crate::config::ScoutConfig;
use crate::error::ScoutResult;
use crate::model::Searchable;
use crate::payload::Payload;
use crate::transport::RawCallback;

pub use filter::FilterBuilder;
pub use search::SearchQueryBuilder;
pub use state::{
    Bucket, Buckets, BuilderState, DEFAULT_REGEXP_FLAGS, Operator, SOFT_DELETED_FIELD,
};

/// Chainable clause and result-shaping operations shared by every builder.
///
/// Every method consumes the builder and hands it back, so calls chain.
pub trait Filterable: Sized {
    /// Returns the accumulated state.
    fn state(&self) -> &BuilderState;

    /// Returns the accumulated state for mutation.
    fn state_mut(&mut self) -> &mut BuilderState;

    /// Adds an equality term clause to `must`.
    fn where_eq(self, field: &str, value: impl Into<Value>) -> Self {
        self.where_op(field, Operator::Eq, value)
    }

    /// Adds a comparison: `=`/`!=` become term clauses in `must`/`must_not`,
    /// the rest become range clauses in `must`.
    fn where_op(mut self, field: &str, operator: Operator, value: impl Into<Value>) -> Self {
        self.state_mut().where_op(field, operator, value.into());
        self
    }

    /// Adds a terms clause to `must`.
    fn where_in<T: Into<Value>>(mut self, field: &str, values: impl IntoIterator<Item = T>) -> Self {
        let values = values.into_iter().map(Into::into).collect();
        self.state_mut().where_in(field, values, false);
        self
    }

    /// Adds a terms clause to `must_not`.
    fn where_not_in<T: Into<Value>>(
        mut self,
        field: &str,
        values: impl IntoIterator<Item = T>,
    ) -> Self {
        let values = values.into_iter().map(Into::into).collect();
        self.state_mut().where_in(field, values, true);
        self
    }

    /// Adds an inclusive `[low, high]` range clause to `must`.
    fn where_between<T: Into<Value>>(mut self, field: &str, [low, high]: [T; 2]) -> Self {
        self.state_mut()
            .where_between(field, low.into(), high.into(), false);
        self
    }

    /// Adds an inclusive `[low, high]` range clause to `must_not`.
    fn where_not_between<T: Into<Value>>(mut self, field: &str, [low, high]: [T; 2]) -> Self {
        self.state_mut()
            .where_between(field, low.into(), high.into(), true);
        self
    }

    /// Requires the field to exist.
    fn where_exists(mut self, field: &str) -> Self {
        self.state_mut().where_exists(field, false);
        self
    }

    /// Requires the field to be absent.
    fn where_not_exists(mut self, field: &str) -> Self {
        self.state_mut().where_exists(field, true);
        self
    }

    /// Adds a regexp clause with all flags enabled.
    fn where_regexp(self, field: &str, pattern: &str) -> Self {
        self.where_regexp_with_flags(field, pattern, DEFAULT_REGEXP_FLAGS)
    }

    /// Adds a regexp clause with explicit flags (e.g. `"EMPTY|NONE"`).
    fn where_regexp_with_flags(mut self, field: &str, pattern: &str, flags: &str) -> Self {
        self.state_mut().where_regexp(field, pattern, flags);
        self
    }

    /// Matches documents within `distance` (e.g. `"10m"`) of a point.
    fn where_geo_distance(mut self, field: &str, point: impl Into<Value>, distance: &str) -> Self {
        self.state_mut()
            .where_geo_distance(field, point.into(), distance);
        self
    }

    /// Matches documents inside a bounding box (`top_left`/`bottom_right`).
    fn where_geo_bounding_box(mut self, field: &str, bounds: impl Into<Value>) -> Self {
        self.state_mut().where_geo_bounding_box(field, bounds.into());
        self
    }

    /// Matches documents inside a polygon.
    fn where_geo_polygon(mut self, field: &str, points: impl Into<Value>) -> Self {
        self.state_mut().where_geo_polygon(field, points.into());
        self
    }

    /// Matches documents against a shape with a spatial relation (e.g. `"WITHIN"`).
    fn where_geo_shape(mut self, field: &str, shape: impl Into<Value>, relation: &str) -> Self {
        self.state_mut()
            .where_geo_shape(field, shape.into(), relation);
        self
    }

    /// Appends a pre-built clause to `must`.
    fn must(mut self, clause: impl Into<Value>) -> Self {
        self.state_mut().wheres.push(Bucket::Must, clause.into());
        self
    }

    /// Appends a pre-built clause to `must_not`.
    fn must_not(mut self, clause: impl Into<Value>) -> Self {
        self.state_mut().wheres.push(Bucket::MustNot, clause.into());
        self
    }

    /// Appends a pre-built clause to `should`.
    fn should(mut self, clause: impl Into<Value>) -> Self {
        self.state_mut().wheres.push(Bucket::Should, clause.into());
        self
    }

    /// Appends a pre-built clause to `filter`.
    fn filter(mut self, clause: impl Into<Value>) -> Self {
        self.state_mut().wheres.push(Bucket::Filter, clause.into());
        self
    }

    /// Stages a key merged verbatim into the request body.
    fn append_to_body(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.state_mut()
            .body_appends
            .insert(key.to_string(), value.into());
        self
    }

    /// Stages a key merged verbatim into the request query.
    fn append_to_query(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.state_mut()
            .query_appends
            .insert(key.to_string(), value.into());
        self
    }

    /// Applies `then` when the condition holds.
    fn when(self, condition: bool, then: impl FnOnce(Self) -> Self) -> Self {
        if condition { then(self) } else { self }
    }

    /// Applies `then` when the condition holds and `otherwise` when it does not.
    fn when_else(
        self,
        condition: bool,
        then: impl FnOnce(Self) -> Self,
        otherwise: impl FnOnce(Self) -> Self,
    ) -> Self {
        if condition { then(self) } else { otherwise(self) }
    }

    /// Appends a sort directive; the direction is lowercased.
    fn order_by(mut self, field: &str, direction: &str) -> Self {
        self.state_mut().order_by(field, direction);
        self
    }

    /// Appends an ascending sort directive.
    fn order_by_asc(self, field: &str) -> Self {
        self.order_by(field, "asc")
    }

    /// Adds projected source fields; repeated calls accumulate.
    fn select<S: Into<String>>(mut self, fields: impl IntoIterator<Item = S>) -> Self {
        self.state_mut()
            .select
            .extend(fields.into_iter().map(Into::into));
        self
    }

    /// Sets the result offset.
    fn from(mut self, offset: u64) -> Self {
        self.state_mut().offset = Some(offset);
        self
    }

    /// Sets the result limit.
    fn take(mut self, limit: u64) -> Self {
        self.state_mut().limit = Some(limit);
        self
    }

    /// De-duplicates results on a single field.
    fn collapse(mut self, field: &str) -> Self {
        self.state_mut().collapse = Some(field.to_string());
        self
    }

    /// Includes soft-deleted documents. No-op without soft-delete mode.
    fn with_trashed(mut self) -> Self {
        self.state_mut().with_trashed();
        self
    }

    /// Restricts to soft-deleted documents. No-op without soft-delete mode.
    fn only_trashed(mut self) -> Self {
        self.state_mut().only_trashed();
        self
    }
}

/// A builder the payload compiler and engine can consume.
pub trait QueryBuilder: Filterable + Send + Sync {
    /// The record type being searched.
    type Model: Searchable;

    /// Returns the record type.
    fn model(&self) -> &Self::Model;

    /// Returns the configuration the builder was created with.
    fn config(&self) -> &ScoutConfig;

    /// Returns the free-text query (empty for filter-only builders).
    fn query_string(&self) -> &str;

    /// Returns the raw callback that replaces compilation, if one is set.
    fn raw_callback(&self) -> Option<&Arc<dyn RawCallback>>;

    /// Creates the per-rule payloads, before shared builder state is folded in.
    fn seed_payloads(&self, options: &SearchOptions) -> ScoutResult<Vec<Payload>>;
}
