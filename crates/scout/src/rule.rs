//! Search rules.
//!
//! A rule turns a free-text search into one query variant. Record types list
//! their rules from strictest to loosest; the engine sends one request per
//! applicable rule and stops at the first that finds anything.

use serde_json::{Value, json};

use crate::builders::SearchQueryBuilder;
use crate::model::Searchable;

/// Strategy producing one query variant for a free-text search.
///
/// # Example
///
/// ```ignore
/// struct TitlePrefixRule;
///
/// impl SearchRule<Restaurant> for TitlePrefixRule {
///     fn is_applicable(&self, builder: &SearchQueryBuilder<Restaurant>) -> bool {
///         builder.query().len() >= 3
///     }
///
///     fn build_query_payload(&self, builder: &SearchQueryBuilder<Restaurant>) -> Value {
///         json!({ "must": { "match_phrase_prefix": { "title": builder.query() } } })
///     }
/// }
/// ```
pub trait SearchRule<M: Searchable>: Send + Sync {
    /// Whether this rule contributes a request. Defaults to always.
    fn is_applicable(&self, _builder: &SearchQueryBuilder<M>) -> bool {
        true
    }

    /// Builds the `query.bool` fragment for this variant.
    fn build_query_payload(&self, builder: &SearchQueryBuilder<M>) -> Value;

    /// Builds the `highlight` section, if this variant highlights anything.
    fn build_highlight_payload(&self, _builder: &SearchQueryBuilder<M>) -> Option<Value> {
        None
    }
}

/// Catch-all rule running the search text as a `query_string` query.
///
/// Used when neither the builder nor the record type registers any rule.
#[derive(Debug, Clone, Copy, Default)]
pub struct QueryStringRule;

impl<M: Searchable> SearchRule<M> for QueryStringRule {
    fn build_query_payload(&self, builder: &SearchQueryBuilder<M>) -> Value {
        json!({
            "must": {
                "query_string": {
                    "query": builder.query(),
                }
            }
        })
    }
}

/// Adapts a plain function into an always-applicable rule without highlight.
pub struct FnRule<F>(pub F);

impl<M, F> SearchRule<M> for FnRule<F>
where
    M: Searchable,
    F: Fn(&SearchQueryBuilder<M>) -> Value + Send + Sync,
{
    fn build_query_payload(&self, builder: &SearchQueryBuilder<M>) -> Value {
        (self.0)(builder)
    }
}

impl<F> std::fmt::Debug for FnRule<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("FnRule")
    }
}
