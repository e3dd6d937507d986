//! Payload compilation.
//!
//! Turns a builder into the ordered list of requests the engine sends. The
//! order of the list is the order rules were registered in, and the engine
//! treats it as evaluation priority.
//!
//! Every payload receives the builder's shared state in a fixed order:
//!
//! 1. `_source`, `collapse.field`, `sort`, `explain`, `profile` (skipped when empty)
//! 2. `from`, `size` (skipped when unset)
//! 3. the clause buckets, appended under `query.bool.filter.bool.{bucket}`;
//!    a rule's flat `filter` clause or clause list is first moved to
//!    `query.bool.filter.bool.filter`
//! 4. body appends under `body`, then query appends under `body.query`,
//!    never replacing a key that is already present

use std::sync::Arc;

use serde_json::{Value, json};

use crate::builders::{BuilderState, QueryBuilder, SearchQueryBuilder};
use crate::config::ScoutConfig;
use crate::error::ScoutResult;
use crate::model::Searchable;
use crate::payload::{self, Payload};
use crate::rule::SearchRule;

/// Per-call compilation options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchOptions {
    /// Merge each rule's highlight section into its payload.
    pub highlight: bool,
    /// Ask the cluster to explain scoring.
    pub explain: bool,
    /// Ask the cluster to profile execution.
    pub profile: bool,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            highlight: true,
            explain: false,
            profile: false,
        }
    }
}

impl SearchOptions {
    /// Sets whether highlight sections are compiled.
    pub fn with_highlight(mut self, highlight: bool) -> Self {
        self.highlight = highlight;
        self
    }

    /// Sets the explain flag.
    pub fn with_explain(mut self, explain: bool) -> Self {
        self.explain = explain;
        self
    }

    /// Sets the profile flag.
    pub fn with_profile(mut self, profile: bool) -> Self {
        self.profile = profile;
        self
    }
}

/// Compiles builders into ready-to-send payloads.
#[derive(Debug, Clone, Copy, Default)]
pub struct PayloadCompiler;

impl PayloadCompiler {
    /// Compiles a builder into one payload per applicable rule (or exactly one
    /// match-all payload for a filter-only builder).
    ///
    /// Compiling the same builder twice yields identical payloads.
    ///
    /// # Errors
    ///
    /// * `ConfigurationError::MissingIndex` - If the record type has no index
    pub fn compile<B: QueryBuilder>(builder: &B, options: &SearchOptions) -> ScoutResult<Vec<Payload>> {
        let mut payloads = builder.seed_payloads(options)?;
        let state = builder.state();

        for payload in &mut payloads {
            apply_state(payload, state, options);
        }

        tracing::debug!(
            model = %builder.model().model_name(),
            payloads = payloads.len(),
            "compiled search payloads"
        );

        Ok(payloads)
    }
}

const RULE_FILTER_KEY: &str = "body.query.bool.filter";

/// The single payload of a filter-only search.
pub(crate) fn seed_match_all<M: Searchable>(model: &M, config: &ScoutConfig) -> ScoutResult<Vec<Payload>> {
    let mut payload = Payload::for_model(model, config)?;
    payload.set("body.query.bool.must.match_all", json!({}));
    Ok(vec![payload])
}

/// One payload per applicable rule, in rule order.
pub(crate) fn seed_rule_payloads<M: Searchable>(
    builder: &SearchQueryBuilder<M>,
    rules: &[Arc<dyn SearchRule<M>>],
    options: &SearchOptions,
) -> ScoutResult<Vec<Payload>> {
    let model = builder.model();
    let mut payloads = Vec::with_capacity(rules.len());

    for (position, rule) in rules.iter().enumerate() {
        if !rule.is_applicable(builder) {
            tracing::debug!(position, "skipping search rule: not applicable");
            continue;
        }

        let query = rule.build_query_payload(builder);
        if payload::is_empty(&query) {
            tracing::debug!(position, "skipping search rule: empty query");
            continue;
        }

        let mut payload = Payload::for_model(model, builder.config())?;
        payload.set("body.query.bool", query);

        if options.highlight
            && let Some(highlight) = rule.build_highlight_payload(builder)
        {
            payload.set_if_not_empty("body.highlight", highlight);
        }

        payloads.push(payload);
    }

    Ok(payloads)
}

fn apply_state(payload: &mut Payload, state: &BuilderState, options: &SearchOptions) {
    payload
        .set_if_not_empty("body._source", state.select.clone())
        .set_if_not_empty("body.collapse.field", state.collapse.clone())
        .set_if_not_empty("body.sort", state.orders.clone())
        .set_if_not_empty("body.explain", options.explain)
        .set_if_not_empty("body.profile", options.profile)
        .set_if_not_null("body.from", state.offset)
        .set_if_not_null("body.size", state.limit);

    if !state.wheres.is_empty() {
        nest_rule_filter(payload);
    }

    for (bucket, clauses) in state.wheres.iter() {
        let key = format!("{RULE_FILTER_KEY}.bool.{bucket}");

        let mut merged = match payload.get(&key) {
            Some(Value::Array(existing)) => existing.clone(),
            _ => Vec::new(),
        };
        merged.extend_from_slice(clauses);

        payload.set_if_not_empty(&key, merged);
    }

    for (field, value) in &state.body_appends {
        payload.add(&format!("body.{field}"), value.clone(), false);
    }

    for (field, value) in &state.query_appends {
        payload.add(&format!("body.query.{field}"), value.clone(), false);
    }
}

/// Moves a rule's flat `filter` clauses under `filter.bool.filter` so builder
/// buckets can be nested beside them.
fn nest_rule_filter(payload: &mut Payload) {
    let clauses = match payload.get(RULE_FILTER_KEY) {
        Some(Value::Array(clauses)) => clauses.clone(),
        Some(Value::Object(clause)) if !clause.contains_key("bool") => {
            vec![Value::Object(clause.clone())]
        }
        _ => return,
    };

    if clauses.is_empty() {
        return;
    }

    tracing::trace!(clauses = clauses.len(), "nesting rule filter clauses");
    payload.set(RULE_FILTER_KEY, json!({ "bool": { "filter": clauses } }));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builders::{FilterBuilder, Filterable, Operator};
    use crate::testing::TestModel;

    fn model() -> Arc<TestModel> {
        Arc::new(TestModel::default())
    }

    fn values(payloads: Vec<Payload>) -> Vec<Value> {
        payloads.into_iter().map(Payload::into_value).collect()
    }

    #[test]
    fn test_filter_builder_compiles_match_all() {
        let builder = FilterBuilder::new(model(), &ScoutConfig::default())
            .where_eq("foo", "bar")
            .order_by("foo", "desc")
            .take(1)
            .from(30);

        let payloads = PayloadCompiler::compile(&builder, &SearchOptions::default()).unwrap();

        assert_eq!(
            values(payloads),
            vec![json!({
                "index": "test",
                "type": "test",
                "body": {
                    "query": {
                        "bool": {
                            "must": { "match_all": {} },
                            "filter": {
                                "bool": {
                                    "must": [{ "term": { "foo": "bar" } }],
                                },
                            },
                        },
                    },
                    "sort": [{ "foo": "desc" }],
                    "from": 30,
                    "size": 1,
                },
            })]
        );
    }

    #[test]
    fn test_empty_filter_builder_has_no_filter_node() {
        let builder = FilterBuilder::new(model(), &ScoutConfig::default());
        let payloads = PayloadCompiler::compile(&builder, &SearchOptions::default()).unwrap();

        assert_eq!(
            values(payloads),
            vec![json!({
                "index": "test",
                "type": "test",
                "body": { "query": { "bool": { "must": { "match_all": {} } } } },
            })]
        );
    }

    #[test]
    fn test_index_prefix_applied() {
        let config = ScoutConfig::default().with_prefix("staging_");
        let builder = FilterBuilder::new(model(), &config);
        let payloads = PayloadCompiler::compile(&builder, &SearchOptions::default()).unwrap();

        assert_eq!(payloads[0].get("index"), Some(&json!("staging_test")));
    }

    #[test]
    fn test_missing_index_fails() {
        let model = TestModel {
            index: None,
            ..TestModel::default()
        };
        let builder = FilterBuilder::new(Arc::new(model), &ScoutConfig::default());

        let err = PayloadCompiler::compile(&builder, &SearchOptions::default()).unwrap_err();
        assert!(matches!(
            err,
            crate::error::ScoutError::Configuration(
                crate::error::ConfigurationError::MissingIndex { .. }
            )
        ));
    }

    #[test]
    fn test_explain_and_profile_flags() {
        let builder = FilterBuilder::new(model(), &ScoutConfig::default());
        let options = SearchOptions::default()
            .with_explain(true)
            .with_profile(true);

        let payloads = PayloadCompiler::compile(&builder, &options).unwrap();
        assert_eq!(payloads[0].get("body.explain"), Some(&json!(true)));
        assert_eq!(payloads[0].get("body.profile"), Some(&json!(true)));

        let payloads = PayloadCompiler::compile(&builder, &SearchOptions::default()).unwrap();
        assert!(!payloads[0].has("body.explain"));
        assert!(!payloads[0].has("body.profile"));
    }

    #[test]
    fn test_zero_offset_is_kept() {
        let builder = FilterBuilder::new(model(), &ScoutConfig::default()).from(0);
        let payloads = PayloadCompiler::compile(&builder, &SearchOptions::default()).unwrap();

        assert_eq!(payloads[0].get("body.from"), Some(&json!(0)));
        assert!(!payloads[0].has("body.size"));
    }

    #[test]
    fn test_appends_do_not_override_compiled_keys() {
        let builder = FilterBuilder::new(model(), &ScoutConfig::default())
            .take(5)
            .append_to_body("size", 100)
            .append_to_body("min_score", 0.5)
            .append_to_body("index", "elsewhere")
            .append_to_query("minimum_should_match", 1);

        let payloads = PayloadCompiler::compile(&builder, &SearchOptions::default()).unwrap();
        let payload = &payloads[0];

        assert_eq!(payload.get("index"), Some(&json!("test")));
        assert_eq!(payload.get("body.size"), Some(&json!(5)));
        assert_eq!(payload.get("body.min_score"), Some(&json!(0.5)));
        assert_eq!(payload.get("body.index"), Some(&json!("elsewhere")));
        assert_eq!(payload.get("body.query.minimum_should_match"), Some(&json!(1)));
    }

    #[test]
    fn test_all_buckets_fold_into_filter() {
        let builder = FilterBuilder::new(model(), &ScoutConfig::default())
            .where_op("a", Operator::Ne, 1)
            .should(json!({ "term": { "b": 2 } }))
            .filter(json!({ "term": { "c": 3 } }));

        let payloads = PayloadCompiler::compile(&builder, &SearchOptions::default()).unwrap();

        assert_eq!(
            payloads[0].get("body.query.bool.filter.bool"),
            Some(&json!({
                "must_not": [{ "term": { "a": 1 } }],
                "should": [{ "term": { "b": 2 } }],
                "filter": [{ "term": { "c": 3 } }],
            }))
        );
    }

    #[test]
    fn test_compilation_is_repeatable() {
        let builder = FilterBuilder::new(model(), &ScoutConfig::default())
            .where_between("price", [1, 9])
            .select(["title"]);

        let first = PayloadCompiler::compile(&builder, &SearchOptions::default()).unwrap();
        let second = PayloadCompiler::compile(&builder, &SearchOptions::default()).unwrap();
        assert_eq!(first, second);
    }
}
