//! Free-text builder driven by search rules.

use std::sync::Arc;

use serde_json::Value;

use crate::compiler::{self, SearchOptions};
use crate::config::ScoutConfig;
use crate::error::ScoutResult;
use crate::model::Searchable;
use crate::payload::Payload;
use crate::rule::{FnRule, QueryStringRule, SearchRule};
use crate::transport::RawCallback;

use super::{BuilderState, Filterable, QueryBuilder};

/// Builds a free-text search evaluated through an ordered list of rules.
///
/// Each applicable rule becomes one request; every request shares the
/// builder's filters, sort, pagination and projection.
pub struct SearchQueryBuilder<M: Searchable> {
    model: Arc<M>,
    config: ScoutConfig,
    query: String,
    state: BuilderState,
    rules: Vec<Arc<dyn SearchRule<M>>>,
    callback: Option<Arc<dyn RawCallback>>,
}

impl<M: Searchable> SearchQueryBuilder<M> {
    /// Creates a builder; soft-delete mode is on when both the record type
    /// and the configuration ask for it.
    pub fn new(model: Arc<M>, query: impl Into<String>, config: &ScoutConfig) -> Self {
        let soft_delete = model.uses_soft_delete() && config.soft_delete;
        Self::with_soft_delete(model, query, config, soft_delete)
    }

    /// Creates a builder with an explicit soft-delete mode.
    pub fn with_soft_delete(
        model: Arc<M>,
        query: impl Into<String>,
        config: &ScoutConfig,
        soft_delete: bool,
    ) -> Self {
        Self {
            model,
            config: config.clone(),
            query: query.into(),
            state: BuilderState::new(soft_delete),
            rules: Vec::new(),
            callback: None,
        }
    }

    /// The free-text search.
    pub fn query(&self) -> &str {
        &self.query
    }

    /// Appends a rule; registration order is evaluation priority.
    pub fn rule(mut self, rule: impl SearchRule<M> + 'static) -> Self {
        self.rules.push(Arc::new(rule));
        self
    }

    /// Appends a plain function as a rule.
    pub fn rule_fn<F>(self, rule: F) -> Self
    where
        F: Fn(&SearchQueryBuilder<M>) -> Value + Send + Sync + 'static,
    {
        self.rule(FnRule(rule))
    }

    /// Hands execution to a raw callback instead of compiled payloads.
    pub fn callback(mut self, callback: Arc<dyn RawCallback>) -> Self {
        self.callback = Some(callback);
        self
    }

    /// The rules this search evaluates, in priority order.
    ///
    /// Registered rules win; otherwise the record type's own rules apply, and
    /// with neither the search falls back to a single [`QueryStringRule`].
    pub fn rules(&self) -> Vec<Arc<dyn SearchRule<M>>> {
        if !self.rules.is_empty() {
            return self.rules.clone();
        }

        let declared = self.model.search_rules();
        if !declared.is_empty() {
            return declared;
        }

        let fallback: Arc<dyn SearchRule<M>> = Arc::new(QueryStringRule);
        vec![fallback]
    }
}

impl<M: Searchable> std::fmt::Debug for SearchQueryBuilder<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchQueryBuilder")
            .field("model", &self.model.model_name())
            .field("query", &self.query)
            .field("state", &self.state)
            .field("rules", &self.rules.len())
            .field("has_callback", &self.callback.is_some())
            .finish_non_exhaustive()
    }
}

impl<M: Searchable> Filterable for SearchQueryBuilder<M> {
    fn state(&self) -> &BuilderState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut BuilderState {
        &mut self.state
    }
}

impl<M: Searchable> QueryBuilder for SearchQueryBuilder<M> {
    type Model = M;

    fn model(&self) -> &M {
        &self.model
    }

    fn config(&self) -> &ScoutConfig {
        &self.config
    }

    fn query_string(&self) -> &str {
        &self.query
    }

    fn raw_callback(&self) -> Option<&Arc<dyn RawCallback>> {
        self.callback.as_ref()
    }

    fn seed_payloads(&self, options: &SearchOptions) -> ScoutResult<Vec<Payload>> {
        compiler::seed_rule_payloads(self, &self.rules(), options)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::builders::Operator;
    use crate::testing::TestModel;

    struct NeverApplicable;

    impl SearchRule<TestModel> for NeverApplicable {
        fn is_applicable(&self, _builder: &SearchQueryBuilder<TestModel>) -> bool {
            false
        }

        fn build_query_payload(&self, _builder: &SearchQueryBuilder<TestModel>) -> Value {
            json!({ "must": { "match_none": {} } })
        }
    }

    fn builder(query: &str) -> SearchQueryBuilder<TestModel> {
        SearchQueryBuilder::new(Arc::new(TestModel::default()), query, &ScoutConfig::default())
    }

    #[test]
    fn test_query_is_kept() {
        let builder = builder("pizza");
        assert_eq!(builder.query(), "pizza");
        assert_eq!(builder.query_string(), "pizza");
    }

    #[test]
    fn test_rules_fall_back_to_query_string() {
        let builder = builder("pizza");
        let rules = builder.rules();

        assert_eq!(rules.len(), 1);
        assert_eq!(
            rules[0].build_query_payload(&builder),
            json!({ "must": { "query_string": { "query": "pizza" } } })
        );
    }

    #[test]
    fn test_registered_rules_keep_order() {
        let builder = builder("foo")
            .rule(NeverApplicable)
            .rule_fn(|b| json!({ "must": { "match": { "bar": b.query() } } }));

        let rules = builder.rules();
        assert_eq!(rules.len(), 2);
        assert!(!rules[0].is_applicable(&builder));
        assert_eq!(
            rules[1].build_query_payload(&builder),
            json!({ "must": { "match": { "bar": "foo" } } })
        );
    }

    #[test]
    fn test_model_rules_used_when_none_registered() {
        let rule: Arc<dyn SearchRule<TestModel>> = Arc::new(NeverApplicable);
        let model = TestModel {
            rules: vec![rule],
            ..TestModel::default()
        };
        let builder = SearchQueryBuilder::new(Arc::new(model), "foo", &ScoutConfig::default());

        let rules = builder.rules();
        assert_eq!(rules.len(), 1);
        assert!(!rules[0].is_applicable(&builder));
    }

    #[test]
    fn test_shares_filter_vocabulary() {
        let builder = builder("foo")
            .where_op("id", Operator::Gt, 20)
            .select(["title"])
            .collapse("brand");

        assert_eq!(
            builder.state().wheres.must,
            vec![json!({ "range": { "id": { "gt": 20 } } })]
        );
        assert_eq!(builder.state().select, vec!["title"]);
        assert_eq!(builder.state().collapse.as_deref(), Some("brand"));
    }
}
